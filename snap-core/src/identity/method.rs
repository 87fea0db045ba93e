use std::fmt;
use std::str::FromStr;

use rst_common::standard::serde::{self, Deserialize, Serialize};

use super::types::IdentityError;

pub const METHOD_PKH: &str = "did:pkh";
pub const METHOD_KEY: &str = "did:key";
pub const METHOD_HEDERA: &str = "did:hedera";

/// `DidMethod` is the closed list of supported `DID` methods
///
/// Anything outside of this list is rejected with [`IdentityError::UnsupportedMethod`]
/// before the state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(crate = "self::serde")]
#[serde(try_from = "String", into = "String")]
pub enum DidMethod {
    #[default]
    Pkh,
    Key,
    Hedera,
}

impl DidMethod {
    pub fn all() -> Vec<DidMethod> {
        vec![DidMethod::Pkh, DidMethod::Key, DidMethod::Hedera]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DidMethod::Pkh => METHOD_PKH,
            DidMethod::Key => METHOD_KEY,
            DidMethod::Hedera => METHOD_HEDERA,
        }
    }

    /// `prefix` is the method string followed by the delimiter, every `DID`
    /// belongs to this method must start with it
    pub fn prefix(&self) -> String {
        format!("{}:", self.as_str())
    }

    /// `method_specific_id` returns the part of the given `DID` after the method
    /// prefix, or `None` if the `DID` belongs to another method
    pub fn method_specific_id<'a>(&self, did: &'a str) -> Option<&'a str> {
        let rest = did.strip_prefix(self.prefix().as_str())?;
        let rest = rest.split('#').next().unwrap_or(rest);
        if rest.is_empty() {
            return None;
        }

        Some(rest)
    }

    /// `from_did` detects the method of a full `DID` string
    pub fn from_did(did: &str) -> Result<DidMethod, IdentityError> {
        DidMethod::all()
            .into_iter()
            .find(|method| did.starts_with(method.prefix().as_str()))
            .ok_or(IdentityError::UnsupportedMethod(did.to_string()))
    }
}

impl fmt::Display for DidMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DidMethod {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            METHOD_PKH => Ok(DidMethod::Pkh),
            METHOD_KEY => Ok(DidMethod::Key),
            METHOD_HEDERA => Ok(DidMethod::Hedera),
            _ => Err(IdentityError::UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for DidMethod {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DidMethod::from_str(value.as_str())
    }
}

impl From<DidMethod> for String {
    fn from(value: DidMethod) -> Self {
        value.as_str().to_string()
    }
}
