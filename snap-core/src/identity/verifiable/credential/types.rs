use std::fmt;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::Value;
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::account::types::CloudCredentials;
use crate::identity::account::AccountIdentityState;
use crate::identity::method::DidMethod;
use crate::identity::types::IdentityError;

pub const CLOUD_FILE_NAME: &str = "ssi-snap-credentials.json";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("codec error: {0}")]
    CodecError(String),

    #[error("configure error: {0}")]
    ConfigureError(String),
}

impl From<StoreError> for IdentityError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => IdentityError::StorageUnavailable(msg),
            StoreError::InvalidFilter(msg) => IdentityError::InvalidParams(msg),
            StoreError::CodecError(msg) => IdentityError::StorageUnavailable(msg),
            StoreError::ConfigureError(msg) => IdentityError::StorageUnavailable(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum StoreName {
    Local,
    Cloud,
}

impl StoreName {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreName::Local => "local",
            StoreName::Cloud => "cloud",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `SelectorValue` is the raw shape of a store selector sent by the callers
#[derive(Deserialize)]
#[serde(crate = "self::serde")]
#[serde(untagged)]
pub enum SelectorValue {
    One(StoreName),
    Many(Vec<StoreName>),
}

/// `StoreSelector` is the list of stores a request is dispatched to
///
/// The callers are allowed to send a single store name or a list of them, the
/// duplicates are collapsed while keeping the given order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(try_from = "SelectorValue", into = "Vec<StoreName>")]
pub struct StoreSelector(Vec<StoreName>);

impl StoreSelector {
    pub fn new(stores: Vec<StoreName>) -> Result<Self, IdentityError> {
        let mut collapsed: Vec<StoreName> = Vec::new();
        for store in stores {
            if !collapsed.contains(&store) {
                collapsed.push(store);
            }
        }

        if collapsed.is_empty() {
            return Err(IdentityError::InvalidParams(String::from(
                "store selector must not be empty",
            )));
        }

        Ok(Self(collapsed))
    }

    pub fn stores(&self) -> &[StoreName] {
        &self.0
    }
}

impl Default for StoreSelector {
    fn default() -> Self {
        Self(vec![StoreName::Local])
    }
}

impl TryFrom<SelectorValue> for StoreSelector {
    type Error = IdentityError;

    fn try_from(value: SelectorValue) -> Result<Self, Self::Error> {
        match value {
            SelectorValue::One(store) => StoreSelector::new(vec![store]),
            SelectorValue::Many(stores) => StoreSelector::new(stores),
        }
    }
}

impl From<StoreSelector> for Vec<StoreName> {
    fn from(value: StoreSelector) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct StoreOptions {
    #[serde(default)]
    pub store: StoreSelector,
}

/// `QueryFilter` narrows down the credentials returned by a store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(tag = "type", content = "filter")]
pub enum QueryFilter {
    #[default]
    #[serde(rename = "none")]
    None,

    #[serde(rename = "id")]
    ById(String),

    #[serde(rename = "vcType")]
    ByType(String),

    #[serde(rename = "JSONPath")]
    ByPath(String),
}

/// `CredentialRecord` is a credential ready to be saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct CredentialRecord {
    pub id: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct StoredCredentialRecord {
    pub id: String,
    pub store: StoreName,
    pub data: Value,
}

/// `SaveOutcome` tells which records were accepted by a store. Records whose subject
/// doesn't belong to the active account are skipped
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SaveOutcome {
    pub saved: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct StoreSaveOutcome {
    pub store: StoreName,
    pub saved: Vec<String>,
    pub skipped: Vec<String>,
}

/// `CredentialStore` is a single credential backend
///
/// Every store enforces the ownership boundary by itself: only the credentials whose
/// subject resolves to the given account under the given method are visible to, and
/// removable by, the callers.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    fn name(&self) -> StoreName;

    async fn query(
        &self,
        account: &AccountIdentityState,
        method: DidMethod,
        filter: &QueryFilter,
    ) -> Result<Vec<StoredCredentialRecord>, StoreError>;

    async fn save(
        &self,
        account: &mut AccountIdentityState,
        method: DidMethod,
        records: &[CredentialRecord],
    ) -> Result<SaveOutcome, StoreError>;

    /// `delete` returns `true` only when the record existed and was owned
    async fn delete(&self, account: &mut AccountIdentityState, method: DidMethod, id: &str) -> bool;

    /// `clear` returns `false` only when the medium can't be reached
    async fn clear(&self, account: &mut AccountIdentityState, method: DidMethod) -> bool;

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        None
    }
}

#[async_trait]
pub trait Configurable: Send + Sync {
    async fn configure(&self, access_token: &str) -> Result<CloudCredentials, StoreError>;
}

/// `CloudBackendBuilder` is the remote drive used by the cloud store
#[async_trait]
pub trait CloudBackendBuilder: Send + Sync {
    /// `verify_access_token` returns the email of the token owner
    async fn verify_access_token(&self, access_token: &str) -> Result<String, IdentityError>;
    async fn read_file(&self, access_token: &str, name: &str) -> Result<Option<String>, IdentityError>;
    async fn write_file(
        &self,
        access_token: &str,
        name: &str,
        content: String,
    ) -> Result<(), IdentityError>;
}
