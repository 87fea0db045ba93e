use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use prople_snap_core::identity::account::types::ExternalAccount;
use prople_snap_core::identity::operations::types::RequestContext;

use crate::common::types::CommonError;

/// `SnapContext` is what the wallet would know about the caller: the active chain
/// and the connected account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct SnapContext {
    pub chain_id: String,
    pub account: String,
}

/// `Param` is the envelope of every snap RPC call, the operation params travel
/// untouched inside `request`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub origin: String,
    pub context: SnapContext,

    #[serde(default)]
    pub external_account: Option<ExternalAccount>,

    #[serde(default)]
    pub prompt_response: Option<String>,

    #[serde(default)]
    pub request: Value,
}

impl Param {
    pub fn request_context(&self) -> RequestContext {
        RequestContext {
            origin: self.origin.clone(),
            external_account: self.external_account.clone(),
        }
    }
}

impl TryFrom<Value> for Param {
    type Error = CommonError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value).map_err(|err| CommonError::JSONError(err.to_string()))
    }
}
