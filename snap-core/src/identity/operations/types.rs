use std::str::FromStr;

use indexmap::IndexMap;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use crate::identity::account::types::{Curve, ExternalAccount};
use crate::identity::host::HostBuilder;
use crate::identity::method::DidMethod;
use crate::identity::types::IdentityError;
use crate::identity::verifiable::credential::codec;
use crate::identity::verifiable::credential::types::{
    QueryFilter, StoreName, StoreOptions, StoreSaveOutcome, StoreSelector, StoredCredentialRecord,
};
use crate::identity::verifiable::types::{ProofFormat, ProofInfo, ResolutionResult};

pub const OP_RESOLVE_DID: &str = "resolveDID";
pub const OP_GET_VCS: &str = "getVCs";
pub const OP_SAVE_VC: &str = "saveVC";
pub const OP_CREATE_VC: &str = "createVC";
pub const OP_VERIFY_VC: &str = "verifyVC";
pub const OP_VERIFY_VP: &str = "verifyVP";
pub const OP_REMOVE_VC: &str = "removeVC";
pub const OP_DELETE_ALL_VCS: &str = "deleteAllVCs";
pub const OP_CREATE_VP: &str = "createVP";
pub const OP_SWITCH_DID_METHOD: &str = "switchDIDMethod";
pub const OP_GET_CURRENT_DID_METHOD: &str = "getCurrentDIDMethod";
pub const OP_CONFIGURE_GOOGLE_ACCOUNT: &str = "configureGoogleAccount";
pub const OP_SYNC_GOOGLE_VCS: &str = "syncGoogleVCs";
pub const OP_TOGGLE_POPUPS: &str = "togglePopups";
pub const OP_GET_ACCOUNT_INFO: &str = "getAccountInfo";
pub const OP_GET_AVAILABLE_METHODS: &str = "getAvailableMethods";
pub const OP_ADD_TRUSTED_ORIGIN: &str = "addTrustedOrigin";
pub const OP_REMOVE_TRUSTED_ORIGIN: &str = "removeTrustedOrigin";

fn invalid(msg: impl Into<String>) -> IdentityError {
    IdentityError::InvalidParams(msg.into())
}

fn require_non_empty(field: &str, value: &str) -> Result<(), IdentityError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{} must not be empty", field)));
    }

    Ok(())
}

/// `require_credential` accepts a compact `JWT` string or a `JSON-LD` object
fn require_credential(field: &str, value: &Value) -> Result<(), IdentityError> {
    match value {
        Value::String(token) => require_non_empty(field, token),
        Value::Object(obj) if !obj.is_empty() => Ok(()),
        _ => Err(invalid(format!(
            "{} must be a jwt string or a json object",
            field
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ResolveDidParams {
    #[serde(default)]
    pub did: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(crate = "self::serde")]
pub struct GetVcsParams {
    #[serde(default)]
    pub filter: Option<QueryFilter>,

    #[serde(default)]
    pub options: StoreOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
pub struct SaveVcParams {
    pub data: Value,

    #[serde(default)]
    pub options: StoreOptions,
}

fn default_save() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct CreateVcOptions {
    #[serde(default)]
    pub store: StoreSelector,

    #[serde(default = "default_save")]
    pub save: bool,

    #[serde(default)]
    pub proof_format: Option<ProofFormat>,

    #[serde(default)]
    pub id: Option<String>,
}

impl Default for CreateVcOptions {
    fn default() -> Self {
        Self {
            store: StoreSelector::default(),
            save: true,
            proof_format: None,
            id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct CreateVcParams {
    pub vc_value: Value,

    #[serde(default)]
    pub vc_key: Option<String>,

    #[serde(default)]
    pub cred_types: Option<Vec<String>>,

    #[serde(default)]
    pub options: CreateVcOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct VerifyVcParams {
    pub verifiable_credential: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct VerifyVpParams {
    pub verifiable_presentation: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(untagged)]
pub enum CredentialIds {
    One(String),
    Many(Vec<String>),
}

impl CredentialIds {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            CredentialIds::One(id) => vec![id.clone()],
            CredentialIds::Many(ids) => ids.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
pub struct RemoveVcParams {
    #[serde(alias = "ids")]
    pub id: CredentialIds,

    #[serde(default)]
    pub options: StoreOptions,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(crate = "self::serde")]
pub struct DeleteAllVcsParams {
    #[serde(default)]
    pub options: StoreOptions,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct CreateVpParams {
    #[serde(default)]
    pub vc_ids: Vec<String>,

    #[serde(default)]
    pub vcs: Vec<Value>,

    #[serde(default)]
    pub proof_info: Option<ProofInfo>,

    #[serde(default)]
    pub options: StoreOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct SwitchMethodParams {
    pub did_method: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ConfigureCloudParams {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(crate = "self::serde")]
pub struct OriginParams {
    pub origin: String,
}

/// `Operation` is a single request of the identity operations facade
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    ResolveDid(ResolveDidParams),
    GetVcs(GetVcsParams),
    SaveVc(SaveVcParams),
    CreateVc(CreateVcParams),
    VerifyVc(VerifyVcParams),
    VerifyVp(VerifyVpParams),
    RemoveVc(RemoveVcParams),
    DeleteAllVcs(DeleteAllVcsParams),
    CreateVp(CreateVpParams),
    SwitchDidMethod(SwitchMethodParams),
    GetCurrentDidMethod,
    ConfigureGoogleAccount(ConfigureCloudParams),
    SyncGoogleVcs,
    TogglePopups,
    GetAccountInfo,
    GetAvailableMethods,
    AddTrustedOrigin(OriginParams),
    RemoveTrustedOrigin(OriginParams),
}

fn parse_params<T>(params: Value) -> Result<T, IdentityError>
where
    T: for<'de> Deserialize<'de>,
{
    let params = match params {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };

    serde_json::from_value(params).map_err(|err| invalid(err.to_string()))
}

impl Operation {
    /// `from_request` builds the operation from its name and its raw params
    pub fn from_request(name: &str, params: Value) -> Result<Operation, IdentityError> {
        let operation = match name {
            OP_RESOLVE_DID => Operation::ResolveDid(parse_params(params)?),
            OP_GET_VCS => Operation::GetVcs(parse_params(params)?),
            OP_SAVE_VC => Operation::SaveVc(parse_params(params)?),
            OP_CREATE_VC => Operation::CreateVc(parse_params(params)?),
            OP_VERIFY_VC => Operation::VerifyVc(parse_params(params)?),
            OP_VERIFY_VP => Operation::VerifyVp(parse_params(params)?),
            OP_REMOVE_VC => Operation::RemoveVc(parse_params(params)?),
            OP_DELETE_ALL_VCS => Operation::DeleteAllVcs(parse_params(params)?),
            OP_CREATE_VP => Operation::CreateVp(parse_params(params)?),
            OP_SWITCH_DID_METHOD => Operation::SwitchDidMethod(parse_params(params)?),
            OP_GET_CURRENT_DID_METHOD => Operation::GetCurrentDidMethod,
            OP_CONFIGURE_GOOGLE_ACCOUNT => {
                Operation::ConfigureGoogleAccount(parse_params(params)?)
            }
            OP_SYNC_GOOGLE_VCS => Operation::SyncGoogleVcs,
            OP_TOGGLE_POPUPS => Operation::TogglePopups,
            OP_GET_ACCOUNT_INFO => Operation::GetAccountInfo,
            OP_GET_AVAILABLE_METHODS => Operation::GetAvailableMethods,
            OP_ADD_TRUSTED_ORIGIN => Operation::AddTrustedOrigin(parse_params(params)?),
            OP_REMOVE_TRUSTED_ORIGIN => Operation::RemoveTrustedOrigin(parse_params(params)?),
            _ => return Err(invalid(format!("unknown operation: {}", name))),
        };

        Ok(operation)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::ResolveDid(_) => OP_RESOLVE_DID,
            Operation::GetVcs(_) => OP_GET_VCS,
            Operation::SaveVc(_) => OP_SAVE_VC,
            Operation::CreateVc(_) => OP_CREATE_VC,
            Operation::VerifyVc(_) => OP_VERIFY_VC,
            Operation::VerifyVp(_) => OP_VERIFY_VP,
            Operation::RemoveVc(_) => OP_REMOVE_VC,
            Operation::DeleteAllVcs(_) => OP_DELETE_ALL_VCS,
            Operation::CreateVp(_) => OP_CREATE_VP,
            Operation::SwitchDidMethod(_) => OP_SWITCH_DID_METHOD,
            Operation::GetCurrentDidMethod => OP_GET_CURRENT_DID_METHOD,
            Operation::ConfigureGoogleAccount(_) => OP_CONFIGURE_GOOGLE_ACCOUNT,
            Operation::SyncGoogleVcs => OP_SYNC_GOOGLE_VCS,
            Operation::TogglePopups => OP_TOGGLE_POPUPS,
            Operation::GetAccountInfo => OP_GET_ACCOUNT_INFO,
            Operation::GetAvailableMethods => OP_GET_AVAILABLE_METHODS,
            Operation::AddTrustedOrigin(_) => OP_ADD_TRUSTED_ORIGIN,
            Operation::RemoveTrustedOrigin(_) => OP_REMOVE_TRUSTED_ORIGIN,
        }
    }

    /// `validate` checks the params structure before anything is loaded
    pub fn validate(&self) -> Result<(), IdentityError> {
        match self {
            Operation::ResolveDid(params) => match &params.did {
                Some(did) if !did.starts_with("did:") => {
                    Err(invalid(format!("invalid did: {}", did)))
                }
                _ => Ok(()),
            },
            Operation::GetVcs(params) => match &params.filter {
                Some(QueryFilter::ById(id)) => require_non_empty("filter", id),
                Some(QueryFilter::ByType(typ)) => require_non_empty("filter", typ),
                Some(QueryFilter::ByPath(expr)) => codec::parse_path(expr)
                    .map(|_| ())
                    .map_err(IdentityError::from),
                _ => Ok(()),
            },
            Operation::SaveVc(params) => require_credential("data", &params.data),
            Operation::CreateVc(params) => {
                if params.vc_value.is_null() {
                    return Err(invalid("vcValue must not be null"));
                }

                if let Some(key) = &params.vc_key {
                    require_non_empty("vcKey", key)?;
                }

                if let Some(id) = &params.options.id {
                    require_non_empty("options.id", id)?;
                }

                params
                    .cred_types
                    .iter()
                    .flatten()
                    .try_for_each(|typ| require_non_empty("credTypes", typ))
            }
            Operation::VerifyVc(params) => {
                require_credential("verifiableCredential", &params.verifiable_credential)
            }
            Operation::VerifyVp(params) => {
                require_credential("verifiablePresentation", &params.verifiable_presentation)
            }
            Operation::RemoveVc(params) => {
                let ids = params.id.to_vec();
                if ids.is_empty() {
                    return Err(invalid("id must not be empty"));
                }

                ids.iter().try_for_each(|id| require_non_empty("id", id))
            }
            Operation::CreateVp(params) => {
                params
                    .vc_ids
                    .iter()
                    .try_for_each(|id| require_non_empty("vcIds", id))?;

                params
                    .vcs
                    .iter()
                    .try_for_each(|vc| require_credential("vcs", vc))
            }
            Operation::SwitchDidMethod(params) => {
                DidMethod::from_str(&params.did_method).map(|_| ())
            }
            Operation::ConfigureGoogleAccount(params) => {
                require_non_empty("accessToken", &params.access_token)
            }
            Operation::AddTrustedOrigin(params) | Operation::RemoveTrustedOrigin(params) => {
                require_non_empty("origin", &params.origin)
            }
            Operation::DeleteAllVcs(_)
            | Operation::GetCurrentDidMethod
            | Operation::SyncGoogleVcs
            | Operation::TogglePopups
            | Operation::GetAccountInfo
            | Operation::GetAvailableMethods => Ok(()),
        }
    }
}

/// `RequestContext` is what the caller tells about itself on every request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestContext {
    pub origin: String,
    pub external_account: Option<ExternalAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "self::serde")]
pub struct CredentialMetadata {
    pub id: String,
    pub stores: Vec<StoreName>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "self::serde")]
pub struct CreatedCredential {
    pub data: Value,
    pub metadata: CredentialMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "self::serde")]
pub struct RemovedCredential {
    pub id: String,
    pub stores: IndexMap<StoreName, bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub did: String,
    pub method: DidMethod,
    pub network: String,
    pub address: String,
    pub snap_account_address: String,
    pub host_account_address: Option<String>,
    pub external_chain_account_id: Option<String>,
    pub public_key: String,
    pub curve: Curve,
    pub origin: String,
    pub external: bool,
    pub cloud_email: Option<String>,
    pub popups_disabled: bool,
}

/// `OperationOutput` is the typed result of every operation, serialized as is
/// into the RPC response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(crate = "self::serde")]
#[serde(untagged)]
pub enum OperationOutput {
    Resolution(ResolutionResult),
    Credentials(Vec<StoredCredentialRecord>),
    Saved(Vec<StoreSaveOutcome>),
    Created(CreatedCredential),
    Removed(Vec<RemovedCredential>),
    Cleared(IndexMap<StoreName, bool>),
    Presentation(Option<Value>),
    Method(String),
    Methods(Vec<String>),
    Account(Box<AccountSummary>),
    Flag(bool),
}

/// `OperationsUsecaseBuilder` is the facade used by the RPC layer
#[async_trait]
pub trait OperationsUsecaseBuilder: Send + Sync {
    async fn execute(
        &self,
        host: &dyn HostBuilder,
        ctx: &RequestContext,
        operation: Operation,
    ) -> Result<OperationOutput, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json::json;
    use table_test::table_test;

    #[test]
    fn test_from_request_names() {
        let table = vec![
            (OP_GET_CURRENT_DID_METHOD, Value::Null),
            (OP_GET_VCS, json!({})),
            (OP_SWITCH_DID_METHOD, json!({"didMethod": "did:key"})),
            (OP_REMOVE_VC, json!({"id": ["a", "b"]})),
            (OP_CREATE_VP, json!({"vcIds": ["a"], "proofInfo": {"proofFormat": "jwt"}})),
        ];

        for (validator, input, expected) in table_test!(table) {
            let operation = Operation::from_request(input, expected.clone());
            assert!(!operation.is_err());

            validator
                .given(input)
                .when("build operation")
                .then("same operation name")
                .assert_eq(input, operation.unwrap().name());
        }
    }

    #[test]
    fn test_unknown_operation() {
        let operation = Operation::from_request("signMessage", json!({}));
        assert!(matches!(
            operation.unwrap_err(),
            IdentityError::InvalidParams(_)
        ))
    }

    #[test]
    fn test_malformed_params() {
        let operation = Operation::from_request(OP_SAVE_VC, json!({"options": {}}));
        assert!(matches!(
            operation.unwrap_err(),
            IdentityError::InvalidParams(_)
        ));

        let operation = Operation::from_request(OP_GET_VCS, json!({"options": {"store": []}}));
        assert!(operation.is_err());
    }

    #[test]
    fn test_validate_switch_unsupported_method() {
        let operation =
            Operation::from_request(OP_SWITCH_DID_METHOD, json!({"didMethod": "did:ethr"}))
                .unwrap();
        assert!(matches!(
            operation.validate().unwrap_err(),
            IdentityError::UnsupportedMethod(_)
        ))
    }

    #[test]
    fn test_validate_credentials() {
        let empty_data = Operation::from_request(OP_SAVE_VC, json!({"data": ""})).unwrap();
        assert!(empty_data.validate().is_err());

        let number = Operation::from_request(OP_SAVE_VC, json!({"data": 10})).unwrap();
        assert!(number.validate().is_err());

        let jwt = Operation::from_request(OP_SAVE_VC, json!({"data": "a.b.c"})).unwrap();
        assert!(jwt.validate().is_ok());

        let invalid_path = Operation::from_request(
            OP_GET_VCS,
            json!({"filter": {"type": "JSONPath", "filter": "$["}}),
        )
        .unwrap();
        assert!(matches!(
            invalid_path.validate().unwrap_err(),
            IdentityError::InvalidParams(_)
        ));

        let empty_ids = Operation::from_request(OP_REMOVE_VC, json!({"id": []})).unwrap();
        assert!(empty_ids.validate().is_err());
    }

    #[test]
    fn test_create_vc_defaults() {
        let operation =
            Operation::from_request(OP_CREATE_VC, json!({"vcValue": {"name": "alice"}})).unwrap();

        match operation {
            Operation::CreateVc(params) => {
                assert!(params.options.save);
                assert_eq!(params.options.store, StoreSelector::default());
                assert_eq!(params.vc_key, None);
            }
            _ => panic!("unexpected operation"),
        }
    }
}
