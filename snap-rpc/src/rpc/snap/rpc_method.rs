use prople_jsonrpc_core::types::RpcMethod;

use prople_snap_core::identity::operations::types::*;

use crate::common::types::CommonError;
use crate::rpc::shared::rpc::method::{RpcMethodBuilder, RPC_METHOD_PREFIX};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Method {
    ResolveDID,
    GetVCs,
    SaveVC,
    CreateVC,
    VerifyVC,
    VerifyVP,
    RemoveVC,
    DeleteAllVCs,
    CreateVP,
    SwitchDIDMethod,
    GetCurrentDIDMethod,
    ConfigureGoogleAccount,
    SyncGoogleVCs,
    TogglePopups,
    GetAccountInfo,
    GetAvailableMethods,
    AddTrustedOrigin,
    RemoveTrustedOrigin,
}

impl Method {
    pub fn all() -> Vec<Method> {
        vec![
            Method::ResolveDID,
            Method::GetVCs,
            Method::SaveVC,
            Method::CreateVC,
            Method::VerifyVC,
            Method::VerifyVP,
            Method::RemoveVC,
            Method::DeleteAllVCs,
            Method::CreateVP,
            Method::SwitchDIDMethod,
            Method::GetCurrentDIDMethod,
            Method::ConfigureGoogleAccount,
            Method::SyncGoogleVCs,
            Method::TogglePopups,
            Method::GetAccountInfo,
            Method::GetAvailableMethods,
            Method::AddTrustedOrigin,
            Method::RemoveTrustedOrigin,
        ]
    }
}

impl RpcMethodBuilder for Method {
    fn build_path(&self) -> &str {
        match self {
            Method::ResolveDID => OP_RESOLVE_DID,
            Method::GetVCs => OP_GET_VCS,
            Method::SaveVC => OP_SAVE_VC,
            Method::CreateVC => OP_CREATE_VC,
            Method::VerifyVC => OP_VERIFY_VC,
            Method::VerifyVP => OP_VERIFY_VP,
            Method::RemoveVC => OP_REMOVE_VC,
            Method::DeleteAllVCs => OP_DELETE_ALL_VCS,
            Method::CreateVP => OP_CREATE_VP,
            Method::SwitchDIDMethod => OP_SWITCH_DID_METHOD,
            Method::GetCurrentDIDMethod => OP_GET_CURRENT_DID_METHOD,
            Method::ConfigureGoogleAccount => OP_CONFIGURE_GOOGLE_ACCOUNT,
            Method::SyncGoogleVCs => OP_SYNC_GOOGLE_VCS,
            Method::TogglePopups => OP_TOGGLE_POPUPS,
            Method::GetAccountInfo => OP_GET_ACCOUNT_INFO,
            Method::GetAvailableMethods => OP_GET_AVAILABLE_METHODS,
            Method::AddTrustedOrigin => OP_ADD_TRUSTED_ORIGIN,
            Method::RemoveTrustedOrigin => OP_REMOVE_TRUSTED_ORIGIN,
        }
    }
}

impl TryFrom<RpcMethod> for Method {
    type Error = CommonError;

    fn try_from(value: RpcMethod) -> Result<Self, Self::Error> {
        let given = value.to_string();
        let name = given
            .strip_prefix(RPC_METHOD_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or(CommonError::MethodError(format!(
                "unknown method: {}",
                given
            )))?;

        Method::all()
            .into_iter()
            .find(|method| method.build_path() == name)
            .ok_or(CommonError::MethodError(format!(
                "unknown method: {}",
                given
            )))
    }
}
