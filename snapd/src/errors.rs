use rst_common::with_errors::thiserror::{self, Error};

use prople_jsonrpc_axum::rpc::RpcError;
use prople_snap_rpc::common::types::CommonError;

#[derive(Debug, Error)]
pub enum SnapdError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("rpc error: {0}")]
    RpcError(String),
}

impl From<CommonError> for SnapdError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::ConfigError(msg) | CommonError::ValidationError(msg) => {
                SnapdError::ConfigError(msg)
            }
            other => SnapdError::RpcError(other.to_string()),
        }
    }
}

impl From<SnapdError> for RpcError {
    fn from(err: SnapdError) -> Self {
        RpcError::AxumError(err.to_string())
    }
}
