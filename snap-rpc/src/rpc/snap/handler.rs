use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::{info, warn};
use rst_common::with_tokio::tokio::sync::Mutex;

use prople_jsonrpc_core::types::{RpcError, RpcHandler, RpcHandlerOutput, RpcMethod};

use prople_snap_core::identity::operations::types::{Operation, OperationsUsecaseBuilder};
use prople_snap_core::identity::types::IdentityError;

use crate::config::Snap as SnapConfig;
use crate::rpc::shared::rpc::method::RpcMethodBuilder;

use super::host::RequestHost;
use super::rpc_method::Method;
use super::rpc_param::Param;

/// `SnapHandler` routes every snap method to the operations facade
///
/// Requests run one at a time, the whole state is loaded and persisted by each of them.
#[derive(Clone)]
pub struct SnapHandler {
    operations: Arc<dyn OperationsUsecaseBuilder>,
    lock: Arc<Mutex<()>>,
    config: SnapConfig,
}

impl SnapHandler {
    pub fn new(operations: Arc<dyn OperationsUsecaseBuilder>, config: SnapConfig) -> Self {
        Self {
            operations,
            lock: Arc::new(Mutex::new(())),
            config,
        }
    }

    fn to_rpc_error(err: IdentityError) -> RpcError {
        match err {
            IdentityError::InvalidParams(msg) => {
                warn!("invalid params: {}", msg);
                RpcError::InvalidParams
            }
            other => RpcError::HandlerError(format!("{}: {}", other.kind(), other)),
        }
    }
}

#[async_trait]
impl RpcHandler for SnapHandler {
    async fn call(&self, method: RpcMethod, params: Option<Value>) -> RpcHandlerOutput {
        let param_value = params.ok_or(RpcError::InvalidParams)?;
        let rpc_param = Param::try_from(param_value).map_err(|_| RpcError::ParseError)?;
        let rpc_method = Method::try_from(method).map_err(|_| RpcError::MethodNotFound)?;

        let operation = Operation::from_request(rpc_method.build_path(), rpc_param.request.clone())
            .map_err(Self::to_rpc_error)?;

        let host = RequestHost::new(
            &self.config,
            &rpc_param.context,
            rpc_param.prompt_response.clone(),
        );
        let ctx = rpc_param.request_context();

        let _guard = self.lock.lock().await;
        info!("executing: {} from {}", operation.name(), ctx.origin);

        let output = self
            .operations
            .execute(&host, &ctx, operation)
            .await
            .map_err(Self::to_rpc_error)?;

        Ok(Some(Box::new(output)))
    }
}
