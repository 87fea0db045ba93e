use std::time::Duration;

use rst_common::with_http_tokio::axum::routing::post;
use rst_common::with_http_tokio::axum::Router;
use rst_common::with_http_tokio::tower_http::timeout::TimeoutLayer;
use rst_common::with_http_tokio::tower_http::trace::TraceLayer;
use rst_common::with_tracing::tracing_subscriber::{
    self, layer::SubscriberExt, util::SubscriberInitExt,
};

use prople_jsonrpc_axum::rpc::{Rpc as RpcAxum, RpcConfig, RpcError, RpcHandlerFn, RpcState};
use prople_snap_rpc::SnapRPC;

use crate::errors::SnapdError;

/// `REQUEST_TIMEOUT_SECS` must outlive the dialog timeout of the slowest operation
const REQUEST_TIMEOUT_SECS: u64 = 330;

pub struct Rpc {
    config: String,
}

impl Rpc {
    pub fn new(config: String) -> Rpc {
        Self { config }
    }

    pub fn svc(&self) -> Result<RpcAxum, RpcError> {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!(
                        "{}=debug,prople_snap_rpc=debug,prople_snap_core=debug,tower_http=debug,axum=trace",
                        env!("CARGO_CRATE_NAME")
                    )
                    .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().without_time())
            .init();

        let mut snap_rpc = SnapRPC::new(&self.config).map_err(SnapdError::from)?;
        let config_app = snap_rpc.build_app_config().map_err(SnapdError::from)?;
        let rpc_snap = snap_rpc.build_rpc_snap().map_err(SnapdError::from)?;

        let rpc_state = RpcState::new(rpc_snap.processor());
        let rpc_app = Router::new().route("/rpc", post(RpcHandlerFn)).layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)),
        ));

        let (host, port) = config_app.get_app_config();
        let axum_config = RpcConfig::new(host, port);

        Ok(RpcAxum::new(axum_config, rpc_state, rpc_app))
    }
}
