use prople_jsonrpc_core::objects::RpcProcessor;

use crate::common::types::{CommonError, RPCService};
use crate::config::Config;

use super::shared::db::Builder as DbBuilder;
use super::snap::Snap;

/// `Manager` collects the routes of every RPC service into a single processor
pub struct Manager {
    processor: RpcProcessor,
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager {
    pub fn new() -> Self {
        Self {
            processor: RpcProcessor::default(),
        }
    }

    pub fn build_snap_service(&mut self, conf: Config) -> Result<&mut Self, CommonError> {
        let mut db_builder = DbBuilder::new(conf.clone());
        let db_executor = db_builder.build(|opts| opts.db().state.clone())?;

        let mut snap_rpc = Snap::new(db_executor, conf);
        snap_rpc.build()?;
        snap_rpc.setup_rpc()?;

        let routes = snap_rpc.routes();
        if routes.is_empty() {
            return Err(CommonError::RpcError(String::from(
                "snap doesn't have any routes",
            )));
        }

        for route in routes.iter() {
            self.processor.register_route(route.clone());
        }

        Ok(self)
    }

    pub fn processor(&self) -> RpcProcessor {
        self.processor.clone()
    }
}
