use std::sync::Arc;

use rstdev_storage::engine::rocksdb::executor::Executor;

use prople_jsonrpc_core::types::RpcRoute;

use prople_snap_core::identity::account::usecase::Usecase as AccountUsecase;
use prople_snap_core::identity::operations::confirm::Confirmer;
use prople_snap_core::identity::operations::types::OperationsUsecaseBuilder;
use prople_snap_core::identity::operations::Usecase as OperationsUsecase;
use prople_snap_core::identity::verifiable::credential::cloud::CloudStore;
use prople_snap_core::identity::verifiable::credential::local::LocalStore;
use prople_snap_core::identity::verifiable::credential::CredentialManager;

use crate::common::types::{CommonError, RPCService};
use crate::config::Config;
use crate::rpc::shared::rpc::method::build_rpc_method;

mod handler;
mod host;
mod repository;
mod rpc_method;
mod rpc_param;

pub mod clients;

pub use handler::SnapHandler;
pub use host::RequestHost;
pub use repository::Repository;
pub use rpc_method::Method;
pub use rpc_param::{Param, SnapContext};

use clients::{build_http_client, AgentClient, GoogleDrive, MirrorLookup, UniversalResolver};

type SnapAccountUsecase = AccountUsecase<AgentClient, MirrorLookup>;
type SnapOperations = OperationsUsecase<SnapAccountUsecase, AgentClient, UniversalResolver, Repository>;

/// `Snap` wires the snap operations with their production collaborators and exposes
/// them as RPC routes
pub struct Snap {
    db: Executor,
    config: Config,
    operations: Option<Arc<dyn OperationsUsecaseBuilder>>,
    routes: Vec<RpcRoute>,
}

impl Snap {
    pub fn new(db: Executor, config: Config) -> Self {
        Self {
            db,
            config,
            operations: None,
            routes: Vec::new(),
        }
    }
}

impl RPCService for Snap {
    fn build(&mut self) -> Result<(), CommonError> {
        let endpoints = self.config.endpoints();
        let timeout = self.config.snap().get_dialog_timeout();
        let http = build_http_client()?;

        let agent = Arc::new(AgentClient::new(http.clone(), endpoints.get_agent()));
        let resolver = UniversalResolver::new(http.clone(), endpoints.get_resolver());
        let lookup = MirrorLookup::new(http.clone(), endpoints.get_mirrors());
        let drive = GoogleDrive::new(http, endpoints.get_google());

        let account = SnapAccountUsecase::new(agent.clone(), lookup, timeout);
        let manager = CredentialManager::new(vec![
            Box::new(LocalStore::new()),
            Box::new(CloudStore::new(drive)),
        ]);

        let operations: SnapOperations = OperationsUsecase::new(
            account,
            agent,
            resolver,
            Repository::new(self.db.to_owned()),
            manager,
            Confirmer::new(timeout),
        );

        self.operations = Some(Arc::new(operations));
        Ok(())
    }

    fn setup_rpc(&mut self) -> Result<(), CommonError> {
        let operations = self
            .operations
            .as_ref()
            .ok_or(CommonError::InternalError(String::from(
                "missing snap operations",
            )))?;

        let handler = SnapHandler::new(operations.clone(), self.config.snap().to_owned());
        let controller = Box::new(handler);

        for method in Method::all() {
            self.routes
                .push(RpcRoute::new(build_rpc_method(method), controller.clone()));
        }

        Ok(())
    }

    fn routes(&self) -> Vec<RpcRoute> {
        self.routes.clone()
    }
}
