mod shared;
pub use shared::db::Builder as DbBuilder;
pub use shared::rpc::method::{build_rpc_method, RpcMethodBuilder, RPC_METHOD_PREFIX};

pub mod snap;

mod manager;
pub use manager::Manager;
