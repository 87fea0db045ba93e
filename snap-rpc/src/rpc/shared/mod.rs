pub mod db;
pub mod rpc;
