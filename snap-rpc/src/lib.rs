//! `prople-snap-rpc` exposes the snap operations as `JSON-RPC` methods
//!
//! All methods share the `prople.snap` prefix, e.g. `prople.snap.createVC`, and take
//! the same envelope: the caller origin, the wallet context and the operation request.
pub mod common;
pub mod config;
pub mod rpc;

use common::helpers::validate;
use common::types::CommonError;
use config::{App, Config, Parser as ConfigManager};
use rpc::Manager;

/// `SnapRPC` is the entrypoint used by the daemon: it loads the configuration once and
/// builds the RPC processor from it
pub struct SnapRPC {
    config: Config,
}

impl SnapRPC {
    pub fn new(config_file: &str) -> Result<Self, CommonError> {
        let config = ConfigManager::new(config_file.to_string())
            .parse()
            .map_err(|err| CommonError::ConfigError(err.to_string()))?;

        validate(config.clone())?;
        Ok(Self { config })
    }

    pub fn build_app_config(&self) -> Result<App, CommonError> {
        Ok(self.config.app().to_owned())
    }

    pub fn build_rpc_snap(&mut self) -> Result<Manager, CommonError> {
        let mut manager = Manager::new();
        manager.build_snap_service(self.config.clone())?;
        Ok(manager)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::helpers::testdb::fixture_file;

    #[test]
    fn test_load_config() {
        let snap_rpc = SnapRPC::new(&fixture_file("config.toml"));
        assert!(!snap_rpc.is_err());

        let app = snap_rpc.unwrap().build_app_config().unwrap();
        assert_eq!(app.get_app_config(), ("localhost".to_string(), "8181".to_string()));
    }

    #[test]
    fn test_missing_config() {
        let snap_rpc = SnapRPC::new("/tmp/missing-snap-config.toml");
        assert!(matches!(
            snap_rpc.err(),
            Some(CommonError::ConfigError(_))
        ))
    }

    #[test]
    fn test_invalid_config() {
        let snap_rpc = SnapRPC::new(&fixture_file("config_app.toml"));
        assert!(snap_rpc.is_err())
    }
}
