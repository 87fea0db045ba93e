use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;

use rstdev_storage::engine::rocksdb::executor::Executor;
use rstdev_storage::engine::rocksdb::types::{
    Instruction as DbInstruction, OutputOpts as DbOutput,
};

use prople_snap_core::identity::host::StateRepoBuilder;
use prople_snap_core::identity::types::IdentityError;

const STATE_KEY: &str = "snap_state";

/// `Repository` keeps the whole snap state as a single rocksdb value
#[derive(Clone)]
pub struct Repository {
    db: Executor,
    key: String,
}

impl Repository {
    pub fn new(db: Executor) -> Self {
        Self {
            db,
            key: STATE_KEY.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_key(db: Executor, key: &str) -> Self {
        Self {
            db,
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl StateRepoBuilder for Repository {
    async fn load_state(&self) -> Result<Option<Vec<u8>>, IdentityError> {
        let output = self
            .db
            .exec(DbInstruction::GetCf {
                key: self.key.clone(),
            })
            .await
            .map_err(|err| IdentityError::StateError(err.to_string()))?;

        match output {
            DbOutput::SingleByte { value } => {
                debug!("state loaded, found: {}", value.is_some());
                Ok(value)
            }
            _ => Err(IdentityError::StateError(
                "unknown output type".to_string(),
            )),
        }
    }

    async fn persist_state(&self, blob: Vec<u8>) -> Result<(), IdentityError> {
        let _ = self
            .db
            .exec(DbInstruction::SaveCf {
                key: self.key.clone(),
                value: blob,
            })
            .await
            .map_err(|err| IdentityError::StateError(err.to_string()))?;

        debug!("state persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::with_tokio::tokio;

    use crate::common::helpers::testdb;

    #[tokio::test]
    async fn test_load_missing_state() {
        let repo = Repository::with_key(testdb::global_db_builder().clone(), "missing_state");
        let loaded = repo.load_state().await;
        assert!(!loaded.is_err());
        assert!(loaded.unwrap().is_none())
    }

    #[tokio::test]
    async fn test_persist_and_load() {
        let repo = Repository::with_key(testdb::global_db_builder().clone(), "persisted_state");

        let blob = br#"{"version":1}"#.to_vec();
        let persisted = repo.persist_state(blob.clone()).await;
        assert!(!persisted.is_err());

        let loaded = repo.load_state().await.unwrap();
        assert_eq!(loaded, Some(blob))
    }
}
