use indexmap::IndexMap;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, Value};
use rst_common::with_logging::log::{debug, warn};

use crate::identity::account::types::CloudCredentials;
use crate::identity::account::AccountIdentityState;
use crate::identity::method::DidMethod;

use super::codec::{self, RecordFilter};
use super::local::is_owned;
use super::types::{
    CloudBackendBuilder, Configurable, CredentialRecord, CredentialStore, QueryFilter, SaveOutcome,
    StoreError, StoreName, StoredCredentialRecord, CLOUD_FILE_NAME,
};

type CloudFile = IndexMap<String, Value>;

/// `CloudStore` keeps the credentials in a single file living in the app data folder
/// of the user's cloud drive. The file is always rewritten as a whole
pub struct CloudStore<TBackend>
where
    TBackend: CloudBackendBuilder,
{
    backend: TBackend,
}

impl<TBackend> CloudStore<TBackend>
where
    TBackend: CloudBackendBuilder,
{
    pub fn new(backend: TBackend) -> Self {
        Self { backend }
    }

    fn access_token(account: &AccountIdentityState) -> Result<String, StoreError> {
        account
            .account_config
            .cloud
            .as_ref()
            .map(|cloud| cloud.access_token.clone())
            .ok_or(StoreError::Unavailable(String::from(
                "cloud account is not configured",
            )))
    }

    async fn read(&self, token: &str) -> Result<CloudFile, StoreError> {
        let content = self
            .backend
            .read_file(token, CLOUD_FILE_NAME)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        match content {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(&raw)
                .map_err(|err| StoreError::CodecError(err.to_string())),
            _ => Ok(CloudFile::new()),
        }
    }

    async fn write(&self, token: &str, file: &CloudFile) -> Result<(), StoreError> {
        let content =
            serde_json::to_string(file).map_err(|err| StoreError::CodecError(err.to_string()))?;

        self.backend
            .write_file(token, CLOUD_FILE_NAME, content)
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    async fn try_delete(
        &self,
        account: &AccountIdentityState,
        method: DidMethod,
        id: &str,
    ) -> Result<bool, StoreError> {
        let token = Self::access_token(account)?;
        let mut file = self.read(&token).await?;

        let owned = file
            .get(id)
            .map(|data| is_owned(account, method, data))
            .unwrap_or(false);

        if !owned {
            return Ok(false);
        }

        file.shift_remove(id);
        self.write(&token, &file).await?;
        Ok(true)
    }

    async fn try_clear(
        &self,
        account: &AccountIdentityState,
        method: DidMethod,
    ) -> Result<(), StoreError> {
        let token = Self::access_token(account)?;
        let mut file = self.read(&token).await?;

        let before = file.len();
        file.retain(|_, data| !is_owned(account, method, data));
        if before != file.len() {
            self.write(&token, &file).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl<TBackend> CredentialStore for CloudStore<TBackend>
where
    TBackend: CloudBackendBuilder,
{
    fn name(&self) -> StoreName {
        StoreName::Cloud
    }

    async fn query(
        &self,
        account: &AccountIdentityState,
        method: DidMethod,
        filter: &QueryFilter,
    ) -> Result<Vec<StoredCredentialRecord>, StoreError> {
        let filter = RecordFilter::compile(filter)?;
        let token = Self::access_token(account)?;
        let file = self.read(&token).await?;

        let mut records = Vec::new();
        for (id, data) in file.into_iter() {
            let claims = codec::claims_of(&data);
            if !is_owned(account, method, &data) || !filter.matches(&id, &claims) {
                continue;
            }

            records.push(StoredCredentialRecord {
                id,
                store: StoreName::Cloud,
                data,
            });
        }

        Ok(records)
    }

    async fn save(
        &self,
        account: &mut AccountIdentityState,
        method: DidMethod,
        records: &[CredentialRecord],
    ) -> Result<SaveOutcome, StoreError> {
        let token = Self::access_token(account)?;
        let mut file = self.read(&token).await?;

        let mut outcome = SaveOutcome::default();
        for record in records {
            if !is_owned(account, method, &record.data) {
                debug!("cloud store: skipped not owned credential {}", record.id);
                outcome.skipped.push(record.id.clone());
                continue;
            }

            file.insert(record.id.clone(), record.data.clone());
            outcome.saved.push(record.id.clone());
        }

        if !outcome.saved.is_empty() {
            self.write(&token, &file).await?;
        }

        Ok(outcome)
    }

    async fn delete(&self, account: &mut AccountIdentityState, method: DidMethod, id: &str) -> bool {
        match self.try_delete(account, method, id).await {
            Ok(removed) => {
                if !removed {
                    debug!("cloud store: credential {} not found", id);
                }
                removed
            }
            Err(err) => {
                warn!("cloud store: unable to delete {}: {}", id, err);
                false
            }
        }
    }

    async fn clear(&self, account: &mut AccountIdentityState, method: DidMethod) -> bool {
        match self.try_clear(account, method).await {
            Ok(_) => true,
            Err(err) => {
                warn!("cloud store: unable to clear credentials: {}", err);
                false
            }
        }
    }

    fn as_configurable(&self) -> Option<&dyn Configurable> {
        Some(self)
    }
}

#[async_trait]
impl<TBackend> Configurable for CloudStore<TBackend>
where
    TBackend: CloudBackendBuilder,
{
    async fn configure(&self, access_token: &str) -> Result<CloudCredentials, StoreError> {
        let email = self
            .backend
            .verify_access_token(access_token)
            .await
            .map_err(|err| StoreError::ConfigureError(err.to_string()))?;

        Ok(CloudCredentials {
            access_token: access_token.to_string(),
            email,
        })
    }
}
