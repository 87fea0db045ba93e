use indexmap::IndexMap;

use rst_common::with_logging::log::{debug, info};

use crate::identity::account::types::CloudCredentials;
use crate::identity::account::AccountIdentityState;
use crate::identity::method::DidMethod;
use crate::identity::types::IdentityError;

use super::types::{
    CredentialRecord, CredentialStore, QueryFilter, StoreName, StoreSaveOutcome, StoreSelector,
    StoredCredentialRecord,
};

/// `CredentialManager` dispatches the credential requests to the selected stores
///
/// Saving is best effort: when a store fails the whole call fails, but the stores that
/// were already written keep their records.
pub struct CredentialManager {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl CredentialManager {
    pub fn new(stores: Vec<Box<dyn CredentialStore>>) -> Self {
        Self { stores }
    }

    pub fn available_stores(&self) -> Vec<StoreName> {
        self.stores.iter().map(|store| store.name()).collect()
    }

    fn store(&self, name: StoreName) -> Result<&dyn CredentialStore, IdentityError> {
        self.stores
            .iter()
            .find(|store| store.name() == name)
            .map(|store| store.as_ref())
            .ok_or(IdentityError::StorageUnavailable(format!(
                "store not registered: {}",
                name
            )))
    }

    pub async fn save(
        &self,
        account: &mut AccountIdentityState,
        method: DidMethod,
        selector: &StoreSelector,
        records: &[CredentialRecord],
    ) -> Result<Vec<StoreSaveOutcome>, IdentityError> {
        let mut outcomes = Vec::new();
        for name in selector.stores() {
            let store = self.store(*name)?;
            let outcome = store.save(account, method, records).await?;

            info!(
                "store [{}]: saved {} credentials, skipped {}",
                name,
                outcome.saved.len(),
                outcome.skipped.len()
            );

            outcomes.push(StoreSaveOutcome {
                store: *name,
                saved: outcome.saved,
                skipped: outcome.skipped,
            });
        }

        Ok(outcomes)
    }

    pub async fn query(
        &self,
        account: &AccountIdentityState,
        method: DidMethod,
        selector: &StoreSelector,
        filter: &QueryFilter,
    ) -> Result<Vec<StoredCredentialRecord>, IdentityError> {
        let mut records = Vec::new();
        for name in selector.stores() {
            let store = self.store(*name)?;
            let mut found = store.query(account, method, filter).await?;
            debug!("store [{}]: found {} credentials", name, found.len());
            records.append(&mut found);
        }

        Ok(records)
    }

    pub async fn delete(
        &self,
        account: &mut AccountIdentityState,
        method: DidMethod,
        selector: &StoreSelector,
        id: &str,
    ) -> Result<IndexMap<StoreName, bool>, IdentityError> {
        let mut results = IndexMap::new();
        for name in selector.stores() {
            let store = self.store(*name)?;
            results.insert(*name, store.delete(account, method, id).await);
        }

        Ok(results)
    }

    pub async fn clear(
        &self,
        account: &mut AccountIdentityState,
        method: DidMethod,
        selector: &StoreSelector,
    ) -> Result<IndexMap<StoreName, bool>, IdentityError> {
        let mut results = IndexMap::new();
        for name in selector.stores() {
            let store = self.store(*name)?;
            results.insert(*name, store.clear(account, method).await);
        }

        Ok(results)
    }

    /// `configure` routes the access token to the first store able to use it
    pub async fn configure(&self, access_token: &str) -> Result<CloudCredentials, IdentityError> {
        let configurable = self
            .stores
            .iter()
            .find_map(|store| store.as_configurable())
            .ok_or(IdentityError::StorageUnavailable(String::from(
                "no configurable store registered",
            )))?;

        let credentials = configurable.configure(access_token).await?;
        Ok(credentials)
    }
}
