use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::debug;

use crate::identity::account::AccountIdentityState;
use crate::identity::method::DidMethod;

use super::codec::{self, RecordFilter};
use super::types::{
    CredentialRecord, CredentialStore, QueryFilter, SaveOutcome, StoreError, StoreName,
    StoredCredentialRecord,
};

/// `is_owned` decodes the stored payload and checks its subject against the account
pub(crate) fn is_owned(
    account: &AccountIdentityState,
    method: DidMethod,
    data: &Value,
) -> bool {
    codec::subject_id(&codec::claims_of(data))
        .map(|subject| account.owns_subject(method, &subject))
        .unwrap_or(false)
}

/// `LocalStore` keeps the credentials inside the account record itself, they are
/// persisted together with the rest of the snap state
#[derive(Debug, Clone, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialStore for LocalStore {
    fn name(&self) -> StoreName {
        StoreName::Local
    }

    async fn query(
        &self,
        account: &AccountIdentityState,
        method: DidMethod,
        filter: &QueryFilter,
    ) -> Result<Vec<StoredCredentialRecord>, StoreError> {
        let filter = RecordFilter::compile(filter)?;
        let mut records = Vec::new();
        for (id, data) in account.credentials.iter() {
            let claims = codec::claims_of(data);
            let owned = codec::subject_id(&claims)
                .map(|subject| account.owns_subject(method, &subject))
                .unwrap_or(false);

            if !owned || !filter.matches(id, &claims) {
                continue;
            }

            records.push(StoredCredentialRecord {
                id: id.clone(),
                store: StoreName::Local,
                data: data.clone(),
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
        let mut outcome = SaveOutcome::default();
        for record in records {
            if !is_owned(account, method, &record.data) {
                debug!("local store: skipped not owned credential {}", record.id);
                outcome.skipped.push(record.id.clone());
                continue;
            }

            account
                .credentials
                .insert(record.id.clone(), record.data.clone());
            outcome.saved.push(record.id.clone());
        }

        Ok(outcome)
    }

    async fn delete(&self, account: &mut AccountIdentityState, method: DidMethod, id: &str) -> bool {
        let owned = account
            .credentials
            .get(id)
            .map(|data| is_owned(account, method, data))
            .unwrap_or(false);

        if !owned {
            debug!("local store: credential {} not found", id);
            return false;
        }

        account.credentials.shift_remove(id).is_some()
    }

    async fn clear(&self, account: &mut AccountIdentityState, method: DidMethod) -> bool {
        let removable: Vec<String> = account
            .credentials
            .iter()
            .filter(|(_, data)| is_owned(account, method, data))
            .map(|(id, _)| id.clone())
            .collect();

        for id in removable.iter() {
            account.credentials.shift_remove(id);
        }

        debug!("local store: cleared {} credentials", removable.len());
        true
    }
}
