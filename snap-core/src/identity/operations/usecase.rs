use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::Utc;
use rst_common::standard::serde_json::Value;
use rst_common::with_logging::log::{debug, info, warn};

use crate::identity::account::state::{CurrentAccount, SnapState};
use crate::identity::account::types::AccountUsecaseBuilder;
use crate::identity::account::AccountIdentityState;
use crate::identity::host::{HostBuilder, Panel, StateRepoBuilder};
use crate::identity::method::DidMethod;
use crate::identity::network;
use crate::identity::types::IdentityError;
use crate::identity::verifiable::credential::codec;
use crate::identity::verifiable::credential::types::{
    CredentialRecord, QueryFilter, StoreName, StoreSelector,
};
use crate::identity::verifiable::credential::{CredentialManager, UnsignedCredential};
use crate::identity::verifiable::presentation::UnsignedPresentation;
use crate::identity::verifiable::types::{
    IdentityAgentBuilder, ResolutionResult, ResolverBuilder, SignerContext,
};

use super::confirm::{pretty, Confirmer};
use super::types::{
    AccountSummary, ConfigureCloudParams, CreateVcParams, CreateVpParams, CreatedCredential,
    CredentialMetadata, DeleteAllVcsParams, GetVcsParams, Operation, OperationOutput,
    OperationsUsecaseBuilder, OriginParams, RemoveVcParams, RemovedCredential, RequestContext,
    ResolveDidParams, SaveVcParams, SwitchMethodParams,
};

/// `Usecase` is the base implementation of the [`OperationsUsecaseBuilder`]
///
/// Every request loads the whole state, connects the active account, runs the
/// operation and persists the state only when the operation succeeded and the
/// state was changed.
pub struct Usecase<TAccount, TAgent, TResolver, TRepo>
where
    TAccount: AccountUsecaseBuilder,
    TAgent: IdentityAgentBuilder,
    TResolver: ResolverBuilder,
    TRepo: StateRepoBuilder,
{
    account: TAccount,
    agent: Arc<TAgent>,
    resolver: TResolver,
    repo: TRepo,
    manager: CredentialManager,
    confirmer: Confirmer,
}

fn account_of<'a>(
    state: &'a SnapState,
    current: &CurrentAccount,
) -> Result<&'a AccountIdentityState, IdentityError> {
    state
        .get_account(&current.network, &current.address)
        .ok_or(IdentityError::StateError(format!(
            "missing account record: {}",
            current.address
        )))
}

fn account_of_mut<'a>(
    state: &'a mut SnapState,
    current: &CurrentAccount,
) -> Result<&'a mut AccountIdentityState, IdentityError> {
    state
        .get_account_mut(&current.network, &current.address)
        .ok_or(IdentityError::StateError(format!(
            "missing account record: {}",
            current.address
        )))
}

fn signer_of(account: &AccountIdentityState, current: &CurrentAccount) -> Result<SignerContext, IdentityError> {
    account
        .identifier_for(current.method)
        .map(SignerContext::from)
        .ok_or(IdentityError::AccountError(format!(
            "no identifier registered for {}",
            current.method
        )))
}

impl<TAccount, TAgent, TResolver, TRepo> Usecase<TAccount, TAgent, TResolver, TRepo>
where
    TAccount: AccountUsecaseBuilder,
    TAgent: IdentityAgentBuilder,
    TResolver: ResolverBuilder,
    TRepo: StateRepoBuilder,
{
    pub fn new(
        account: TAccount,
        agent: Arc<TAgent>,
        resolver: TResolver,
        repo: TRepo,
        manager: CredentialManager,
        confirmer: Confirmer,
    ) -> Self {
        Self {
            account,
            agent,
            resolver,
            repo,
            manager,
            confirmer,
        }
    }

    async fn load_state(&self) -> Result<SnapState, IdentityError> {
        match self.repo.load_state().await? {
            Some(blob) => SnapState::from_blob(&blob),
            None => Ok(SnapState::default()),
        }
    }

    async fn resolve_did(
        &self,
        current: &CurrentAccount,
        params: ResolveDidParams,
    ) -> Result<OperationOutput, IdentityError> {
        let did = params.did.unwrap_or(current.did.clone());
        let resolved = if did.starts_with(DidMethod::Hedera.prefix().as_str()) {
            self.agent.resolve_identifier(&did).await
        } else {
            self.resolver.resolve(&did).await
        };

        let result = resolved.unwrap_or_else(|err| {
            warn!("unable to resolve {}: {}", did, err);
            ResolutionResult::failed(err.to_string())
        });

        Ok(OperationOutput::Resolution(result))
    }

    async fn get_vcs(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &SnapState,
        current: &CurrentAccount,
        params: GetVcsParams,
    ) -> Result<OperationOutput, IdentityError> {
        let account = account_of(state, current)?;
        let filter = params.filter.unwrap_or_default();
        let records = self
            .manager
            .query(account, current.method, &params.options.store, &filter)
            .await?;

        if records.is_empty() {
            return Ok(OperationOutput::Credentials(records));
        }

        let mut panel = Panel::new("Share VCs")
            .text(format!(
                "{} would like to read the following {} VCs",
                current.origin,
                records.len()
            ))
            .divider();
        for record in records.iter() {
            panel = panel
                .subheading(format!("{} ({})", record.id, record.store))
                .copyable(pretty(&record.data));
        }

        self.confirmer.require(host, bypass, &panel).await?;
        Ok(OperationOutput::Credentials(records))
    }

    async fn save_vc(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
        params: SaveVcParams,
    ) -> Result<OperationOutput, IdentityError> {
        let record = CredentialRecord {
            id: codec::credential_id(&params.data)?,
            data: params.data,
        };

        let panel = Panel::new("Save VC")
            .text("Would you like to save the following VC?")
            .divider()
            .copyable(pretty(&record.data));
        self.confirmer.require(host, bypass, &panel).await?;

        let account = account_of_mut(state, current)?;
        let outcomes = self
            .manager
            .save(account, current.method, &params.options.store, &[record])
            .await?;

        Ok(OperationOutput::Saved(outcomes))
    }

    async fn create_vc(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
        params: CreateVcParams,
    ) -> Result<OperationOutput, IdentityError> {
        let account = account_of(state, current)?;
        let signer = signer_of(account, current)?;

        let mut unsigned = UnsignedCredential::new(current.did.clone(), params.vc_value);
        unsigned.key = params.vc_key;
        unsigned.types = params.cred_types.unwrap_or_default();
        if network::is_hedera_network(&current.network) {
            unsigned.hedera_account_id = account.key_store.external_chain_account_id.clone();
        }

        let credential = unsigned.build(Utc::now());
        let panel = Panel::new("Create VC")
            .text("Would you like to create and sign the following VC?")
            .divider()
            .copyable(pretty(&credential));
        self.confirmer.require(host, bypass, &panel).await?;

        let proof_format = params.options.proof_format.unwrap_or_default();
        let signed = self
            .agent
            .sign_credential(&signer, credential, proof_format)
            .await?;

        let id = match params.options.id {
            Some(id) => id,
            None => codec::credential_id(&signed)?,
        };

        let mut stores: Vec<StoreName> = Vec::new();
        if params.options.save {
            let record = CredentialRecord {
                id: id.clone(),
                data: signed.clone(),
            };

            let account = account_of_mut(state, current)?;
            let outcomes = self
                .manager
                .save(account, current.method, &params.options.store, &[record])
                .await?;

            stores = outcomes
                .into_iter()
                .filter(|outcome| outcome.saved.contains(&id))
                .map(|outcome| outcome.store)
                .collect();
        }

        info!("created credential {}", id);
        Ok(OperationOutput::Created(CreatedCredential {
            data: signed,
            metadata: CredentialMetadata { id, stores },
        }))
    }

    async fn verify_vc(&self, credential: Value) -> Result<OperationOutput, IdentityError> {
        let verified = match self.agent.verify_credential(credential).await {
            Ok(result) => {
                if let Some(err) = result.error.as_ref() {
                    warn!("credential verification failed: {}", err);
                }
                result.verified
            }
            Err(err) => {
                warn!("credential verification failed: {}", err);
                false
            }
        };

        Ok(OperationOutput::Flag(verified))
    }

    async fn verify_vp(&self, presentation: Value) -> Result<OperationOutput, IdentityError> {
        let verified = match self.agent.verify_presentation(presentation).await {
            Ok(result) => {
                if let Some(err) = result.error.as_ref() {
                    warn!("presentation verification failed: {}", err);
                }
                result.verified
            }
            Err(err) => {
                warn!("presentation verification failed: {}", err);
                false
            }
        };

        Ok(OperationOutput::Flag(verified))
    }

    async fn remove_vc(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
        params: RemoveVcParams,
    ) -> Result<OperationOutput, IdentityError> {
        let selector = params.options.store;
        let mut found = Vec::new();
        {
            let account = account_of(state, current)?;
            for id in params.id.to_vec() {
                let records = self
                    .manager
                    .query(account, current.method, &selector, &QueryFilter::ById(id.clone()))
                    .await?;

                if records.is_empty() {
                    debug!("credential {} not found", id);
                    continue;
                }

                if !found.iter().any(|(known, _)| known == &id) {
                    found.push((id, records));
                }
            }
        }

        if found.is_empty() {
            return Ok(OperationOutput::Removed(vec![]));
        }

        let mut panel = Panel::new("Remove VCs")
            .text("Would you like to remove the following VCs?")
            .divider();
        for (id, records) in found.iter() {
            let stores: Vec<String> = records
                .iter()
                .map(|record| record.store.to_string())
                .collect();
            panel = panel
                .subheading(format!("{} ({})", id, stores.join(", ")))
                .copyable(pretty(&records[0].data));
        }
        self.confirmer.require(host, bypass, &panel).await?;

        let account = account_of_mut(state, current)?;
        let mut removed = Vec::new();
        for (id, _) in found {
            let stores = self
                .manager
                .delete(account, current.method, &selector, &id)
                .await?;
            removed.push(RemovedCredential { id, stores });
        }

        Ok(OperationOutput::Removed(removed))
    }

    async fn delete_all_vcs(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
        params: DeleteAllVcsParams,
    ) -> Result<OperationOutput, IdentityError> {
        let selector = params.options.store;
        let stores: Vec<String> = selector
            .stores()
            .iter()
            .map(|store| store.to_string())
            .collect();

        let panel = Panel::new("Delete all VCs")
            .text(format!(
                "Would you like to delete all VCs of {} from {}?",
                current.did,
                stores.join(", ")
            ));
        self.confirmer.require(host, bypass, &panel).await?;

        let account = account_of_mut(state, current)?;
        let cleared = self
            .manager
            .clear(account, current.method, &selector)
            .await?;

        Ok(OperationOutput::Cleared(cleared))
    }

    async fn create_vp(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &SnapState,
        current: &CurrentAccount,
        params: CreateVpParams,
    ) -> Result<OperationOutput, IdentityError> {
        let account = account_of(state, current)?;

        let mut credentials: Vec<Value> = Vec::new();
        for id in params.vc_ids.iter() {
            let records = self
                .manager
                .query(
                    account,
                    current.method,
                    &params.options.store,
                    &QueryFilter::ById(id.clone()),
                )
                .await?;

            match records.into_iter().next() {
                Some(record) => credentials.push(record.data),
                None => warn!("credential {} not found, skipped", id),
            }
        }
        credentials.extend(params.vcs);

        if credentials.is_empty() {
            return Ok(OperationOutput::Presentation(None));
        }

        let signer = signer_of(account, current)?;
        let proof = params.proof_info.unwrap_or_default();

        let mut unsigned = UnsignedPresentation::new(current.did.clone(), credentials);
        unsigned.typ = proof.typ.clone();
        let presentation = unsigned.build();

        let panel = Panel::new("Create VP")
            .text("Would you like to create a VP from the following VCs?")
            .divider()
            .copyable(pretty(&presentation));
        self.confirmer.require(host, bypass, &panel).await?;

        let signed = self
            .agent
            .sign_presentation(&signer, presentation, proof)
            .await?;

        Ok(OperationOutput::Presentation(Some(signed)))
    }

    async fn switch_did_method(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
        params: SwitchMethodParams,
    ) -> Result<OperationOutput, IdentityError> {
        let method = DidMethod::from_str(&params.did_method)?;
        if method == state.config.active_did_method {
            return Ok(OperationOutput::Flag(false));
        }

        let panel = Panel::new("Switch DID method")
            .text("Would you like to change the DID method?")
            .divider()
            .subheading("Current method")
            .copyable(current.method.to_string())
            .subheading("New method")
            .copyable(method.to_string());
        self.confirmer.require(host, bypass, &panel).await?;

        let _ = self
            .account
            .switch_method(host, state, current, method)
            .await?;

        Ok(OperationOutput::Flag(true))
    }

    async fn configure_cloud(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
        params: ConfigureCloudParams,
    ) -> Result<OperationOutput, IdentityError> {
        let credentials = self.manager.configure(&params.access_token).await?;

        let account = account_of_mut(state, current)?;
        let before = account
            .account_config
            .cloud
            .as_ref()
            .map(|cloud| cloud.email.clone())
            .unwrap_or(String::from("not configured"));

        let panel = Panel::new("Configure Google account")
            .text("Would you like to change the Google account used to store VCs?")
            .divider()
            .subheading("Current account")
            .copyable(before)
            .subheading("New account")
            .copyable(credentials.email.clone());
        self.confirmer.require(host, bypass, &panel).await?;

        info!("cloud account configured: {}", credentials.email);
        account.account_config.cloud = Some(credentials);
        Ok(OperationOutput::Flag(true))
    }

    /// `sync_cloud` copies the records missing from one side to the other, every
    /// direction with something to copy needs its own approval
    async fn sync_cloud(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        state: &mut SnapState,
        current: &CurrentAccount,
    ) -> Result<OperationOutput, IdentityError> {
        let local_only_store = StoreSelector::default();
        let cloud_only_store = StoreSelector::new(vec![StoreName::Cloud])?;

        let account = account_of_mut(state, current)?;
        let local = self
            .manager
            .query(account, current.method, &local_only_store, &QueryFilter::None)
            .await?;
        let cloud = self
            .manager
            .query(account, current.method, &cloud_only_store, &QueryFilter::None)
            .await?;

        let local_ids: HashSet<&String> = local.iter().map(|record| &record.id).collect();
        let cloud_ids: HashSet<&String> = cloud.iter().map(|record| &record.id).collect();

        let to_cloud: Vec<CredentialRecord> = local
            .iter()
            .filter(|record| !cloud_ids.contains(&record.id))
            .map(|record| CredentialRecord {
                id: record.id.clone(),
                data: record.data.clone(),
            })
            .collect();

        let to_local: Vec<CredentialRecord> = cloud
            .iter()
            .filter(|record| !local_ids.contains(&record.id))
            .map(|record| CredentialRecord {
                id: record.id.clone(),
                data: record.data.clone(),
            })
            .collect();

        let mut all_approved = true;
        let mut written = 0;

        let directions = vec![
            (to_cloud, cloud_only_store, "Export VCs to Google Drive"),
            (to_local, local_only_store, "Import VCs from Google Drive"),
        ];

        for (records, target, heading) in directions {
            if records.is_empty() {
                continue;
            }

            let mut panel = Panel::new(heading)
                .text(format!("Would you like to sync {} VCs?", records.len()))
                .divider();
            for record in records.iter() {
                panel = panel.copyable(record.id.clone());
            }

            let approved = bypass || self.confirmer.approve(host, &panel).await?;
            if !approved {
                all_approved = false;
                continue;
            }

            let outcomes = self
                .manager
                .save(account, current.method, &target, &records)
                .await?;
            written += outcomes
                .iter()
                .map(|outcome| outcome.saved.len())
                .sum::<usize>();
        }

        info!("synced {} VCs, all approved: {}", written, all_approved);
        Ok(OperationOutput::Flag(all_approved && written > 0))
    }

    async fn toggle_popups(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
    ) -> Result<OperationOutput, IdentityError> {
        if !state.config.popups_disabled {
            let panel = Panel::new("Disable popups")
                .text("Would you like to disable the confirmation popups?")
                .text("Every operation will run without asking for your approval");

            if !self.confirmer.approve(host, &panel).await? {
                return Err(IdentityError::UserRejected(panel.heading));
            }
        }

        state.config.popups_disabled = !state.config.popups_disabled;
        info!("popups disabled: {}", state.config.popups_disabled);
        Ok(OperationOutput::Flag(true))
    }

    fn account_info(
        &self,
        state: &SnapState,
        current: &CurrentAccount,
    ) -> Result<OperationOutput, IdentityError> {
        let account = account_of(state, current)?;
        let summary = AccountSummary {
            did: current.did.clone(),
            method: current.method,
            network: current.network.clone(),
            address: current.address.clone(),
            snap_account_address: account.account_info.snap_account_address.clone(),
            host_account_address: account.account_info.host_account_address.clone(),
            external_chain_account_id: account.key_store.external_chain_account_id.clone(),
            public_key: account.key_store.public_key.clone(),
            curve: account.key_store.curve,
            origin: account.account_info.origin.clone(),
            external: account.account_info.external,
            cloud_email: account
                .account_config
                .cloud
                .as_ref()
                .map(|cloud| cloud.email.clone()),
            popups_disabled: state.config.popups_disabled,
        };

        Ok(OperationOutput::Account(Box::new(summary)))
    }

    fn available_methods(&self, current: &CurrentAccount) -> OperationOutput {
        let hedera = network::is_hedera_network(&current.network);
        let methods = DidMethod::all()
            .into_iter()
            .filter(|method| *method != DidMethod::Hedera || hedera)
            .map(|method| method.to_string())
            .collect();

        OperationOutput::Methods(methods)
    }

    async fn add_trusted_origin(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
        params: OriginParams,
    ) -> Result<OperationOutput, IdentityError> {
        if state.is_trusted(&params.origin) {
            return Ok(OperationOutput::Flag(false));
        }

        let panel = Panel::new("Trust origin")
            .text("Would you like to run every operation of this origin without confirmation?")
            .divider()
            .copyable(params.origin.clone());

        if !self.confirmer.approve(host, &panel).await? {
            return Err(IdentityError::UserRejected(panel.heading));
        }

        Ok(OperationOutput::Flag(state.add_trusted_origin(&params.origin)))
    }

    async fn dispatch(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
        current: &CurrentAccount,
        operation: Operation,
    ) -> Result<OperationOutput, IdentityError> {
        let bypass = state.config.popups_disabled || state.is_trusted(&current.origin);

        match operation {
            Operation::ResolveDid(params) => self.resolve_did(current, params).await,
            Operation::GetVcs(params) => self.get_vcs(host, bypass, state, current, params).await,
            Operation::SaveVc(params) => self.save_vc(host, bypass, state, current, params).await,
            Operation::CreateVc(params) => {
                self.create_vc(host, bypass, state, current, params).await
            }
            Operation::VerifyVc(params) => self.verify_vc(params.verifiable_credential).await,
            Operation::VerifyVp(params) => self.verify_vp(params.verifiable_presentation).await,
            Operation::RemoveVc(params) => {
                self.remove_vc(host, bypass, state, current, params).await
            }
            Operation::DeleteAllVcs(params) => {
                self.delete_all_vcs(host, bypass, state, current, params)
                    .await
            }
            Operation::CreateVp(params) => {
                self.create_vp(host, bypass, state, current, params).await
            }
            Operation::SwitchDidMethod(params) => {
                self.switch_did_method(host, bypass, state, current, params)
                    .await
            }
            Operation::GetCurrentDidMethod => Ok(OperationOutput::Method(current.method.to_string())),
            Operation::ConfigureGoogleAccount(params) => {
                self.configure_cloud(host, bypass, state, current, params)
                    .await
            }
            Operation::SyncGoogleVcs => self.sync_cloud(host, bypass, state, current).await,
            Operation::TogglePopups => self.toggle_popups(host, state).await,
            Operation::GetAccountInfo => self.account_info(state, current),
            Operation::GetAvailableMethods => Ok(self.available_methods(current)),
            Operation::AddTrustedOrigin(params) => {
                self.add_trusted_origin(host, state, params).await
            }
            Operation::RemoveTrustedOrigin(params) => Ok(OperationOutput::Flag(
                state.remove_trusted_origin(&params.origin),
            )),
        }
    }
}

#[async_trait]
impl<TAccount, TAgent, TResolver, TRepo> OperationsUsecaseBuilder
    for Usecase<TAccount, TAgent, TResolver, TRepo>
where
    TAccount: AccountUsecaseBuilder,
    TAgent: IdentityAgentBuilder,
    TResolver: ResolverBuilder,
    TRepo: StateRepoBuilder,
{
    async fn execute(
        &self,
        host: &dyn HostBuilder,
        ctx: &RequestContext,
        operation: Operation,
    ) -> Result<OperationOutput, IdentityError> {
        operation.validate()?;

        let mut state = self.load_state().await?;
        let loaded = state.to_blob()?;

        let current = self
            .account
            .connect_account(host, &mut state, &ctx.origin, ctx.external_account.as_ref())
            .await?;

        debug!(
            "running {} for {} on {}",
            operation.name(),
            current.did,
            current.network
        );
        let output = self.dispatch(host, &mut state, &current, operation).await?;

        let updated = state.to_blob()?;
        if updated != loaded {
            self.repo.persist_state(updated).await?;
            debug!("state persisted");
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use mockall::mock;
    use rst_common::standard::serde_json::{self, json};
    use rst_common::with_tokio::tokio;
    use table_test::table_test;

    use crate::identity::account::types::Identifier;
    use crate::identity::account::usecase::tests::{
        empty_lookup, fake_host, MockFakeAgent, MockFakeHost, MockFakeLookup, SNAP_ADDRESS,
    };
    use crate::identity::account::usecase::Usecase as AccountUsecase;
    use crate::identity::host::DialogResponse;
    use crate::identity::operations::types::*;
    use crate::identity::verifiable::credential::cloud::tests::MockFakeCloud;
    use crate::identity::verifiable::credential::cloud::CloudStore;
    use crate::identity::verifiable::credential::local::LocalStore;
    use crate::identity::verifiable::types::VerificationResult;

    mock!(
        FakeResolver{}

        #[async_trait]
        impl ResolverBuilder for FakeResolver {
            async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError>;
        }
    );

    /// `MemoryRepo` keeps the persisted blob so the tests can inspect it
    #[derive(Default, Clone)]
    struct MemoryRepo {
        blob: Arc<Mutex<Option<Vec<u8>>>>,
        writes: Arc<Mutex<usize>>,
    }

    impl MemoryRepo {
        fn blob(&self) -> Option<Vec<u8>> {
            self.blob.lock().unwrap().clone()
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl StateRepoBuilder for MemoryRepo {
        async fn load_state(&self) -> Result<Option<Vec<u8>>, IdentityError> {
            Ok(self.blob())
        }

        async fn persist_state(&self, blob: Vec<u8>) -> Result<(), IdentityError> {
            *self.blob.lock().unwrap() = Some(blob);
            *self.writes.lock().unwrap() += 1;
            Ok(())
        }
    }

    type TestUsecase = Usecase<
        AccountUsecase<MockFakeAgent, MockFakeLookup>,
        MockFakeAgent,
        MockFakeResolver,
        MemoryRepo,
    >;

    fn fake_agent() -> MockFakeAgent {
        let mut agent = MockFakeAgent::new();
        agent.expect_create_identifier().returning(|request| {
            let did = request.did.clone().unwrap_or_default();
            Ok(Identifier {
                did: did.clone(),
                controller_key_id: format!("{}#controller", did),
                provider: request.method,
                services: vec![],
            })
        });
        agent
            .expect_sign_credential()
            .returning(|_, credential, _| Ok(credential));
        agent
            .expect_sign_presentation()
            .returning(|_, presentation, _| Ok(presentation));
        agent.expect_verify_credential().returning(|_| {
            Ok(VerificationResult {
                verified: false,
                error: Some("invalid signature".to_string()),
            })
        });
        agent
            .expect_verify_presentation()
            .returning(|_| Err(IdentityError::AgentError("unreachable".to_string())));
        agent
            .expect_resolve_identifier()
            .returning(|_| Err(IdentityError::AgentError("not found".to_string())));
        agent
    }

    fn build_usecase(repo: MemoryRepo, cloud: MockFakeCloud) -> TestUsecase {
        let agent = Arc::new(fake_agent());
        let account = AccountUsecase::new(agent.clone(), empty_lookup(), Duration::from_secs(1));

        let mut resolver = MockFakeResolver::new();
        resolver.expect_resolve().returning(|did| {
            Ok(ResolutionResult {
                did_document: Some(json!({"id": did})),
                did_resolution_metadata: json!({}),
                did_document_metadata: json!({}),
            })
        });

        let manager = CredentialManager::new(vec![
            Box::new(LocalStore::new()),
            Box::new(CloudStore::new(cloud)),
        ]);

        Usecase::new(
            account,
            agent,
            resolver,
            repo,
            manager,
            Confirmer::new(Duration::from_secs(1)),
        )
    }

    fn approving_host() -> MockFakeHost {
        let mut host = fake_host("0x1");
        host.expect_show_dialog()
            .returning(|_, _| Ok(DialogResponse::Approved(true)));
        host
    }

    fn rejecting_host() -> MockFakeHost {
        let mut host = fake_host("0x1");
        host.expect_show_dialog()
            .returning(|_, _| Ok(DialogResponse::Approved(false)));
        host
    }

    fn ctx() -> RequestContext {
        RequestContext {
            origin: "https://dapp.example".to_string(),
            external_account: None,
        }
    }

    fn op(name: &str, params: Value) -> Operation {
        Operation::from_request(name, params).unwrap()
    }

    fn pkh_did() -> String {
        format!("did:pkh:eip155:1:{}", SNAP_ADDRESS)
    }

    fn owned_vc(name: &str) -> Value {
        json!({
            "type": ["VerifiableCredential", "ProfileNamesCredential"],
            "credentialSubject": {"id": pkh_did(), "name": name}
        })
    }

    #[tokio::test]
    async fn test_invalid_params_before_io() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = MockFakeHost::new();

        let output = uc
            .execute(&host, &ctx(), op(OP_SAVE_VC, json!({"data": ""})))
            .await;
        assert!(matches!(
            output.unwrap_err(),
            IdentityError::InvalidParams(_)
        ));
        assert_eq!(repo.writes(), 0);
    }

    #[tokio::test]
    async fn test_save_vc_is_idempotent() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let save = || op(OP_SAVE_VC, json!({"data": owned_vc("alice")}));
        let first = uc.execute(&host, &ctx(), save()).await.unwrap();
        let second = uc.execute(&host, &ctx(), save()).await.unwrap();
        assert_eq!(first, second);

        let vcs = uc
            .execute(&host, &ctx(), op(OP_GET_VCS, Value::Null))
            .await
            .unwrap();
        match vcs {
            OperationOutput::Credentials(records) => assert_eq!(records.len(), 1),
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_rejection_blocks_mutation() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());

        let _ = uc
            .execute(&approving_host(), &ctx(), op(OP_GET_CURRENT_DID_METHOD, Value::Null))
            .await
            .unwrap();
        let before = repo.blob();
        assert!(before.is_some());

        let output = uc
            .execute(
                &rejecting_host(),
                &ctx(),
                op(OP_SAVE_VC, json!({"data": owned_vc("alice")})),
            )
            .await;
        assert!(matches!(
            output.unwrap_err(),
            IdentityError::UserRejected(_)
        ));
        assert_eq!(repo.blob(), before);
    }

    #[tokio::test]
    async fn test_rejected_mutations_keep_state() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());

        let alice = owned_vc("alice");
        let alice_id = codec::credential_id(&alice).unwrap();
        let _ = uc
            .execute(&approving_host(), &ctx(), op(OP_SAVE_VC, json!({"data": alice})))
            .await
            .unwrap();
        let before = repo.blob();
        assert!(before.is_some());

        let table = vec![
            (op(OP_CREATE_VC, json!({"vcValue": {"name": "bob"}})), true),
            (op(OP_REMOVE_VC, json!({"id": alice_id})), true),
            (op(OP_DELETE_ALL_VCS, Value::Null), true),
            (
                op(OP_SWITCH_DID_METHOD, json!({"didMethod": "did:key"})),
                true,
            ),
        ];

        for (validator, input, expected) in table_test!(table) {
            let name = input.name().to_string();
            let output = uc.execute(&rejecting_host(), &ctx(), input).await;
            let rejected = matches!(output, Err(IdentityError::UserRejected(_)));

            validator
                .given(&name)
                .when("the user rejects the dialog")
                .then("the request is rejected and the state is untouched")
                .assert_eq(expected, rejected && repo.blob() == before);
        }
    }

    #[tokio::test]
    async fn test_hedera_method_on_other_network() {
        let mut seeded = SnapState::default();
        seeded.config.active_did_method = DidMethod::Hedera;

        let repo = MemoryRepo::default();
        *repo.blob.lock().unwrap() = Some(seeded.to_blob().unwrap());

        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let method = uc
            .execute(&host, &ctx(), op(OP_GET_CURRENT_DID_METHOD, Value::Null))
            .await
            .unwrap();
        assert_eq!(method, OperationOutput::Method("did:pkh".to_string()));

        let switched = uc
            .execute(
                &host,
                &ctx(),
                op(OP_SWITCH_DID_METHOD, json!({"didMethod": "did:pkh"})),
            )
            .await
            .unwrap();
        assert_eq!(switched, OperationOutput::Flag(true));

        let persisted = SnapState::from_blob(&repo.blob().unwrap()).unwrap();
        assert_eq!(persisted.config.active_did_method, DidMethod::Pkh);
    }

    #[tokio::test]
    async fn test_read_only_operation_skips_persist() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let _ = uc
            .execute(&host, &ctx(), op(OP_GET_CURRENT_DID_METHOD, Value::Null))
            .await
            .unwrap();
        let output = uc
            .execute(&host, &ctx(), op(OP_GET_CURRENT_DID_METHOD, Value::Null))
            .await
            .unwrap();

        assert_eq!(output, OperationOutput::Method("did:pkh".to_string()));
        assert_eq!(repo.writes(), 1);
    }

    #[tokio::test]
    async fn test_method_visibility_isolation() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let _ = uc
            .execute(&host, &ctx(), op(OP_SAVE_VC, json!({"data": owned_vc("alice")})))
            .await
            .unwrap();

        let switched = uc
            .execute(
                &host,
                &ctx(),
                op(OP_SWITCH_DID_METHOD, json!({"didMethod": "did:key"})),
            )
            .await
            .unwrap();
        assert_eq!(switched, OperationOutput::Flag(true));

        let vcs = uc
            .execute(&host, &ctx(), op(OP_GET_VCS, Value::Null))
            .await
            .unwrap();
        assert_eq!(vcs, OperationOutput::Credentials(vec![]));

        let _ = uc
            .execute(
                &host,
                &ctx(),
                op(OP_SWITCH_DID_METHOD, json!({"didMethod": "did:pkh"})),
            )
            .await
            .unwrap();
        let vcs = uc
            .execute(&host, &ctx(), op(OP_GET_VCS, Value::Null))
            .await
            .unwrap();
        match vcs {
            OperationOutput::Credentials(records) => assert_eq!(records.len(), 1),
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_switch_to_same_method_is_noop() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = fake_host("0x1");

        let output = uc
            .execute(
                &host,
                &ctx(),
                op(OP_SWITCH_DID_METHOD, json!({"didMethod": "did:pkh"})),
            )
            .await
            .unwrap();
        assert_eq!(output, OperationOutput::Flag(false));
    }

    #[tokio::test]
    async fn test_create_vc_and_vp() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let created = uc
            .execute(
                &host,
                &ctx(),
                op(
                    OP_CREATE_VC,
                    json!({"vcValue": {"name": "alice"}, "credTypes": ["ProfileNamesCredential"]}),
                ),
            )
            .await
            .unwrap();

        let created = match created {
            OperationOutput::Created(created) => created,
            _ => panic!("unexpected output"),
        };
        assert_eq!(created.metadata.stores, vec![StoreName::Local]);
        assert_eq!(created.data["credentialSubject"]["id"], pkh_did());
        assert_eq!(
            created.metadata.id,
            codec::credential_id(&created.data).unwrap()
        );

        let presentation = uc
            .execute(
                &host,
                &ctx(),
                op(
                    OP_CREATE_VP,
                    json!({"vcIds": [created.metadata.id], "vcs": ["a.b.c"]}),
                ),
            )
            .await
            .unwrap();

        match presentation {
            OperationOutput::Presentation(Some(vp)) => {
                let vcs = vp["verifiableCredential"].as_array().unwrap();
                assert_eq!(vcs.len(), 2);
                assert_eq!(vcs[0]["credentialSubject"]["vcData"]["name"], "alice");
                assert_eq!(vcs[1], "a.b.c");
                assert_eq!(vp["holder"], pkh_did());
            }
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_create_vc_without_save() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let created = uc
            .execute(
                &host,
                &ctx(),
                op(
                    OP_CREATE_VC,
                    json!({"vcValue": {"name": "alice"}, "options": {"save": false, "id": "custom"}}),
                ),
            )
            .await
            .unwrap();

        match created {
            OperationOutput::Created(created) => {
                assert_eq!(created.metadata.id, "custom");
                assert!(created.metadata.stores.is_empty());
            }
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_create_vp_empty_is_null() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = fake_host("0x1");

        let output = uc
            .execute(&host, &ctx(), op(OP_CREATE_VP, json!({"vcIds": ["missing"]})))
            .await
            .unwrap();
        assert_eq!(output, OperationOutput::Presentation(None));
        assert_eq!(serde_json::to_value(&output).unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_verify_never_fails() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = fake_host("0x1");

        let vc = uc
            .execute(
                &host,
                &ctx(),
                op(OP_VERIFY_VC, json!({"verifiableCredential": "a.b.c"})),
            )
            .await
            .unwrap();
        assert_eq!(vc, OperationOutput::Flag(false));

        let vp = uc
            .execute(
                &host,
                &ctx(),
                op(OP_VERIFY_VP, json!({"verifiablePresentation": {"holder": "did:key:z"}})),
            )
            .await
            .unwrap();
        assert_eq!(vp, OperationOutput::Flag(false));
    }

    #[tokio::test]
    async fn test_resolve_did() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = fake_host("0x1");

        let own = uc
            .execute(&host, &ctx(), op(OP_RESOLVE_DID, Value::Null))
            .await
            .unwrap();
        match own {
            OperationOutput::Resolution(result) => {
                assert_eq!(result.did_document, Some(json!({"id": pkh_did()})))
            }
            _ => panic!("unexpected output"),
        }

        let hedera = uc
            .execute(
                &host,
                &ctx(),
                op(OP_RESOLVE_DID, json!({"did": "did:hedera:testnet:zAbc_0.0.1"})),
            )
            .await
            .unwrap();
        match hedera {
            OperationOutput::Resolution(result) => {
                assert!(result.is_failed());
                assert!(result.did_resolution_metadata["error"].is_string());
            }
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_remove_vcs() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let alice = owned_vc("alice");
        let alice_id = codec::credential_id(&alice).unwrap();
        let _ = uc
            .execute(&host, &ctx(), op(OP_SAVE_VC, json!({"data": alice})))
            .await
            .unwrap();

        let removed = uc
            .execute(
                &host,
                &ctx(),
                op(OP_REMOVE_VC, json!({"id": [alice_id.clone(), "missing"]})),
            )
            .await
            .unwrap();

        match removed {
            OperationOutput::Removed(removed) => {
                assert_eq!(removed.len(), 1);
                assert_eq!(removed[0].id, alice_id);
                assert_eq!(removed[0].stores.get(&StoreName::Local), Some(&true));
            }
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_delete_all_vcs() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let _ = uc
            .execute(&host, &ctx(), op(OP_SAVE_VC, json!({"data": owned_vc("alice")})))
            .await
            .unwrap();

        let cleared = uc
            .execute(&host, &ctx(), op(OP_DELETE_ALL_VCS, Value::Null))
            .await
            .unwrap();
        match cleared {
            OperationOutput::Cleared(stores) => {
                assert_eq!(stores.get(&StoreName::Local), Some(&true))
            }
            _ => panic!("unexpected output"),
        }

        let vcs = uc
            .execute(&host, &ctx(), op(OP_GET_VCS, Value::Null))
            .await
            .unwrap();
        assert_eq!(vcs, OperationOutput::Credentials(vec![]));
    }

    #[tokio::test]
    async fn test_toggle_popups_and_trusted_origins() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());

        let disabled = uc
            .execute(&approving_host(), &ctx(), op(OP_TOGGLE_POPUPS, Value::Null))
            .await
            .unwrap();
        assert_eq!(disabled, OperationOutput::Flag(true));

        // popups are disabled, a rejecting host is never asked
        let saved = uc
            .execute(
                &rejecting_host(),
                &ctx(),
                op(OP_SAVE_VC, json!({"data": owned_vc("alice")})),
            )
            .await;
        assert!(!saved.is_err());

        let enabled = uc
            .execute(&fake_host("0x1"), &ctx(), op(OP_TOGGLE_POPUPS, Value::Null))
            .await
            .unwrap();
        assert_eq!(enabled, OperationOutput::Flag(true));

        let trusted = uc
            .execute(
                &approving_host(),
                &ctx(),
                op(OP_ADD_TRUSTED_ORIGIN, json!({"origin": "https://dapp.example"})),
            )
            .await
            .unwrap();
        assert_eq!(trusted, OperationOutput::Flag(true));

        let saved = uc
            .execute(
                &rejecting_host(),
                &ctx(),
                op(OP_SAVE_VC, json!({"data": owned_vc("bob")})),
            )
            .await;
        assert!(!saved.is_err());

        let removed = uc
            .execute(
                &fake_host("0x1"),
                &ctx(),
                op(OP_REMOVE_TRUSTED_ORIGIN, json!({"origin": "https://dapp.example"})),
            )
            .await
            .unwrap();
        assert_eq!(removed, OperationOutput::Flag(true));
    }

    #[tokio::test]
    async fn test_configure_and_sync_cloud() {
        let repo = MemoryRepo::default();
        let cloud_file = Arc::new(Mutex::new(json!({"from-cloud": owned_vc("bob")}).to_string()));

        let mut cloud = MockFakeCloud::new();
        cloud
            .expect_verify_access_token()
            .returning(|_| Ok("user@example.com".to_string()));

        let reader = cloud_file.clone();
        cloud
            .expect_read_file()
            .returning(move |_, _| Ok(Some(reader.lock().unwrap().clone())));

        let writer = cloud_file.clone();
        cloud.expect_write_file().returning(move |_, _, content| {
            *writer.lock().unwrap() = content;
            Ok(())
        });

        let uc = build_usecase(repo.clone(), cloud);
        let host = approving_host();

        let configured = uc
            .execute(
                &host,
                &ctx(),
                op(OP_CONFIGURE_GOOGLE_ACCOUNT, json!({"accessToken": "token"})),
            )
            .await
            .unwrap();
        assert_eq!(configured, OperationOutput::Flag(true));

        let _ = uc
            .execute(&host, &ctx(), op(OP_SAVE_VC, json!({"data": owned_vc("alice")})))
            .await
            .unwrap();

        let synced = uc
            .execute(&host, &ctx(), op(OP_SYNC_GOOGLE_VCS, Value::Null))
            .await
            .unwrap();
        assert_eq!(synced, OperationOutput::Flag(true));

        let info = uc
            .execute(&host, &ctx(), op(OP_GET_ACCOUNT_INFO, Value::Null))
            .await
            .unwrap();
        match info {
            OperationOutput::Account(summary) => {
                assert_eq!(summary.cloud_email, Some("user@example.com".to_string()));
                assert_eq!(summary.snap_account_address, SNAP_ADDRESS);
            }
            _ => panic!("unexpected output"),
        }

        let both = uc
            .execute(
                &host,
                &ctx(),
                op(OP_GET_VCS, json!({"options": {"store": ["local", "cloud"]}})),
            )
            .await
            .unwrap();
        match both {
            OperationOutput::Credentials(records) => assert_eq!(records.len(), 4),
            _ => panic!("unexpected output"),
        }
    }

    #[tokio::test]
    async fn test_sync_dialog_failure_is_returned() {
        let repo = MemoryRepo::default();

        let mut cloud = MockFakeCloud::new();
        cloud
            .expect_verify_access_token()
            .returning(|_| Ok("user@example.com".to_string()));
        cloud.expect_read_file().returning(|_, _| Ok(None));
        cloud.expect_write_file().times(0);

        let uc = build_usecase(repo.clone(), cloud);
        let host = approving_host();

        let _ = uc
            .execute(
                &host,
                &ctx(),
                op(OP_CONFIGURE_GOOGLE_ACCOUNT, json!({"accessToken": "token"})),
            )
            .await
            .unwrap();
        let _ = uc
            .execute(&host, &ctx(), op(OP_SAVE_VC, json!({"data": owned_vc("alice")})))
            .await
            .unwrap();
        let before = repo.blob();

        let mut timing_out = fake_host("0x1");
        timing_out.expect_show_dialog().returning(|_, panel| {
            if panel.heading.starts_with("Export VCs") {
                return Err(IdentityError::UserRejected(format!(
                    "dialog timed out: {}",
                    panel.heading
                )));
            }

            Ok(DialogResponse::Approved(true))
        });

        let synced = uc
            .execute(&timing_out, &ctx(), op(OP_SYNC_GOOGLE_VCS, Value::Null))
            .await;
        assert!(matches!(
            synced.unwrap_err(),
            IdentityError::UserRejected(_)
        ));
        assert_eq!(repo.blob(), before);
    }

    #[tokio::test]
    async fn test_cloud_unconfigured_is_unavailable() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = approving_host();

        let output = uc
            .execute(
                &host,
                &ctx(),
                op(OP_GET_VCS, json!({"options": {"store": "cloud"}})),
            )
            .await;
        assert!(matches!(
            output.unwrap_err(),
            IdentityError::StorageUnavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_available_methods() {
        let repo = MemoryRepo::default();
        let uc = build_usecase(repo.clone(), MockFakeCloud::new());
        let host = fake_host("0x1");

        let output = uc
            .execute(&host, &ctx(), op(OP_GET_AVAILABLE_METHODS, Value::Null))
            .await
            .unwrap();
        assert_eq!(
            output,
            OperationOutput::Methods(vec!["did:pkh".to_string(), "did:key".to_string()])
        );
    }
}
