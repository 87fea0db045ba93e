use std::sync::Arc;
use std::time::Duration;

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info, warn};

use crate::identity::host::{show_dialog_with_timeout, DialogKind, DialogResponse, HostBuilder, Panel};
use crate::identity::method::DidMethod;
use crate::identity::network::{self, is_evm_address, is_native_account_id};
use crate::identity::types::IdentityError;
use crate::identity::verifiable::types::{IdentifierRequest, IdentityAgentBuilder};

use super::keys::{self, KeyMaterial};
use super::state::{CurrentAccount, SnapState};
use super::types::{
    AccountConfig, AccountInfo, AccountUsecaseBuilder, ExternalAccount, Identifier,
    KeyStore, NetworkLookupBuilder, PrivateKeyRef,
};
use super::AccountIdentityState;

/// `Usecase` is the base implementation of the [`AccountUsecaseBuilder`]
///
/// It depends on the identity agent to register the identifiers and on the network
/// lookup to enrich the account with its chain native account id.
pub struct Usecase<TAgent, TLookup>
where
    TAgent: IdentityAgentBuilder,
    TLookup: NetworkLookupBuilder,
{
    agent: Arc<TAgent>,
    lookup: TLookup,
    dialog_timeout: Duration,
}

impl<TAgent, TLookup> Usecase<TAgent, TLookup>
where
    TAgent: IdentityAgentBuilder,
    TLookup: NetworkLookupBuilder,
{
    pub fn new(agent: Arc<TAgent>, lookup: TLookup, dialog_timeout: Duration) -> Self {
        Self {
            agent,
            lookup,
            dialog_timeout,
        }
    }

    async fn private_key_hex(
        &self,
        host: &dyn HostBuilder,
        key_store: &KeyStore,
    ) -> Result<String, IdentityError> {
        match &key_store.private_key_ref {
            PrivateKeyRef::Imported { private_key_hex } => Ok(private_key_hex.clone()),
            PrivateKeyRef::Derived { salt } => {
                let entropy = host.request_entropy(salt).await?;
                let material = keys::derive_from_entropy(&entropy)?;
                Ok(material.private_key_hex)
            }
        }
    }

    async fn derive_host_account(
        &self,
        host: &dyn HostBuilder,
        host_address: &str,
        origin: &str,
    ) -> Result<AccountIdentityState, IdentityError> {
        let entropy = host.request_entropy(host_address).await?;
        let material = keys::derive_from_entropy(&entropy)?;
        let snap_address = material.address.clone().ok_or(IdentityError::AccountError(
            String::from("derived key has no address"),
        ))?;

        debug!(
            "derived snap account {} for host account {}",
            snap_address, host_address
        );

        let key_store = KeyStore {
            curve: material.curve,
            private_key_ref: PrivateKeyRef::Derived {
                salt: host_address.to_string(),
            },
            public_key: material.public_key_hex,
            address: snap_address.clone(),
            external_chain_account_id: None,
        };

        let info = AccountInfo {
            host_account_address: Some(host_address.to_string()),
            snap_account_address: snap_address,
            origin: origin.to_string(),
            external: false,
        };

        Ok(AccountIdentityState::new(
            key_store,
            AccountConfig::default(),
            info,
        ))
    }

    async fn import_external_account(
        &self,
        host: &dyn HostBuilder,
        external: &ExternalAccount,
        origin: &str,
    ) -> Result<AccountIdentityState, IdentityError> {
        let panel = Panel::new("Connect external account")
            .text("Enter the private key of the following account")
            .copyable(external.account_id.clone());

        let response =
            show_dialog_with_timeout(host, DialogKind::Prompt, &panel, self.dialog_timeout).await?;

        let private_key = match response {
            DialogResponse::Text(Some(value)) if !value.trim().is_empty() => value,
            _ => {
                return Err(IdentityError::UserRejected(String::from(
                    "private key not provided",
                )))
            }
        };

        let curve = external.curve.unwrap_or_default();
        let material: KeyMaterial = keys::from_private_key(curve, private_key.trim())?;

        let native_id = if is_native_account_id(&external.account_id) {
            Some(external.account_id.clone())
        } else {
            None
        };

        let address = match (&material.address, native_id.as_ref()) {
            (Some(derived), None) => {
                if !derived.eq_ignore_ascii_case(&external.account_id) {
                    return Err(IdentityError::AccountError(format!(
                        "private key doesn't belong to {}",
                        external.account_id
                    )));
                }
                derived.to_lowercase()
            }
            (Some(derived), Some(_)) => derived.to_lowercase(),
            (None, Some(native)) => native.clone(),
            (None, None) => {
                return Err(IdentityError::AccountError(String::from(
                    "ed25519 accounts must be identified by their native account id",
                )))
            }
        };

        info!("imported external account {}", external.account_id);

        let key_store = KeyStore {
            curve,
            private_key_ref: PrivateKeyRef::Imported {
                private_key_hex: material.private_key_hex,
            },
            public_key: material.public_key_hex,
            address: address.clone(),
            external_chain_account_id: native_id,
        };

        let info = AccountInfo {
            host_account_address: None,
            snap_account_address: address,
            origin: origin.to_string(),
            external: true,
        };

        Ok(AccountIdentityState::new(
            key_store,
            AccountConfig::default(),
            info,
        ))
    }

    /// `enrich_from_network` fills the native account id from the network metadata, the
    /// lookup is mandatory for `did:hedera` only
    async fn enrich_from_network(
        &self,
        network: &str,
        account: &mut AccountIdentityState,
        method: DidMethod,
    ) -> Result<(), IdentityError> {
        if account.key_store.external_chain_account_id.is_some() {
            return Ok(());
        }

        let required = method == DidMethod::Hedera;
        let lookup = self
            .lookup
            .get_chain_account_info(network, &account.key_store.address)
            .await;

        match lookup {
            Ok(Some(chain_info)) => {
                account.key_store.external_chain_account_id = chain_info.native_account_id;
                Ok(())
            }
            Ok(None) if required => Err(IdentityError::NetworkError(format!(
                "account {} not found on network {}",
                account.key_store.address, network
            ))),
            Err(err) if required => Err(err),
            Ok(None) => Ok(()),
            Err(err) => {
                warn!("network lookup failed: {}", err);
                Ok(())
            }
        }
    }

    fn build_did(
        &self,
        network: &str,
        account: &AccountIdentityState,
        method: DidMethod,
    ) -> Result<Option<String>, IdentityError> {
        match method {
            DidMethod::Pkh => {
                if !is_evm_address(&account.key_store.address) {
                    return Err(IdentityError::AccountError(format!(
                        "did:pkh requires an evm address, given {}",
                        account.key_store.address
                    )));
                }

                let chain = network::parse_chain_id(network)?;
                Ok(Some(format!(
                    "did:pkh:eip155:{}:{}",
                    chain,
                    account.key_store.address.to_lowercase()
                )))
            }
            DidMethod::Key => {
                let id = keys::did_key_identifier(
                    account.key_store.curve,
                    &account.key_store.public_key,
                )?;
                Ok(Some(format!("did:key:{}", id)))
            }
            DidMethod::Hedera => {
                if !network::is_hedera_network(network) {
                    return Err(IdentityError::AccountError(format!(
                        "did:hedera is not available on network {}",
                        network
                    )));
                }

                if account.key_store.external_chain_account_id.is_none() {
                    return Err(IdentityError::AccountError(String::from(
                        "did:hedera requires a native account id",
                    )));
                }

                Ok(None)
            }
        }
    }

    async fn ensure_identifier(
        &self,
        host: &dyn HostBuilder,
        network: &str,
        account: &mut AccountIdentityState,
        method: DidMethod,
    ) -> Result<Identifier, IdentityError> {
        if let Some(identifier) = account.identifier_for(method) {
            return Ok(identifier.clone());
        }

        let did = self.build_did(network, account, method)?;
        let private_key_hex = self.private_key_hex(host, &account.key_store).await?;

        let request = IdentifierRequest {
            method,
            did: did.clone(),
            network: network.to_string(),
            chain_account_id: account.key_store.external_chain_account_id.clone(),
            curve: account.key_store.curve,
            public_key: account.key_store.public_key.clone(),
            private_key_hex,
        };

        let identifier = self.agent.create_identifier(request).await?;
        if identifier.provider != method {
            return Err(IdentityError::AgentError(format!(
                "agent registered {} instead of {}",
                identifier.provider, method
            )));
        }

        if let Some(expected) = did {
            if identifier.did != expected {
                return Err(IdentityError::AgentError(format!(
                    "agent registered unexpected identifier: {}",
                    identifier.did
                )));
            }
        }

        info!("registered identifier {}", identifier.did);
        account.add_identifier(identifier.clone());
        Ok(identifier)
    }
}

#[async_trait]
impl<TAgent, TLookup> AccountUsecaseBuilder for Usecase<TAgent, TLookup>
where
    TAgent: IdentityAgentBuilder,
    TLookup: NetworkLookupBuilder,
{
    async fn connect_account(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
        origin: &str,
        external: Option<&ExternalAccount>,
    ) -> Result<CurrentAccount, IdentityError> {
        let network = network::normalize_chain_id(&host.get_active_chain_id().await?)?;
        let method = match state.config.active_did_method {
            DidMethod::Hedera if !network::is_hedera_network(&network) => {
                warn!("did:hedera is not available on {}, using did:pkh", network);
                DidMethod::Pkh
            }
            configured => configured,
        };

        let (address, mut account) = match external {
            None => {
                let host_address = host.get_connected_account_address().await?.to_lowercase();
                match state.get_account(&network, &host_address) {
                    Some(account) => (host_address, account.clone()),
                    None => {
                        let account = self.derive_host_account(host, &host_address, origin).await?;
                        (host_address, account)
                    }
                }
            }
            Some(external) => match state.find_account_on(&network, &external.account_id) {
                Some(address) => {
                    let account = state
                        .get_account(&network, &address)
                        .cloned()
                        .ok_or(IdentityError::StateError(format!(
                            "missing account record: {}",
                            address
                        )))?;

                    if let Some(curve) = external.curve {
                        if curve != account.key_store.curve {
                            return Err(IdentityError::CurveMismatch {
                                expected: account.key_store.curve.as_str().to_string(),
                                given: curve.as_str().to_string(),
                            });
                        }
                    }

                    (address, account)
                }
                None => {
                    let account = self.import_external_account(host, external, origin).await?;
                    (external.account_id.to_lowercase(), account)
                }
            },
        };

        self.enrich_from_network(&network, &mut account, method).await?;
        let identifier = self
            .ensure_identifier(host, &network, &mut account, method)
            .await?;

        account.account_config.did_method = method;
        state.insert_account(&network, &address, account);

        Ok(CurrentAccount {
            network,
            address,
            method,
            did: identifier.did,
            origin: origin.to_string(),
        })
    }

    async fn switch_method(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
        current: &CurrentAccount,
        method: DidMethod,
    ) -> Result<CurrentAccount, IdentityError> {
        if current.method == method {
            state.config.active_did_method = method;
            return Ok(current.clone());
        }

        let mut account = state
            .get_account(&current.network, &current.address)
            .cloned()
            .ok_or(IdentityError::StateError(format!(
                "missing account record: {}",
                current.address
            )))?;

        self.enrich_from_network(&current.network, &mut account, method)
            .await?;
        let identifier = self
            .ensure_identifier(host, &current.network, &mut account, method)
            .await?;

        account.account_config.did_method = method;
        state.config.active_did_method = method;
        state.insert_account(&current.network, &current.address, account);

        info!("switched did method from {} to {}", current.method, method);
        Ok(CurrentAccount {
            method,
            did: identifier.did,
            ..current.clone()
        })
    }
}
