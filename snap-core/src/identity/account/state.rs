use std::collections::BTreeMap;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json;

use crate::identity::method::DidMethod;
use crate::identity::types::IdentityError;

use super::account::AccountIdentityState;

pub const STATE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct SnapGlobalConfig {
    pub active_did_method: DidMethod,
    pub popups_disabled: bool,

    #[serde(default)]
    pub trusted_origins: Vec<String>,
}

/// `SnapState` is the whole persisted snap state
///
/// It is always loaded and persisted as a single blob. The accounts are grouped by the
/// normalized chain id first and the lowercased account address second.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct SnapState {
    pub version: u32,
    pub config: SnapGlobalConfig,

    #[serde(default)]
    pub accounts: BTreeMap<String, BTreeMap<String, AccountIdentityState>>,
}

impl Default for SnapState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            config: SnapGlobalConfig::default(),
            accounts: BTreeMap::new(),
        }
    }
}

impl SnapState {
    pub fn from_blob(blob: &[u8]) -> Result<Self, IdentityError> {
        let state: SnapState = serde_json::from_slice(blob)
            .map_err(|err| IdentityError::StateError(err.to_string()))?;

        if state.version != STATE_VERSION {
            return Err(IdentityError::StateError(format!(
                "unknown state version: {}",
                state.version
            )));
        }

        Ok(state)
    }

    pub fn to_blob(&self) -> Result<Vec<u8>, IdentityError> {
        serde_json::to_vec(&self).map_err(|err| IdentityError::StateError(err.to_string()))
    }

    pub fn get_account(&self, network: &str, address: &str) -> Option<&AccountIdentityState> {
        self.accounts
            .get(network)
            .and_then(|accounts| accounts.get(&address.to_lowercase()))
    }

    pub fn get_account_mut(
        &mut self,
        network: &str,
        address: &str,
    ) -> Option<&mut AccountIdentityState> {
        self.accounts
            .get_mut(network)
            .and_then(|accounts| accounts.get_mut(&address.to_lowercase()))
    }

    pub fn insert_account(&mut self, network: &str, address: &str, account: AccountIdentityState) {
        self.accounts
            .entry(network.to_string())
            .or_default()
            .insert(address.to_lowercase(), account);
    }

    /// `find_account_on` looks for an account on the given network by its key address or
    /// by its chain native account id, returning the address it is stored with
    pub fn find_account_on(&self, network: &str, account_id: &str) -> Option<String> {
        let accounts = self.accounts.get(network)?;
        accounts.iter().find_map(|(address, account)| {
            let by_address = account.key_store.address.eq_ignore_ascii_case(account_id);
            let by_native_id = account
                .key_store
                .external_chain_account_id
                .as_ref()
                .map(|id| id == account_id)
                .unwrap_or(false);

            if by_address || by_native_id {
                Some(address.clone())
            } else {
                None
            }
        })
    }

    pub fn is_trusted(&self, origin: &str) -> bool {
        self.config.trusted_origins.iter().any(|trusted| trusted == origin)
    }

    /// `add_trusted_origin` returns `false` when the origin is already trusted
    pub fn add_trusted_origin(&mut self, origin: &str) -> bool {
        if self.is_trusted(origin) {
            return false;
        }

        self.config.trusted_origins.push(origin.to_string());
        true
    }

    pub fn remove_trusted_origin(&mut self, origin: &str) -> bool {
        let before = self.config.trusted_origins.len();
        self.config.trusted_origins.retain(|trusted| trusted != origin);
        before != self.config.trusted_origins.len()
    }
}

/// `CurrentAccount` points to the account record a request is working on
///
/// It's recomputed at the start of every request and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentAccount {
    pub network: String,
    pub address: String,
    pub method: DidMethod,
    pub did: String,
    pub origin: String,
}
