use std::collections::BTreeMap;

use indexmap::IndexMap;

use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use rstdev_domain::entity::ToJSON;
use rstdev_domain::BaseError;

use crate::identity::method::DidMethod;

use super::keys;
use super::types::{AccountConfig, AccountInfo, Identifier, KeyStore};

/// `AccountIdentityState` is the identity record of a single (network, address) pair
///
/// The record is created lazily the first time the account is connected and it's
/// never removed. Clearing the credentials only drops the credential entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct AccountIdentityState {
    pub key_store: KeyStore,

    #[serde(default)]
    pub identifiers: BTreeMap<String, Identifier>,

    #[serde(default)]
    pub credentials: IndexMap<String, Value>,

    pub account_config: AccountConfig,
    pub account_info: AccountInfo,
}

impl AccountIdentityState {
    pub fn new(key_store: KeyStore, account_config: AccountConfig, account_info: AccountInfo) -> Self {
        Self {
            key_store,
            identifiers: BTreeMap::new(),
            credentials: IndexMap::new(),
            account_config,
            account_info,
        }
    }

    /// `identifier_for` looks up the registered identifier of the given method
    pub fn identifier_for(&self, method: DidMethod) -> Option<&Identifier> {
        self.identifiers
            .values()
            .find(|identifier| identifier.provider == method)
    }

    pub fn add_identifier(&mut self, identifier: Identifier) {
        self.identifiers.insert(identifier.did.clone(), identifier);
    }

    /// `owner_identifier` computes the value a credential subject must carry to belong
    /// to this account under the given method
    ///
    /// - `did:pkh`: the account address
    /// - `did:key`: the multibase encoded public key
    /// - `did:hedera`: the method specific id of the registered hedera identifier
    pub fn owner_identifier(&self, method: DidMethod) -> Option<String> {
        match method {
            DidMethod::Pkh => Some(self.key_store.address.to_lowercase()),
            DidMethod::Key => {
                keys::did_key_identifier(self.key_store.curve, &self.key_store.public_key).ok()
            }
            DidMethod::Hedera => self
                .identifier_for(DidMethod::Hedera)
                .and_then(|identifier| method.method_specific_id(&identifier.did))
                .map(|id| id.to_string()),
        }
    }

    /// `owns_subject` checks that a subject `DID` belongs to the active method and
    /// resolves to this account
    pub fn owns_subject(&self, method: DidMethod, subject_did: &str) -> bool {
        let owner = match self.owner_identifier(method) {
            Some(owner) => owner,
            None => return false,
        };

        let specific_id = match method.method_specific_id(subject_did) {
            Some(id) => id,
            None => return false,
        };

        match method {
            DidMethod::Pkh => specific_id
                .rsplit(':')
                .next()
                .map(|address| address.eq_ignore_ascii_case(&owner))
                .unwrap_or(false),
            DidMethod::Key | DidMethod::Hedera => specific_id == owner,
        }
    }
}

impl ToJSON for AccountIdentityState {
    fn to_json(&self) -> Result<String, BaseError> {
        let json_str =
            serde_json::to_string(&self).map_err(|err| BaseError::ToJSONError(err.to_string()))?;

        Ok(json_str)
    }
}
