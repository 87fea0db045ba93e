use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};

use crate::identity::host::HostBuilder;
use crate::identity::method::DidMethod;
use crate::identity::types::IdentityError;

use super::state::{CurrentAccount, SnapState};

/// `Curve` is the key algorithm of the account key material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(crate = "self::serde")]
pub enum Curve {
    #[default]
    Secp256k1,
    Ed25519,
}

impl Curve {
    pub fn as_str(&self) -> &'static str {
        match self {
            Curve::Secp256k1 => "Secp256k1",
            Curve::Ed25519 => "Ed25519",
        }
    }
}

/// `PrivateKeyRef` tells where the private key of an account lives
///
/// A `Derived` key is never stored, it is derived again from the host entropy
/// salted with the host account address whenever it's needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PrivateKeyRef {
    Derived {
        salt: String,
    },
    #[serde(rename_all = "camelCase")]
    Imported {
        private_key_hex: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct KeyStore {
    pub curve: Curve,
    pub private_key_ref: PrivateKeyRef,
    pub public_key: String,
    pub address: String,

    #[serde(default)]
    pub external_chain_account_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,

    #[serde(rename = "type")]
    pub typ: String,
    pub service_endpoint: String,
}

/// `Identifier` is the `DID` registered through the identity agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub did: String,
    pub controller_key_id: String,
    pub provider: DidMethod,

    #[serde(default)]
    pub services: Vec<Service>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct CloudCredentials {
    pub access_token: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct AccountConfig {
    pub did_method: DidMethod,

    #[serde(default)]
    pub cloud: Option<CloudCredentials>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub host_account_address: Option<String>,
    pub snap_account_address: String,
    pub origin: String,
    pub external: bool,
}

/// `ExternalAccount` describes an account that is not managed by the host wallet,
/// identified by an `EVM` address or a chain native account id (`0.0.N`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ExternalAccount {
    pub account_id: String,

    #[serde(default)]
    pub curve: Option<Curve>,
}

/// `ChainAccountInfo` is the account metadata fetched from the network
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ChainAccountInfo {
    pub native_account_id: Option<String>,
    pub evm_address: Option<String>,
    pub public_key: Option<String>,
    pub curve: Option<Curve>,
}

/// `NetworkLookupBuilder` fetches account metadata from the chain the account lives on
///
/// An `Ok(None)` means the network doesn't know anything about the account, or the
/// network has no metadata service at all.
#[async_trait]
pub trait NetworkLookupBuilder: Send + Sync {
    async fn get_chain_account_info(
        &self,
        chain_id: &str,
        account: &str,
    ) -> Result<Option<ChainAccountInfo>, IdentityError>;
}

/// `AccountUsecaseBuilder` resolves and maintains the active account of a request
///
/// Both operations only mutate the given state, persisting it is up to the caller.
#[async_trait]
pub trait AccountUsecaseBuilder: Send + Sync {
    async fn connect_account(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
        origin: &str,
        external: Option<&ExternalAccount>,
    ) -> Result<CurrentAccount, IdentityError>;

    /// `switch_method` registers the identifier of the new method before activating it,
    /// switching to the active method is a no-op
    async fn switch_method(
        &self,
        host: &dyn HostBuilder,
        state: &mut SnapState,
        current: &CurrentAccount,
        method: DidMethod,
    ) -> Result<CurrentAccount, IdentityError>;
}
