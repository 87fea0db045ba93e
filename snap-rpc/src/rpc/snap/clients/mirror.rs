use std::collections::HashMap;

use reqwest::Client;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize};
use rst_common::with_logging::log::debug;

use prople_snap_core::identity::account::types::{ChainAccountInfo, Curve, NetworkLookupBuilder};
use prople_snap_core::identity::network::hedera_network_name;
use prople_snap_core::identity::types::IdentityError;

const KEY_SECP256K1: &str = "ECDSA_SECP256K1";
const KEY_ED25519: &str = "ED25519";

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct MirrorKey {
    #[serde(rename = "_type")]
    typ: String,
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct MirrorAccount {
    account: Option<String>,
    evm_address: Option<String>,
    key: Option<MirrorKey>,
}

impl From<MirrorAccount> for ChainAccountInfo {
    fn from(account: MirrorAccount) -> Self {
        let curve = account.key.as_ref().and_then(|key| match key.typ.as_str() {
            KEY_SECP256K1 => Some(Curve::Secp256k1),
            KEY_ED25519 => Some(Curve::Ed25519),
            _ => None,
        });

        ChainAccountInfo {
            native_account_id: account.account,
            evm_address: account.evm_address,
            public_key: curve.and(account.key.map(|key| key.key)),
            curve,
        }
    }
}

/// `MirrorLookup` asks the `Hedera` mirror nodes about an account, any other network
/// has no metadata service
#[derive(Clone)]
pub struct MirrorLookup {
    client: Client,
    mirrors: HashMap<String, String>,
}

impl MirrorLookup {
    pub fn new(client: Client, mirrors: Vec<(String, String)>) -> Self {
        let mirrors = mirrors
            .into_iter()
            .map(|(network, url)| (network, url.trim_end_matches('/').to_string()))
            .collect();

        Self { client, mirrors }
    }
}

#[async_trait]
impl NetworkLookupBuilder for MirrorLookup {
    async fn get_chain_account_info(
        &self,
        chain_id: &str,
        account: &str,
    ) -> Result<Option<ChainAccountInfo>, IdentityError> {
        let mirror = match hedera_network_name(chain_id).and_then(|name| self.mirrors.get(name)) {
            Some(mirror) => mirror,
            None => return Ok(None),
        };

        let url = format!("{}/api/v1/accounts/{}", mirror, account);
        debug!("mirror lookup: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| IdentityError::NetworkError(err.to_string()))?;

        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(IdentityError::NetworkError(format!(
                "mirror node status {}",
                response.status().as_u16()
            )));
        }

        let account = response
            .json::<MirrorAccount>()
            .await
            .map_err(|err| IdentityError::NetworkError(err.to_string()))?;

        Ok(Some(ChainAccountInfo::from(account)))
    }
}
