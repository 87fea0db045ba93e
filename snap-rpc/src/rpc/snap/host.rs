use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info};

use sha2::{Digest, Sha256};

use prople_snap_core::identity::host::{DialogKind, DialogResponse, HostBuilder, Panel};
use prople_snap_core::identity::types::IdentityError;

use crate::config::Snap;

use super::rpc_param::SnapContext;

/// `RequestHost` plays the wallet for a single RPC request
///
/// The connected account and the active chain come from the request context. The
/// entropy is derived from the configured seed, so the same salt always gives the same
/// key material. Nobody is watching the dialogs: confirmations follow the configured
/// policy and prompts are answered with the prompt response carried by the request.
#[derive(Debug, Clone)]
pub struct RequestHost {
    account: String,
    chain_id: String,
    seed: String,
    auto_approve: bool,
    prompt_response: Option<String>,
}

impl RequestHost {
    pub fn new(snap: &Snap, context: &SnapContext, prompt_response: Option<String>) -> Self {
        Self {
            account: context.account.clone(),
            chain_id: context.chain_id.clone(),
            seed: snap.get_entropy_seed(),
            auto_approve: snap.get_dialog_auto_approve(),
            prompt_response,
        }
    }
}

#[async_trait]
impl HostBuilder for RequestHost {
    async fn get_connected_account_address(&self) -> Result<String, IdentityError> {
        Ok(self.account.clone())
    }

    async fn get_active_chain_id(&self) -> Result<String, IdentityError> {
        Ok(self.chain_id.clone())
    }

    async fn request_entropy(&self, salt: &str) -> Result<String, IdentityError> {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", self.seed, salt).as_bytes());
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }

    async fn show_dialog(
        &self,
        kind: DialogKind,
        content: &Panel,
    ) -> Result<DialogResponse, IdentityError> {
        debug!("dialog [{}] requested: {:?}", content.heading, kind);

        let response = match kind {
            DialogKind::Confirmation => DialogResponse::Approved(self.auto_approve),
            DialogKind::Prompt => DialogResponse::Text(self.prompt_response.clone()),
            DialogKind::Alert => DialogResponse::Approved(true),
        };

        info!("dialog [{}] answered by policy", content.heading);
        Ok(response)
    }
}
