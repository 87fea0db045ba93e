use std::time::Duration;

use rst_common::standard::serde_json::{self, Value};
use rst_common::with_logging::log::{debug, info};

use crate::identity::host::{show_dialog_with_timeout, DialogKind, DialogResponse, HostBuilder, Panel};
use crate::identity::types::IdentityError;

/// `Confirmer` asks the user to approve an operation before anything is mutated
#[derive(Debug, Clone)]
pub struct Confirmer {
    timeout: Duration,
}

impl Confirmer {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// `approve` always renders the dialog, an unanswered dialog is rejected
    pub async fn approve(&self, host: &dyn HostBuilder, panel: &Panel) -> Result<bool, IdentityError> {
        let response =
            show_dialog_with_timeout(host, DialogKind::Confirmation, panel, self.timeout).await?;

        let approved = matches!(response, DialogResponse::Approved(true));
        info!("dialog [{}] approved: {}", panel.heading, approved);
        Ok(approved)
    }

    /// `require` fails with [`IdentityError::UserRejected`] unless the user approves, the
    /// dialog is skipped when `bypass` is set
    pub async fn require(
        &self,
        host: &dyn HostBuilder,
        bypass: bool,
        panel: &Panel,
    ) -> Result<(), IdentityError> {
        if bypass {
            debug!("dialog [{}] skipped", panel.heading);
            return Ok(());
        }

        if !self.approve(host, panel).await? {
            return Err(IdentityError::UserRejected(panel.heading.clone()));
        }

        Ok(())
    }
}

/// `pretty` renders a payload for the dialogs, a `JWT` string is shown as it is
pub fn pretty(value: &Value) -> String {
    match value {
        Value::String(raw) => raw.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or(other.to_string()),
    }
}
