use std::time::Duration;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::with_logging::log::warn;
use rst_common::with_tokio::tokio;

use super::types::IdentityError;

/// `DialogKind` tells the host which kind of dialog should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum DialogKind {
    Confirmation,
    Prompt,
    Alert,
}

/// `DialogResponse` is the resolved value of a host dialog, a boolean for the
/// confirmations and an optional text for the prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(untagged)]
pub enum DialogResponse {
    Approved(bool),
    Text(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PanelItem {
    Heading(String),
    Text(String),
    Copyable(String),
    Divider,
}

/// `Panel` is the content of a dialog. The host is free to render it however it wants
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct Panel {
    pub heading: String,
    pub items: Vec<PanelItem>,
}

impl Panel {
    pub fn new(heading: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            items: Vec::new(),
        }
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.items.push(PanelItem::Text(value.into()));
        self
    }

    pub fn subheading(mut self, value: impl Into<String>) -> Self {
        self.items.push(PanelItem::Heading(value.into()));
        self
    }

    pub fn copyable(mut self, value: impl Into<String>) -> Self {
        self.items.push(PanelItem::Copyable(value.into()));
        self
    }

    pub fn divider(mut self) -> Self {
        self.items.push(PanelItem::Divider);
        self
    }
}

/// `HostBuilder` is the wallet runtime hosting the snap
///
/// The host knows the connected account and the active chain, owns the entropy
/// used to derive the snap keys and renders the dialogs.
#[async_trait]
pub trait HostBuilder: Send + Sync {
    async fn get_connected_account_address(&self) -> Result<String, IdentityError>;
    async fn get_active_chain_id(&self) -> Result<String, IdentityError>;

    /// `request_entropy` returns a hex encoded seed, always the same for the same salt
    async fn request_entropy(&self, salt: &str) -> Result<String, IdentityError>;

    async fn show_dialog(
        &self,
        kind: DialogKind,
        content: &Panel,
    ) -> Result<DialogResponse, IdentityError>;
}

/// `StateRepoBuilder` persists the whole snap state blob
#[async_trait]
pub trait StateRepoBuilder: Send + Sync {
    async fn load_state(&self) -> Result<Option<Vec<u8>>, IdentityError>;
    async fn persist_state(&self, blob: Vec<u8>) -> Result<(), IdentityError>;
}

/// `show_dialog_with_timeout` renders a dialog and rejects it when the user doesn't
/// answer in time
pub async fn show_dialog_with_timeout(
    host: &dyn HostBuilder,
    kind: DialogKind,
    content: &Panel,
    timeout: Duration,
) -> Result<DialogResponse, IdentityError> {
    match tokio::time::timeout(timeout, host.show_dialog(kind, content)).await {
        Ok(response) => response,
        Err(_) => {
            warn!("dialog [{}] timed out after {:?}", content.heading, timeout);
            Err(IdentityError::UserRejected(format!(
                "dialog timed out: {}",
                content.heading
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rst_common::standard::serde_json;

    #[test]
    fn test_panel_builder() {
        let panel = Panel::new("Save VC")
            .text("Would you like to save the following VC?")
            .divider()
            .copyable("{}");

        assert_eq!(panel.heading, "Save VC");
        assert_eq!(panel.items.len(), 3);
        assert_eq!(panel.items[1], PanelItem::Divider);
    }

    #[test]
    fn test_dialog_response_from_json() {
        let approved: DialogResponse = serde_json::from_str("true").unwrap();
        assert_eq!(approved, DialogResponse::Approved(true));

        let text: DialogResponse = serde_json::from_str(r#""0xabc""#).unwrap();
        assert_eq!(text, DialogResponse::Text(Some("0xabc".to_string())));
    }

    struct SlowHost;

    #[async_trait]
    impl HostBuilder for SlowHost {
        async fn get_connected_account_address(&self) -> Result<String, IdentityError> {
            Ok("0x01".to_string())
        }

        async fn get_active_chain_id(&self) -> Result<String, IdentityError> {
            Ok("0x1".to_string())
        }

        async fn request_entropy(&self, _salt: &str) -> Result<String, IdentityError> {
            Ok("0x01".to_string())
        }

        async fn show_dialog(
            &self,
            _kind: DialogKind,
            _content: &Panel,
        ) -> Result<DialogResponse, IdentityError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(DialogResponse::Approved(true))
        }
    }

    #[tokio::test]
    async fn test_dialog_timeout_rejects() {
        let panel = Panel::new("Delete VCs");
        let response = show_dialog_with_timeout(
            &SlowHost,
            DialogKind::Confirmation,
            &panel,
            Duration::from_millis(10),
        )
        .await;

        assert!(response.is_err());
        assert!(matches!(
            response.unwrap_err(),
            IdentityError::UserRejected(_)
        ))
    }
}
