//! `clients` are the HTTP implementations of the collaborators the snap core needs
//! but never talks to directly
use std::time::Duration;

use reqwest::{Client, Response};

use rst_common::standard::serde_json::Value;

use prople_snap_core::identity::types::IdentityError;

use crate::common::types::CommonError;

mod agent;
pub use agent::AgentClient;

mod resolver;
pub use resolver::UniversalResolver;

mod mirror;
pub use mirror::MirrorLookup;

mod drive;
pub use drive::GoogleDrive;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// `build_http_client` sets the defaults shared by every client: a request timeout
/// and the user agent
pub fn build_http_client() -> Result<Client, CommonError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(format!("prople-snap/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| CommonError::InternalError(err.to_string()))
}

/// `read_json` fails on any non success status, keeping the body in the error message
pub(crate) async fn read_json(
    response: Response,
    on_error: impl Fn(String) -> IdentityError,
) -> Result<Value, IdentityError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(on_error(format!("status {}: {}", status.as_u16(), body)));
    }

    response
        .json::<Value>()
        .await
        .map_err(|err| on_error(err.to_string()))
}
