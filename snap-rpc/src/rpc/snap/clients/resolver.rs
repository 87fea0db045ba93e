use reqwest::Client;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::{debug, warn};

use prople_snap_core::identity::types::IdentityError;
use prople_snap_core::identity::verifiable::types::{ResolutionResult, ResolverBuilder};

/// `UniversalResolver` resolves identifiers through a `DIF Universal Resolver` instance,
/// `GET {base}/1.0/identifiers/{did}`
#[derive(Clone)]
pub struct UniversalResolver {
    client: Client,
    base: String,
}

impl UniversalResolver {
    pub fn new(client: Client, base: String) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `parse` accepts both a full resolution result and a bare `DID Document`
    fn parse(body: Value) -> ResolutionResult {
        if body.get("didDocument").is_some() || body.get("didResolutionMetadata").is_some() {
            if let Ok(result) = serde_json::from_value::<ResolutionResult>(body.clone()) {
                return result;
            }
        }

        if body.get("id").is_some() {
            return ResolutionResult {
                did_document: Some(body),
                did_resolution_metadata: json!({}),
                did_document_metadata: json!({}),
            };
        }

        ResolutionResult::failed("invalidDidDocument")
    }
}

#[async_trait]
impl ResolverBuilder for UniversalResolver {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError> {
        let url = format!("{}/1.0/identifiers/{}", self.base, did);
        debug!("resolving: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("resolver unreachable: {}", err);
                return Ok(ResolutionResult::failed(err.to_string()));
            }
        };

        let status = response.status();
        let body = response.json::<Value>().await;
        match body {
            Ok(body) => {
                let result = Self::parse(body);
                if !status.is_success() && !result.is_failed() {
                    return Ok(ResolutionResult::failed(format!(
                        "status {}",
                        status.as_u16()
                    )));
                }
                Ok(result)
            }
            Err(_) if status.as_u16() == 404 => Ok(ResolutionResult::failed("notFound")),
            Err(err) => Ok(ResolutionResult::failed(err.to_string())),
        }
    }
}
