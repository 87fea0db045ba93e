use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, Value};

use crate::identity::account::types::{Curve, Identifier};
use crate::identity::method::DidMethod;
use crate::identity::types::IdentityError;

pub const VC_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const VC_TYPE: &str = "VerifiableCredential";
pub const VP_TYPE: &str = "VerifiablePresentation";
pub const VP_CUSTOM_TYPE: &str = "Custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum ProofFormat {
    #[default]
    Jwt,
    Lds,
    #[serde(rename = "EthereumEip712Signature2021")]
    Eip712,
}

/// `ProofInfo` describes how a presentation should be proved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ProofInfo {
    #[serde(default)]
    pub proof_format: Option<ProofFormat>,

    #[serde(rename = "type", default)]
    pub typ: Option<String>,

    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default)]
    pub challenge: Option<String>,
}

/// `SignerContext` tells the agent which identifier and key should sign a payload
#[derive(Debug, Clone, PartialEq)]
pub struct SignerContext {
    pub did: String,
    pub controller_key_id: String,
}

impl From<&Identifier> for SignerContext {
    fn from(identifier: &Identifier) -> Self {
        Self {
            did: identifier.did.clone(),
            controller_key_id: identifier.controller_key_id.clone(),
        }
    }
}

/// `IdentifierRequest` carries everything the agent needs to register an identifier
///
/// When `did` is filled the identifier is already known and only imported into the agent,
/// otherwise the agent creates it, which is the case of `did:hedera`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierRequest {
    pub method: DidMethod,
    pub did: Option<String>,
    pub network: String,
    pub chain_account_id: Option<String>,
    pub curve: Curve,
    pub public_key: String,
    pub private_key_hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(crate = "self::serde")]
pub struct VerificationResult {
    pub verified: bool,

    #[serde(default)]
    pub error: Option<String>,
}

/// `ResolutionResult` is the `DID Resolution` output
///
/// A failed resolution is still a result, with the error stored in the
/// `didResolutionMetadata` and a `null` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    #[serde(default)]
    pub did_document: Option<Value>,

    #[serde(default)]
    pub did_resolution_metadata: Value,

    #[serde(default)]
    pub did_document_metadata: Value,
}

impl ResolutionResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            did_document: None,
            did_resolution_metadata: serde_json::json!({ "error": error.into() }),
            did_document_metadata: serde_json::json!({}),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.did_document.is_none()
    }
}

/// `IdentityAgentBuilder` is the external identity agent, the only place where
/// identifiers are registered and payloads are signed or verified
#[async_trait]
pub trait IdentityAgentBuilder: Send + Sync {
    async fn create_identifier(&self, request: IdentifierRequest) -> Result<Identifier, IdentityError>;
    async fn resolve_identifier(&self, did: &str) -> Result<ResolutionResult, IdentityError>;

    /// `sign_credential` returns the signed credential, a compact `JWT` string value
    /// for the `jwt` proof format or a `JSON-LD` object for the others
    async fn sign_credential(
        &self,
        signer: &SignerContext,
        credential: Value,
        proof_format: ProofFormat,
    ) -> Result<Value, IdentityError>;

    async fn verify_credential(&self, credential: Value) -> Result<VerificationResult, IdentityError>;

    async fn sign_presentation(
        &self,
        signer: &SignerContext,
        presentation: Value,
        proof: ProofInfo,
    ) -> Result<Value, IdentityError>;

    async fn verify_presentation(
        &self,
        presentation: Value,
    ) -> Result<VerificationResult, IdentityError>;
}

/// `ResolverBuilder` is the universal resolver used for every method the agent
/// doesn't resolve by itself
#[async_trait]
pub trait ResolverBuilder: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<ResolutionResult, IdentityError>;
}
