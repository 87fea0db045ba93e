use reqwest::Client;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::debug;

use prople_snap_core::identity::account::types::Identifier;
use prople_snap_core::identity::types::IdentityError;
use prople_snap_core::identity::verifiable::types::{
    IdentifierRequest, IdentityAgentBuilder, ProofFormat, ProofInfo, ResolutionResult,
    SignerContext, VerificationResult,
};

use super::read_json;

const KMS_LOCAL: &str = "local";

/// `AgentClient` talks to a remote identity agent exposing its methods as
/// `POST {base}/agent/{method}`
#[derive(Clone)]
pub struct AgentClient {
    client: Client,
    base: String,
}

impl AgentClient {
    pub fn new(client: Client, base: String) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, IdentityError> {
        let url = format!("{}/agent/{}", self.base, method);
        debug!("agent call: {}", url);

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|err| IdentityError::AgentError(err.to_string()))?;

        read_json(response, |msg| {
            IdentityError::AgentError(format!("{}: {}", method, msg))
        })
        .await
    }

    fn to_identifier(value: Value) -> Result<Identifier, IdentityError> {
        serde_json::from_value(value)
            .map_err(|err| IdentityError::AgentError(format!("invalid identifier: {}", err)))
    }

    /// `proof_output` returns the compact token for `JWT` proofs, the whole document otherwise
    fn proof_output(signed: Value, format: ProofFormat) -> Result<Value, IdentityError> {
        if format != ProofFormat::Jwt {
            return Ok(signed);
        }

        signed
            .get("proof")
            .and_then(|proof| proof.get("jwt"))
            .cloned()
            .ok_or(IdentityError::AgentError(String::from(
                "signed payload without jwt proof",
            )))
    }

    fn to_verification(value: Value) -> VerificationResult {
        let verified = value
            .get("verified")
            .and_then(|verified| verified.as_bool())
            .unwrap_or(false);

        let error = value.get("error").and_then(|err| match err {
            Value::Null => None,
            Value::String(msg) => Some(msg.clone()),
            other => other
                .get("message")
                .and_then(|msg| msg.as_str())
                .map(|msg| msg.to_string())
                .or(Some(other.to_string())),
        });

        VerificationResult { verified, error }
    }
}

#[async_trait]
impl IdentityAgentBuilder for AgentClient {
    async fn create_identifier(
        &self,
        request: IdentifierRequest,
    ) -> Result<Identifier, IdentityError> {
        let key_type = request.curve.as_str();

        let output = match &request.did {
            Some(did) => {
                let body = json!({
                    "did": did,
                    "provider": request.method.to_string(),
                    "controllerKeyId": request.public_key,
                    "keys": [{
                        "kid": request.public_key,
                        "type": key_type,
                        "kms": KMS_LOCAL,
                        "publicKeyHex": request.public_key,
                        "privateKeyHex": request.private_key_hex,
                    }],
                    "services": [],
                });

                self.call("didManagerImport", body).await?
            }
            None => {
                let body = json!({
                    "provider": request.method.to_string(),
                    "kms": KMS_LOCAL,
                    "options": {
                        "network": request.network,
                        "accountId": request.chain_account_id,
                        "keyType": key_type,
                        "privateKeyHex": request.private_key_hex,
                    },
                });

                self.call("didManagerCreate", body).await?
            }
        };

        Self::to_identifier(output)
    }

    async fn resolve_identifier(&self, did: &str) -> Result<ResolutionResult, IdentityError> {
        let output = self.call("resolveDid", json!({ "didUrl": did })).await?;
        serde_json::from_value(output)
            .map_err(|err| IdentityError::AgentError(format!("invalid resolution: {}", err)))
    }

    async fn sign_credential(
        &self,
        signer: &SignerContext,
        credential: Value,
        proof_format: ProofFormat,
    ) -> Result<Value, IdentityError> {
        let body = json!({
            "credential": credential,
            "proofFormat": proof_format,
            "keyRef": signer.controller_key_id,
            "save": false,
            "fetchRemoteContexts": true,
        });

        let signed = self.call("createVerifiableCredential", body).await?;
        Self::proof_output(signed, proof_format)
    }

    async fn verify_credential(&self, credential: Value) -> Result<VerificationResult, IdentityError> {
        let output = self
            .call(
                "verifyCredential",
                json!({ "credential": credential, "fetchRemoteContexts": true }),
            )
            .await?;

        Ok(Self::to_verification(output))
    }

    async fn sign_presentation(
        &self,
        signer: &SignerContext,
        presentation: Value,
        proof: ProofInfo,
    ) -> Result<Value, IdentityError> {
        let proof_format = proof.proof_format.unwrap_or_default();
        let body = json!({
            "presentation": presentation,
            "proofFormat": proof_format,
            "keyRef": signer.controller_key_id,
            "domain": proof.domain,
            "challenge": proof.challenge,
            "save": false,
            "fetchRemoteContexts": true,
        });

        let signed = self.call("createVerifiablePresentation", body).await?;
        Self::proof_output(signed, proof_format)
    }

    async fn verify_presentation(
        &self,
        presentation: Value,
    ) -> Result<VerificationResult, IdentityError> {
        let output = self
            .call(
                "verifyPresentation",
                json!({ "presentation": presentation, "fetchRemoteContexts": true }),
            )
            .await?;

        Ok(Self::to_verification(output))
    }
}
