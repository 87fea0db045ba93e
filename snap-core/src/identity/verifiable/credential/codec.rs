use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json_path::JsonPath;
use sha2::{Digest, Sha256};

use rst_common::standard::serde_json::{self, Value};

use super::types::{QueryFilter, StoreError};

/// `decode_jwt` decodes the claims of a compact `JWT`, the signature is not checked
pub fn decode_jwt(token: &str) -> Option<Value> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }

    let payload = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// `claims_of` gives the filterable form of a stored payload. A `JWT` string is decoded
/// into its claims, a string that can't be decoded is kept as it is
pub fn claims_of(data: &Value) -> Value {
    match data {
        Value::String(token) => decode_jwt(token).unwrap_or(data.clone()),
        _ => data.clone(),
    }
}

fn credential_body(claims: &Value) -> &Value {
    match claims.get("vc") {
        Some(vc) if vc.is_object() => vc,
        _ => claims,
    }
}

/// `subject_id` reads the subject `DID` of a credential
pub fn subject_id(claims: &Value) -> Option<String> {
    let from_subject = |value: &Value| -> Option<String> {
        match value.get("credentialSubject")? {
            Value::Object(subject) => subject.get("id")?.as_str().map(String::from),
            Value::Array(subjects) => subjects
                .first()?
                .get("id")?
                .as_str()
                .map(String::from),
            _ => None,
        }
    };

    from_subject(claims)
        .or_else(|| claims.get("vc").and_then(from_subject))
        .or_else(|| claims.get("sub")?.as_str().map(String::from))
}

pub fn credential_types(claims: &Value) -> Vec<String> {
    match credential_body(claims).get("type") {
        Some(Value::String(typ)) => vec![typ.clone()],
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(|typ| typ.as_str().map(String::from))
            .collect(),
        _ => vec![],
    }
}

/// `credential_id` is the hex encoded sha256 of the serialized payload, the same
/// content always gives the same id
pub fn credential_id(data: &Value) -> Result<String, StoreError> {
    let serialized =
        serde_json::to_string(data).map_err(|err| StoreError::CodecError(err.to_string()))?;
    Ok(hex::encode(Sha256::digest(serialized.as_bytes())))
}

pub fn parse_path(expr: &str) -> Result<JsonPath, StoreError> {
    JsonPath::parse(expr).map_err(|err| StoreError::InvalidFilter(err.to_string()))
}

/// `RecordFilter` is a [`QueryFilter`] ready to be applied, a `JSONPath` expression is
/// parsed once when the filter is built
pub enum RecordFilter<'a> {
    All,
    Id(&'a str),
    Type(&'a str),
    Path(JsonPath),
}

impl<'a> RecordFilter<'a> {
    pub fn compile(filter: &'a QueryFilter) -> Result<Self, StoreError> {
        match filter {
            QueryFilter::None => Ok(RecordFilter::All),
            QueryFilter::ById(expected) => Ok(RecordFilter::Id(expected)),
            QueryFilter::ByType(expected) => Ok(RecordFilter::Type(expected)),
            QueryFilter::ByPath(expr) => parse_path(expr).map(RecordFilter::Path),
        }
    }

    pub fn matches(&self, id: &str, claims: &Value) -> bool {
        match self {
            RecordFilter::All => true,
            RecordFilter::Id(expected) => id == *expected,
            RecordFilter::Type(expected) => credential_types(claims)
                .iter()
                .any(|typ| typ == expected),
            RecordFilter::Path(path) => !path.query(claims).all().is_empty(),
        }
    }
}
