use rst_common::with_errors::thiserror::{self, Error};

/// `IdentityError` is the error taxonomy surfaced to the RPC callers
///
/// Ownership mismatches and missing credentials never show up here, the stores
/// absorb them into empty or `false` results.
#[derive(Debug, PartialEq, Error, Clone)]
pub enum IdentityError {
    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("unsupported did method: {0}")]
    UnsupportedMethod(String),

    #[error("curve mismatch: account registered with {expected}, given {given}")]
    CurveMismatch { expected: String, given: String },

    #[error("user rejected: {0}")]
    UserRejected(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("account error: {0}")]
    AccountError(String),

    #[error("agent error: {0}")]
    AgentError(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("state error: {0}")]
    StateError(String),
}

impl IdentityError {
    /// `kind` gives a stable short name used by the RPC layer when building
    /// the error messages
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityError::InvalidParams(_) => "InvalidParams",
            IdentityError::UnsupportedMethod(_) => "UnsupportedMethod",
            IdentityError::CurveMismatch { .. } => "CurveMismatch",
            IdentityError::UserRejected(_) => "UserRejected",
            IdentityError::StorageUnavailable(_) => "StorageUnavailable",
            IdentityError::AccountError(_) => "AccountError",
            IdentityError::AgentError(_) => "AgentError",
            IdentityError::NetworkError(_) => "NetworkError",
            IdentityError::StateError(_) => "StateError",
        }
    }
}
