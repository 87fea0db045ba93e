//! `account` is a sub-domain of `identity` which manages the per-(network, address)
//! identity records.
//!
//! This domain has these use cases:
//!
//! - Connect the host account or an external account, deriving or importing its keys
//! - Ensure the `DID` identifier of the active method is registered
//! - Switch the active `DID` method
pub mod keys;
pub mod state;
pub mod types;
pub mod usecase;

mod account;
pub use account::AccountIdentityState;

#[cfg(test)]
pub(crate) use account::tests as fixtures;
