//! `identity` is the main domain of the snap, it manages identities following the
//! `SSI (Self Sovereign Identity)` framework based on the `DID Framework`
//!
//! The domain has three sub-domains in it:
//!
//! - `account`
//! - `verifiable`
//! - `operations`
//!
//! ---
//!
//! The `account` sub-domain maintains the per-(network, address) identity record. Each
//! record knows its key material, the active `DID` method, the registered `DID` identifiers
//! and the credentials saved locally. The record is switched between the supported methods:
//!
//! - `did:pkh`
//! - `did:key`
//! - `did:hedera`
//!
//! Switching a method never touches saved credentials, it only changes which of them are
//! visible, a credential is always bound to the subject identifier it was issued for.
//!
//! ---
//!
//! The `verifiable` sub-domain manages the `VC (Verifiable Credential)` storage through
//! multiple backends (`local` and `cloud`) and builds the unsigned `VC` and `VP` payloads.
//! All cryptographic work, signing and verifying, happens in an external identity agent
//! that is only reachable through [`verifiable::types::IdentityAgentBuilder`]
//!
//! ---
//!
//! The `operations` sub-domain is the facade used by the RPC layer. Every request goes
//! through the same steps: validate the params, load the state, connect the active
//! account, ask for the user confirmation and then persist the state if it was changed.
pub mod types;

pub mod host;
pub mod method;
pub mod network;

pub mod account;
pub mod operations;
pub mod verifiable;
