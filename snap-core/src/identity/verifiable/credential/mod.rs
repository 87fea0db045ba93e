//! `credential` manages the `VC (Verifiable Credential)` storage
//!
//! The credentials live in one or more [`types::CredentialStore`] implementations,
//! dispatched by the [`CredentialManager`].
pub mod codec;
pub mod types;

mod builder;
pub use builder::{one_year_after, to_iso_string, UnsignedCredential, DEFAULT_VC_KEY};

pub mod cloud;
pub mod local;

mod manager;
pub use manager::CredentialManager;
