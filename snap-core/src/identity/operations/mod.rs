//! `operations` is the facade of the identity domain
//!
//! Each request is modelled as an [`types::Operation`] and executed by
//! [`types::OperationsUsecaseBuilder`], user approvals are asked through the
//! [`confirm::Confirmer`].
pub mod confirm;
pub mod types;

mod usecase;
pub use usecase::Usecase;
