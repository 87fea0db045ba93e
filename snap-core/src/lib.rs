//! `prople-snap-core` holds the business logic of the prople snap identity agent.
//!
//! The crate doesn't talk to any concrete wallet, database or network. Every outside
//! capability is modelled as a trait (`*Builder`) and injected by the caller, the
//! `prople-snap-rpc` crate provides the production implementations.
pub mod identity;
