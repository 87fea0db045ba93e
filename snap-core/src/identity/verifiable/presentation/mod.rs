//! `presentation` builds the unsigned `VP (Verifiable Presentation)` from the selected
//! credentials, the proof itself is generated by the identity agent
mod builder;
pub use builder::UnsignedPresentation;
