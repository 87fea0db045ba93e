pub mod types;

pub mod credential;
pub mod presentation;
