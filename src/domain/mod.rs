//! Domain layer types and invariants.

pub mod documents;
pub mod error;
