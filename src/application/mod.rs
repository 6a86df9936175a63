//! Content retrieval services: cached client, aggregate loader and lookups.

pub mod catalog;
pub mod client;
pub mod error;
pub mod kinds;
pub mod loader;
pub mod navigation;
pub mod preview;
pub mod queries;
pub mod source;
pub mod state;
