//! Gazette: the content retrieval and caching layer of the editorial site.
//!
//! - [`cache`]: TTL query cache with in-flight request coalescing.
//! - [`application`]: aggregate loader, draft/publish resolution, content
//!   catalogue and the new-content navigation badge.
//! - [`infra`]: HTTP backend adapter, telemetry and infrastructure errors.
//! - [`config`]: layered settings (file, environment, CLI).

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
