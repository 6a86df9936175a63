//! Gazette Query Cache
//!
//! Memoizes backend reads under a time-to-live policy:
//!
//! - Entries are keyed by [`QueryKey`], derived from a query name and every
//!   bound parameter.
//! - A fresh entry (younger than the TTL) is served without touching the
//!   backend; otherwise the read is re-issued and the entry replaced on success.
//! - Concurrent callers for the same key share one in-flight request.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 300
//! max_entries = 512
//! stale_on_error = false
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::QueryKey;
pub use store::QueryCache;
