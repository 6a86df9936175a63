//! Cache configuration.
//!
//! Controls the query cache via the `[cache]` section of `gazette.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

// Default values for cache configuration
const DEFAULT_TTL_SECS: u64 = 5 * 60;
const DEFAULT_MAX_ENTRIES: usize = 512;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve reads from the cache. When off, every read reaches the backend.
    pub enabled: bool,
    /// Maximum age of an entry before it is refetched.
    pub ttl: Duration,
    /// Maximum number of entries kept; least recently used are evicted first.
    pub max_entries: usize,
    /// On a failed refetch, serve the last good entry even if it expired.
    pub stale_on_error: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
            stale_on_error: false,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: settings.ttl,
            max_entries: settings.max_entries.get(),
            stale_on_error: settings.stale_on_error,
        }
    }
}

impl CacheConfig {
    /// Returns the entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
