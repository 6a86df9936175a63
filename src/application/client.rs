use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::source::{ContentSource, Query, SourceError, decode_value};
use crate::cache::QueryCache;

/// Cache-wrapped query client: one backend channel plus the shared query cache.
#[derive(Clone)]
pub struct ContentClient {
    source: Arc<dyn ContentSource>,
    cache: QueryCache,
}

impl ContentClient {
    pub fn new(source: Arc<dyn ContentSource>, cache: QueryCache) -> Self {
        Self { source, cache }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Cached read decoded into `T`.
    pub async fn fetch_cached<T>(&self, query: Query) -> Result<T, SourceError>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        self.fetch_cached_with(query, decode_value::<T>).await
    }

    /// Cached read with a custom decoder; the decoded value is what gets cached.
    pub async fn fetch_cached_with<T, D>(&self, query: Query, decode: D) -> Result<T, SourceError>
    where
        T: Clone + Send + Sync + 'static,
        D: FnOnce(Value) -> Result<T, SourceError> + Send + 'static,
    {
        let key = query.cache_key();
        let source = Arc::clone(&self.source);
        self.cache
            .fetch_cached(&key, move || async move {
                let value = source.fetch(&query).await?;
                decode(value)
            })
            .await
    }

    /// Read straight from the backend, bypassing the cache.
    pub async fn fetch_uncached<T>(&self, query: Query) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let source = Arc::clone(&self.source);
        self.cache
            .fetch_uncached(move || async move {
                let value = source.fetch(&query).await?;
                decode_value(value)
            })
            .await
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
