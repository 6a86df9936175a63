//! Read-side seam to the remote content backend.

use std::borrow::Cow;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::cache::QueryKey;

/// Failure talking to the content backend.
///
/// Cloneable so every caller sharing one in-flight request receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("backend rejected query: {0}")]
    Query(String),
    #[error("failed to decode backend response: {0}")]
    Decode(String),
    #[error("content channel `{0}` is not configured")]
    Unconfigured(&'static str),
}

impl SourceError {
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// A named read operation: query text plus bound parameters.
///
/// The name identifies the query text; together with the parameters it forms
/// the cache identity (see [`Query::cache_key`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    name: &'static str,
    text: Cow<'static, str>,
    params: BTreeMap<&'static str, Value>,
}

impl Query {
    pub fn new(name: &'static str, text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name,
            text: text.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.params.insert(name, value.into());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &BTreeMap<&'static str, Value> {
        &self.params
    }

    pub fn cache_key(&self) -> QueryKey {
        QueryKey::for_query(self)
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a query and return the backend's `result` payload.
    async fn fetch(&self, query: &Query) -> Result<Value, SourceError>;
}

/// Decode a backend result into `T`.
///
/// Single-document queries return `null` when nothing matches, so decode
/// them into `Option<_>`.
pub fn decode_value<T>(value: Value) -> Result<T, SourceError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(value).map_err(SourceError::decode)
}
