//! Cache key definitions.
//!
//! A [`QueryKey`] is the string identity of a logical read. Keys built from a
//! [`Query`] include the query name and every parameter in sorted order, so
//! identical reads share a key and reads differing in any parameter do not.

use std::fmt;

use crate::application::source::Query;
use crate::domain::error::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// Build a key from a raw identity string.
    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::InvalidKey {
                reason: "key must not be empty",
            });
        }
        Ok(Self(raw))
    }

    /// Derive the key of a query: `name` or `name?a=<json>&b=<json>`.
    pub fn for_query(query: &Query) -> Self {
        let mut key = String::from(query.name());
        for (index, (name, value)) in query.params().iter().enumerate() {
            key.push(if index == 0 { '?' } else { '&' });
            key.push_str(name);
            key.push('=');
            // JSON encoding quotes strings, keeping `&` and `=` inside values unambiguous.
            key.push_str(&value.to_string());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
