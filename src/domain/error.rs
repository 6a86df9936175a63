use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("invalid slug `{slug}`: {reason}")]
    InvalidSlug { slug: String, reason: &'static str },
    #[error("invalid query key: {reason}")]
    InvalidKey { reason: &'static str },
}

impl DomainError {
    pub fn invalid_slug(slug: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidSlug {
            slug: slug.into(),
            reason,
        }
    }
}
