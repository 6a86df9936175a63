use thiserror::Error;

use crate::application::kinds::ContentKind;
use crate::application::source::SourceError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Message shown to readers when an aggregate load partially or fully fails.
pub const CONTENT_LOAD_FAILED: &str = "Some content could not be loaded. Please try again later.";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("content load failed for {}", describe_kinds(.failed))]
    ContentLoad { failed: Vec<ContentKind> },
    #[error("resource not found")]
    NotFound,
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Text safe to show to a reader; details stay in the logs.
    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::InvalidSlug { .. }) | AppError::NotFound => {
                "Content not found"
            }
            AppError::ContentLoad { .. } | AppError::Source(_) => CONTENT_LOAD_FAILED,
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_)) => "I/O failure",
            AppError::Infra(InfraError::Backend { .. }) => "Content backend unavailable",
            AppError::Domain(DomainError::InvalidKey { .. }) | AppError::Unexpected(_) => {
                "Unexpected error occurred"
            }
        }
    }
}

fn describe_kinds(kinds: &[ContentKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
