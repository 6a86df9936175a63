//! Document identity: slugs, backend ids and the draft revision convention.

use std::fmt;

use gazette_content_types::{ArticleRecord, CaseStudyRecord, PodcastRecord, UniverseRecord};

use super::error::DomainError;

/// Reserved id prefix marking an unpublished revision.
pub const DRAFT_PREFIX: &str = "drafts.";

/// Human-assigned, URL-safe document identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Slug(String);

impl Slug {
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(DomainError::invalid_slug(raw, "slug is empty"));
        }
        if raw.chars().any(|ch| ch.is_whitespace() || ch == '/' || ch == '"') {
            return Err(DomainError::invalid_slug(
                raw,
                "slug contains whitespace, `/` or `\"`",
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-assigned document identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_draft(&self) -> bool {
        self.0.starts_with(DRAFT_PREFIX)
    }

    /// Id of the published counterpart; identity for published ids.
    pub fn published_id(&self) -> &str {
        self.0.strip_prefix(DRAFT_PREFIX).unwrap_or(&self.0)
    }

    pub fn draft_id(&self) -> String {
        format!("{DRAFT_PREFIX}{}", self.published_id())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Document types addressable by slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Article,
    Podcast,
    Universe,
    CaseStudy,
}

impl DocumentType {
    /// Value of the backend `_type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Article => "article",
            DocumentType::Podcast => "podcast",
            DocumentType::Universe => "universe",
            DocumentType::CaseStudy => "caseStudy",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which revision a slug lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupMode {
    /// Published documents only, served through the cache.
    #[default]
    Normal,
    /// Drafts preferred over published revisions, never cached.
    Preview,
}

/// A record that can be looked up by slug.
pub trait Document {
    const DOCUMENT_TYPE: DocumentType;

    fn document_id(&self) -> DocumentId;
}

impl Document for ArticleRecord {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Article;

    fn document_id(&self) -> DocumentId {
        DocumentId::new(self.id.as_str())
    }
}

impl Document for PodcastRecord {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Podcast;

    fn document_id(&self) -> DocumentId {
        DocumentId::new(self.id.as_str())
    }
}

impl Document for UniverseRecord {
    const DOCUMENT_TYPE: DocumentType = DocumentType::Universe;

    fn document_id(&self) -> DocumentId {
        DocumentId::new(self.id.as_str())
    }
}

impl Document for CaseStudyRecord {
    const DOCUMENT_TYPE: DocumentType = DocumentType::CaseStudy;

    fn document_id(&self) -> DocumentId {
        DocumentId::new(self.id.as_str())
    }
}
