//! Draft/publish resolution for single-document lookups.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::client::ContentClient;
use crate::application::queries;
use crate::application::source::{Query, SourceError};
use crate::domain::documents::{Document, DocumentType, LookupMode, Slug};

/// Resolves a slug to a document, preferring drafts in preview mode.
///
/// Normal lookups go through the published channel's cache. Preview lookups
/// bypass the cache entirely and read from the preview channel, which sees
/// drafts. Backend failures are logged and reported as not found.
#[derive(Clone)]
pub struct DraftResolver {
    published: ContentClient,
    preview: Option<ContentClient>,
}

impl DraftResolver {
    pub fn new(published: ContentClient, preview: Option<ContentClient>) -> Self {
        Self { published, preview }
    }

    pub fn has_preview(&self) -> bool {
        self.preview.is_some()
    }

    pub async fn resolve<T>(&self, slug: &str, mode: LookupMode) -> Option<T>
    where
        T: Document + DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let doc_type = T::DOCUMENT_TYPE;
        let slug = match Slug::new(slug) {
            Ok(slug) => slug,
            Err(err) => {
                debug!(doc_type = %doc_type, error = %err, "rejecting lookup for invalid slug");
                return None;
            }
        };

        match mode {
            LookupMode::Normal => self.resolve_published(doc_type, &slug).await,
            LookupMode::Preview => self.resolve_preview(doc_type, &slug).await,
        }
    }

    async fn resolve_published<T>(&self, doc_type: DocumentType, slug: &Slug) -> Option<T>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        let query = queries::published_by_slug(doc_type, slug);
        let found = self
            .published
            .fetch_cached::<Option<T>>(query)
            .await
            .unwrap_or_else(|err| log_lookup_failure(doc_type, slug, "published", &err));
        if found.is_none() {
            debug!(doc_type = %doc_type, slug = %slug, "no published document");
        }
        found
    }

    async fn resolve_preview<T>(&self, doc_type: DocumentType, slug: &Slug) -> Option<T>
    where
        T: Document + DeserializeOwned,
    {
        let Some(preview) = &self.preview else {
            warn!(
                doc_type = %doc_type,
                slug = %slug,
                "preview lookup requested but no preview channel is configured"
            );
            return None;
        };

        let any_revision = queries::any_revision_by_slug(doc_type, slug);
        if let Some(found) = lookup_uncached::<T>(preview, any_revision, doc_type, slug).await {
            debug!(
                doc_type = %doc_type,
                slug = %slug,
                draft = found.document_id().is_draft(),
                "preview lookup matched"
            );
            return Some(found);
        }

        let draft_only = queries::draft_by_slug(doc_type, slug);
        let found = lookup_uncached::<T>(preview, draft_only, doc_type, slug).await;
        if found.is_none() {
            debug!(doc_type = %doc_type, slug = %slug, "no revision found in preview");
        }
        found
    }
}

async fn lookup_uncached<T>(
    client: &ContentClient,
    query: Query,
    doc_type: DocumentType,
    slug: &Slug,
) -> Option<T>
where
    T: DeserializeOwned,
{
    let stage = query.name();
    client
        .fetch_uncached::<Option<T>>(query)
        .await
        .unwrap_or_else(|err| log_lookup_failure(doc_type, slug, stage, &err))
}

fn log_lookup_failure<T>(
    doc_type: DocumentType,
    slug: &Slug,
    stage: &'static str,
    err: &SourceError,
) -> Option<T> {
    warn!(
        doc_type = %doc_type,
        slug = %slug,
        stage,
        error = %err,
        "document lookup failed; reporting not found"
    );
    None
}
