//! Page-level cached reads that sit outside the aggregate load.

use gazette_content_types::{ArticleRecord, QuoteRecord, SubcategoryRecord, UniverseRecord};
use tracing::debug;

use crate::application::client::ContentClient;
use crate::application::queries;
use crate::application::source::SourceError;
use crate::domain::documents::Slug;
use crate::domain::error::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Slug(#[from] DomainError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Cached catalogue reads keyed by their parameters.
#[derive(Clone)]
pub struct ContentCatalog {
    client: ContentClient,
}

impl ContentCatalog {
    pub fn new(client: ContentClient) -> Self {
        Self { client }
    }

    pub async fn all_articles(&self) -> Result<Vec<ArticleRecord>, CatalogError> {
        Ok(self.client.fetch_cached(queries::all_articles()).await?)
    }

    pub async fn articles_in_universe(
        &self,
        universe: &str,
    ) -> Result<Vec<ArticleRecord>, CatalogError> {
        let universe = Slug::new(universe)?;
        Ok(self
            .client
            .fetch_cached(queries::articles_in_universe(&universe))
            .await?)
    }

    /// Subcategories of a universe, each with its parent dereferenced.
    pub async fn subcategories_of(
        &self,
        universe: &str,
    ) -> Result<Vec<SubcategoryRecord>, CatalogError> {
        let universe = Slug::new(universe)?;
        Ok(self
            .client
            .fetch_cached(queries::subcategories_of(&universe))
            .await?)
    }

    pub async fn universe_by_slug(&self, slug: &str) -> Result<Option<UniverseRecord>, CatalogError> {
        let slug = Slug::new(slug)?;
        let found: Option<UniverseRecord> = self
            .client
            .fetch_cached(queries::universe_by_slug(&slug))
            .await?;
        if found.is_none() {
            debug!(slug = %slug, "universe not found");
        }
        Ok(found)
    }

    pub async fn quotes(&self) -> Result<Vec<QuoteRecord>, CatalogError> {
        Ok(self.client.fetch_cached(queries::quotes()).await?)
    }

    /// Newest published article, through the cache.
    pub async fn latest_article(&self) -> Result<Option<ArticleRecord>, CatalogError> {
        Ok(self.client.fetch_cached(queries::newest_article()).await?)
    }
}
