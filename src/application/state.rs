//! Aggregate content state shared with presentation code.

use gazette_content_types::{
    ArticleRecord, CaseStudyRecord, ClubFeatureRecord, ClubPricingRecord, PodcastRecord,
    SuccessStoryRecord, UniverseRecord,
};
use time::OffsetDateTime;

use crate::application::kinds::{Collection, ContentKind};

/// Every loaded collection plus loading and error flags.
///
/// Starts empty. Only [`ContentLoader`](crate::application::loader::ContentLoader)
/// mutates it, and each load completes in a single transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentState {
    pub featured_articles: Vec<ArticleRecord>,
    pub recent_articles: Vec<ArticleRecord>,
    pub universes: Vec<UniverseRecord>,
    pub club_features: Vec<ClubFeatureRecord>,
    pub club_pricing: Vec<ClubPricingRecord>,
    pub podcasts: Vec<PodcastRecord>,
    pub case_studies: Vec<CaseStudyRecord>,
    pub success_stories: Vec<SuccessStoryRecord>,
    pub is_loading: bool,
    /// User-facing message from the last load, if any query failed.
    pub error: Option<String>,
    /// When every slot last loaded successfully.
    pub loaded_at: Option<OffsetDateTime>,
}

impl ContentState {
    /// Replace one slot with a freshly loaded collection.
    pub fn apply(&mut self, collection: Collection) {
        match collection {
            Collection::FeaturedArticles(items) => self.featured_articles = items,
            Collection::RecentArticles(items) => self.recent_articles = items,
            Collection::Universes(items) => self.universes = items,
            Collection::ClubFeatures(items) => self.club_features = items,
            Collection::ClubPricing(items) => self.club_pricing = items,
            Collection::Podcasts(items) => self.podcasts = items,
            Collection::CaseStudies(items) => self.case_studies = items,
            Collection::SuccessStories(items) => self.success_stories = items,
        }
    }

    /// Number of records currently held for `kind`.
    pub fn count(&self, kind: ContentKind) -> usize {
        match kind {
            ContentKind::FeaturedArticles => self.featured_articles.len(),
            ContentKind::RecentArticles => self.recent_articles.len(),
            ContentKind::Universes => self.universes.len(),
            ContentKind::ClubFeatures => self.club_features.len(),
            ContentKind::ClubPricing => self.club_pricing.len(),
            ContentKind::Podcasts => self.podcasts.len(),
            ContentKind::CaseStudies => self.case_studies.len(),
            ContentKind::SuccessStories => self.success_stories.len(),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
