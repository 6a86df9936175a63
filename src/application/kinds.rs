//! Content kinds loaded by the aggregate loader.
//!
//! Each kind names its primary query and, for at most a few kinds, a broader
//! fallback issued when the primary returns nothing.

use std::fmt;

use gazette_content_types::{
    ArticleRecord, CaseStudyRecord, ClubFeatureRecord, ClubPricingRecord, PodcastRecord,
    SuccessStoryRecord, UniverseRecord,
};
use serde::Serialize;
use serde_json::Value;

use crate::application::queries;
use crate::application::source::{Query, SourceError, decode_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    FeaturedArticles,
    /// Trending articles, or the newest articles when none are trending.
    RecentArticles,
    Universes,
    ClubFeatures,
    ClubPricing,
    Podcasts,
    CaseStudies,
    SuccessStories,
}

/// Queries backing one content kind.
#[derive(Debug, Clone, Copy)]
pub struct KindPlan {
    pub primary: fn() -> Query,
    pub fallback: Option<fn() -> Query>,
}

impl ContentKind {
    pub const ALL: [ContentKind; 8] = [
        ContentKind::FeaturedArticles,
        ContentKind::RecentArticles,
        ContentKind::Universes,
        ContentKind::ClubFeatures,
        ContentKind::ClubPricing,
        ContentKind::Podcasts,
        ContentKind::CaseStudies,
        ContentKind::SuccessStories,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::FeaturedArticles => "featured_articles",
            ContentKind::RecentArticles => "recent_articles",
            ContentKind::Universes => "universes",
            ContentKind::ClubFeatures => "club_features",
            ContentKind::ClubPricing => "club_pricing",
            ContentKind::Podcasts => "podcasts",
            ContentKind::CaseStudies => "case_studies",
            ContentKind::SuccessStories => "success_stories",
        }
    }

    pub fn plan(self) -> KindPlan {
        let primary: fn() -> Query = match self {
            ContentKind::FeaturedArticles => queries::featured_articles,
            ContentKind::RecentArticles => queries::trending_articles,
            ContentKind::Universes => queries::universes,
            ContentKind::ClubFeatures => queries::club_features,
            ContentKind::ClubPricing => queries::club_pricing,
            ContentKind::Podcasts => queries::podcasts,
            ContentKind::CaseStudies => queries::case_studies,
            ContentKind::SuccessStories => queries::success_stories,
        };
        let fallback: Option<fn() -> Query> = match self {
            ContentKind::RecentArticles => Some(queries::latest_articles),
            _ => None,
        };
        KindPlan { primary, fallback }
    }

    /// Value a slot holds before its first successful load.
    pub fn empty(self) -> Collection {
        match self {
            ContentKind::FeaturedArticles => Collection::FeaturedArticles(Vec::new()),
            ContentKind::RecentArticles => Collection::RecentArticles(Vec::new()),
            ContentKind::Universes => Collection::Universes(Vec::new()),
            ContentKind::ClubFeatures => Collection::ClubFeatures(Vec::new()),
            ContentKind::ClubPricing => Collection::ClubPricing(Vec::new()),
            ContentKind::Podcasts => Collection::Podcasts(Vec::new()),
            ContentKind::CaseStudies => Collection::CaseStudies(Vec::new()),
            ContentKind::SuccessStories => Collection::SuccessStories(Vec::new()),
        }
    }

    /// Decode a backend result into this kind's collection.
    pub fn decode(self, value: Value) -> Result<Collection, SourceError> {
        // A missing result set decodes as an empty list.
        let value = if value.is_null() {
            Value::Array(Vec::new())
        } else {
            value
        };
        Ok(match self {
            ContentKind::FeaturedArticles => Collection::FeaturedArticles(decode_value(value)?),
            ContentKind::RecentArticles => Collection::RecentArticles(decode_value(value)?),
            ContentKind::Universes => Collection::Universes(decode_value(value)?),
            ContentKind::ClubFeatures => Collection::ClubFeatures(decode_value(value)?),
            ContentKind::ClubPricing => Collection::ClubPricing(decode_value(value)?),
            ContentKind::Podcasts => Collection::Podcasts(decode_value(value)?),
            ContentKind::CaseStudies => Collection::CaseStudies(decode_value(value)?),
            ContentKind::SuccessStories => Collection::SuccessStories(decode_value(value)?),
        })
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loaded records of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    FeaturedArticles(Vec<ArticleRecord>),
    RecentArticles(Vec<ArticleRecord>),
    Universes(Vec<UniverseRecord>),
    ClubFeatures(Vec<ClubFeatureRecord>),
    ClubPricing(Vec<ClubPricingRecord>),
    Podcasts(Vec<PodcastRecord>),
    CaseStudies(Vec<CaseStudyRecord>),
    SuccessStories(Vec<SuccessStoryRecord>),
}

impl Collection {
    pub fn kind(&self) -> ContentKind {
        match self {
            Collection::FeaturedArticles(_) => ContentKind::FeaturedArticles,
            Collection::RecentArticles(_) => ContentKind::RecentArticles,
            Collection::Universes(_) => ContentKind::Universes,
            Collection::ClubFeatures(_) => ContentKind::ClubFeatures,
            Collection::ClubPricing(_) => ContentKind::ClubPricing,
            Collection::Podcasts(_) => ContentKind::Podcasts,
            Collection::CaseStudies(_) => ContentKind::CaseStudies,
            Collection::SuccessStories(_) => ContentKind::SuccessStories,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::FeaturedArticles(items) | Collection::RecentArticles(items) => items.len(),
            Collection::Universes(items) => items.len(),
            Collection::ClubFeatures(items) => items.len(),
            Collection::ClubPricing(items) => items.len(),
            Collection::Podcasts(items) => items.len(),
            Collection::CaseStudies(items) => items.len(),
            Collection::SuccessStories(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
