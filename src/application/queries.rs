//! Query catalogue.
//!
//! Every read the layer issues is defined here, named, and parameterised.
//! Published reads filter out draft ids; preview reads run against the raw
//! perspective and pick drafts explicitly.

use crate::application::source::Query;
use crate::domain::documents::{DocumentType, Slug};

macro_rules! article_projection {
    () => {
        r#"{ _id, "slug": slug.current, title, excerpt, publishedAt, featured, trending, order, readingMinutes, "universe": universe->{ _id, "slug": slug.current, title } }"#
    };
}

macro_rules! published_filter {
    () => {
        r#"!(_id in path("drafts.**"))"#
    };
}

const FEATURED_ARTICLES: &str = concat!(
    r#"*[_type == "article" && featured == true && "#,
    published_filter!(),
    r#"] | order(publishedAt desc, _id asc)[0...6] "#,
    article_projection!()
);

const TRENDING_ARTICLES: &str = concat!(
    r#"*[_type == "article" && trending == true && "#,
    published_filter!(),
    r#"] | order(order asc, publishedAt desc)[0...8] "#,
    article_projection!()
);

const LATEST_ARTICLES: &str = concat!(
    r#"*[_type == "article" && "#,
    published_filter!(),
    r#"] | order(publishedAt desc, _id asc)[0...8] "#,
    article_projection!()
);

const ALL_ARTICLES: &str = concat!(
    r#"*[_type == "article" && "#,
    published_filter!(),
    r#"] | order(publishedAt desc, _id asc) "#,
    article_projection!()
);

const ARTICLES_IN_UNIVERSE: &str = concat!(
    r#"*[_type == "article" && universe->slug.current == $universe && "#,
    published_filter!(),
    r#"] | order(publishedAt desc, _id asc) "#,
    article_projection!()
);

const NEWEST_ARTICLE: &str = concat!(
    r#"*[_type == "article" && "#,
    published_filter!(),
    r#"] | order(publishedAt desc, _id asc)[0] "#,
    article_projection!()
);

const LATEST_ARTICLE_STAMP: &str = concat!(
    r#"*[_type == "article" && defined(publishedAt) && "#,
    published_filter!(),
    r#"] | order(publishedAt desc)[0]{ _id, "slug": slug.current, publishedAt }"#
);

const UNIVERSES: &str = concat!(
    r#"*[_type == "universe" && "#,
    published_filter!(),
    r#"] | order(order asc, title asc){ _id, "slug": slug.current, title, description, order, "parent": parent->{ _id, "slug": slug.current, title } }"#
);

const UNIVERSE_BY_SLUG: &str = concat!(
    r#"*[_type == "universe" && slug.current == $slug && "#,
    published_filter!(),
    r#"][0]{ _id, "slug": slug.current, title, description, order, "parent": parent->{ _id, "slug": slug.current, title } }"#
);

const SUBCATEGORIES: &str = concat!(
    r#"*[_type == "subcategory" && parent->slug.current == $universe && "#,
    published_filter!(),
    r#"] | order(order asc, title asc){ _id, "slug": slug.current, title, order, "parent": parent->{ _id, "slug": slug.current, title } }"#
);

const CLUB_FEATURES: &str = concat!(
    r#"*[_type == "clubFeature" && "#,
    published_filter!(),
    r#"] | order(order asc){ _id, title, description, icon, order }"#
);

const CLUB_PRICING: &str = concat!(
    r#"*[_type == "clubPricing" && "#,
    published_filter!(),
    r#"] | order(order asc){ _id, name, price, currency, period, highlights, featured, order }"#
);

const PODCASTS: &str = concat!(
    r#"*[_type == "podcast" && "#,
    published_filter!(),
    r#"] | order(publishedAt desc, _id asc)[0...12]{ _id, "slug": slug.current, title, episode, durationMinutes, audioUrl, publishedAt }"#
);

const CASE_STUDIES: &str = concat!(
    r#"*[_type == "caseStudy" && "#,
    published_filter!(),
    r#"] | order(order asc, publishedAt desc){ _id, "slug": slug.current, title, client, summary, publishedAt, order }"#
);

const SUCCESS_STORIES: &str = concat!(
    r#"*[_type == "successStory" && "#,
    published_filter!(),
    r#"] | order(order asc){ _id, name, role, story, order }"#
);

const QUOTES: &str = concat!(
    r#"*[_type == "quote" && "#,
    published_filter!(),
    r#"] | order(order asc){ _id, text, author, order }"#
);

pub fn featured_articles() -> Query {
    Query::new("articles.featured", FEATURED_ARTICLES)
}

pub fn trending_articles() -> Query {
    Query::new("articles.trending", TRENDING_ARTICLES)
}

/// Unconditional newest articles; the fallback for an empty trending list.
pub fn latest_articles() -> Query {
    Query::new("articles.latest", LATEST_ARTICLES)
}

pub fn all_articles() -> Query {
    Query::new("articles.all", ALL_ARTICLES)
}

pub fn articles_in_universe(universe: &Slug) -> Query {
    Query::new("articles.in_universe", ARTICLES_IN_UNIVERSE).param("universe", universe.as_str())
}

/// Single newest article, or `null` when nothing is published.
pub fn newest_article() -> Query {
    Query::new("articles.newest", NEWEST_ARTICLE)
}

pub fn latest_article_stamp() -> Query {
    Query::new("articles.latest_stamp", LATEST_ARTICLE_STAMP)
}

pub fn universes() -> Query {
    Query::new("universes.all", UNIVERSES)
}

pub fn universe_by_slug(slug: &Slug) -> Query {
    Query::new("universes.by_slug", UNIVERSE_BY_SLUG).param("slug", slug.as_str())
}

pub fn subcategories_of(universe: &Slug) -> Query {
    Query::new("subcategories.of_universe", SUBCATEGORIES).param("universe", universe.as_str())
}

pub fn club_features() -> Query {
    Query::new("club.features", CLUB_FEATURES)
}

pub fn club_pricing() -> Query {
    Query::new("club.pricing", CLUB_PRICING)
}

pub fn podcasts() -> Query {
    Query::new("podcasts.recent", PODCASTS)
}

pub fn case_studies() -> Query {
    Query::new("case_studies.all", CASE_STUDIES)
}

pub fn success_stories() -> Query {
    Query::new("success_stories.all", SUCCESS_STORIES)
}

pub fn quotes() -> Query {
    Query::new("quotes.all", QUOTES)
}

fn projection_for(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::Article => article_projection!(),
        DocumentType::Podcast => {
            r#"{ _id, "slug": slug.current, title, episode, durationMinutes, audioUrl, publishedAt }"#
        }
        DocumentType::Universe => {
            r#"{ _id, "slug": slug.current, title, description, order, "parent": parent->{ _id, "slug": slug.current, title } }"#
        }
        DocumentType::CaseStudy => {
            r#"{ _id, "slug": slug.current, title, client, summary, publishedAt, order }"#
        }
    }
}

/// Published revision of a document by slug.
pub fn published_by_slug(doc_type: DocumentType, slug: &Slug) -> Query {
    let text = format!(
        r#"*[_type == $type && slug.current == $slug && {}][0]{}"#,
        published_filter!(),
        projection_for(doc_type)
    );
    Query::new("document.published", text)
        .param("type", doc_type.as_str())
        .param("slug", slug.as_str())
}

/// Any revision of a document by slug, drafts ordered first.
pub fn any_revision_by_slug(doc_type: DocumentType, slug: &Slug) -> Query {
    let text = format!(
        r#"*[_type == $type && slug.current == $slug] | order(select(_id in path("drafts.**") => 0, 1) asc)[0]{}"#,
        projection_for(doc_type)
    );
    Query::new("document.any_revision", text)
        .param("type", doc_type.as_str())
        .param("slug", slug.as_str())
}

/// Draft revision only.
pub fn draft_by_slug(doc_type: DocumentType, slug: &Slug) -> Query {
    let text = format!(
        r#"*[_type == $type && slug.current == $slug && _id in path("drafts.**")][0]{}"#,
        projection_for(doc_type)
    );
    Query::new("document.draft", text)
        .param("type", doc_type.as_str())
        .param("slug", slug.as_str())
}
