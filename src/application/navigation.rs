//! "New content" indicator for the site navigation.
//!
//! Polls the newest published article on a fixed interval, independent of
//! the query cache, and publishes whether it is recent enough to flag.

use std::sync::Arc;
use std::time::Duration;

use gazette_content_types::ArticleStamp;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::application::client::ContentClient;
use crate::application::queries;
use crate::application::source::SourceError;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_FRESH_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub poll_interval: Duration,
    /// How long after publication an article still counts as new.
    pub fresh_window: Duration,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            fresh_window: DEFAULT_FRESH_WINDOW,
        }
    }
}

impl From<&crate::config::NavigationSettings> for WatchConfig {
    fn from(settings: &crate::config::NavigationSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            fresh_window: settings.fresh_window,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewContentBadge {
    pub visible: bool,
    pub latest_slug: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub checked_at: Option<OffsetDateTime>,
}

impl NewContentBadge {
    /// Badge for the newest article as of `now`.
    pub fn evaluate(
        latest: Option<&ArticleStamp>,
        now: OffsetDateTime,
        fresh_window: Duration,
    ) -> Self {
        let window = time::Duration::try_from(fresh_window).unwrap_or(time::Duration::MAX);
        let visible = latest
            .and_then(|stamp| stamp.published_at)
            .is_some_and(|published_at| now - published_at <= window);
        Self {
            visible,
            latest_slug: latest.map(|stamp| stamp.slug.clone()),
            checked_at: Some(now),
        }
    }
}

pub struct NewContentWatcher {
    client: ContentClient,
    config: WatchConfig,
    badge: watch::Sender<NewContentBadge>,
}

impl NewContentWatcher {
    pub fn new(client: ContentClient, config: WatchConfig) -> Self {
        let (badge, _) = watch::channel(NewContentBadge::default());
        Self {
            client,
            config,
            badge,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<NewContentBadge> {
        self.badge.subscribe()
    }

    pub fn current(&self) -> NewContentBadge {
        self.badge.borrow().clone()
    }

    /// Query the newest article once and publish the resulting badge.
    ///
    /// On failure the previous badge stays in place.
    pub async fn check_once(&self) -> Result<NewContentBadge, SourceError> {
        let latest: Option<ArticleStamp> = self
            .client
            .fetch_uncached(queries::latest_article_stamp())
            .await?;
        let badge = NewContentBadge::evaluate(
            latest.as_ref(),
            OffsetDateTime::now_utc(),
            self.config.fresh_window,
        );
        debug!(
            visible = badge.visible,
            latest = badge.latest_slug.as_deref().unwrap_or("-"),
            "new-content badge refreshed"
        );
        self.badge.send_replace(badge.clone());
        Ok(badge)
    }

    /// Poll until the returned handle is aborted.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.config.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.check_once().await {
                    warn!(error = %err, "new-content check failed; keeping previous badge");
                }
            }
        })
    }
}
