//! Aggregate content loader.
//!
//! Issues one cached query per [`ContentKind`] concurrently, applies the
//! trending-to-latest fallback, and publishes the merged result through a
//! `watch` channel in a single transition.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use futures::future::join_all;
use metrics::{counter, histogram};
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::application::client::ContentClient;
use crate::application::error::AppError;
use crate::application::kinds::{Collection, ContentKind};
use crate::application::source::{Query, SourceError};
use crate::application::state::ContentState;

const METRIC_LOAD_MS: &str = "gazette_content_load_ms";
const METRIC_LOAD_FAILED: &str = "gazette_content_load_failed_total";
const METRIC_FALLBACK: &str = "gazette_content_fallback_total";

/// Outcome of one kind within a load.
#[derive(Debug, Clone, Serialize)]
pub struct SlotReport {
    pub kind: ContentKind,
    /// Records loaded; `None` when the slot failed and kept its prior value.
    pub count: Option<usize>,
    pub used_fallback: bool,
    pub error: Option<String>,
}

/// Summary of a single `load_all` run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub generation: u64,
    pub slots: Vec<SlotReport>,
    /// False when a newer load started before this one finished.
    pub current: bool,
    /// False when a newer load had already published its data, so this
    /// load's collections were dropped.
    pub applied: bool,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.slots.iter().all(|slot| slot.error.is_none())
    }

    pub fn failed_kinds(&self) -> Vec<ContentKind> {
        self.slots
            .iter()
            .filter(|slot| slot.error.is_some())
            .map(|slot| slot.kind)
            .collect()
    }

    pub fn slot(&self, kind: ContentKind) -> Option<&SlotReport> {
        self.slots.iter().find(|slot| slot.kind == kind)
    }
}

struct SlotOutcome {
    kind: ContentKind,
    result: Result<Collection, SourceError>,
    used_fallback: bool,
}

/// Owns the aggregate [`ContentState`] and the lifecycle that fills it.
pub struct ContentLoader {
    client: ContentClient,
    state: watch::Sender<ContentState>,
    initialized: AtomicBool,
    generation: AtomicU64,
    // Newest generation whose collections reached the state.
    applied_generation: AtomicU64,
}

impl ContentLoader {
    pub fn new(client: ContentClient) -> Self {
        let (state, _) = watch::channel(ContentState::default());
        Self {
            client,
            state,
            initialized: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            applied_generation: AtomicU64::new(0),
        }
    }

    /// Current state, cloned.
    pub fn snapshot(&self) -> ContentState {
        self.state.borrow().clone()
    }

    /// Receiver notified after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ContentState> {
        self.state.subscribe()
    }

    /// Run the first load. Later calls return `None` without touching the backend.
    pub async fn init(&self) -> Option<LoadReport> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("content loader already initialized");
            return None;
        }
        Some(self.load_all().await)
    }

    /// Reload every kind, serving fresh cache entries where present.
    pub async fn refetch(&self) -> LoadReport {
        self.load_all().await
    }

    /// Drop every cached query result, then reload from the backend.
    pub async fn clear_cache(&self) -> LoadReport {
        self.client.invalidate_all();
        info!("query cache cleared; reloading content");
        self.load_all().await
    }

    #[instrument(skip(self), fields(generation = tracing::field::Empty))]
    pub async fn load_all(&self) -> LoadReport {
        let started_at = Instant::now();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("generation", generation);

        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error = None;
        });

        let outcomes = join_all(ContentKind::ALL.map(|kind| self.load_kind(kind))).await;

        let mut slots = Vec::with_capacity(outcomes.len());
        let mut loaded = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome.result {
                Ok(collection) => {
                    slots.push(SlotReport {
                        kind: outcome.kind,
                        count: Some(collection.len()),
                        used_fallback: outcome.used_fallback,
                        error: None,
                    });
                    loaded.push(collection);
                }
                Err(err) => {
                    warn!(kind = %outcome.kind, error = %err, "content query failed");
                    counter!(METRIC_LOAD_FAILED, "kind" => outcome.kind.as_str()).increment(1);
                    slots.push(SlotReport {
                        kind: outcome.kind,
                        count: None,
                        used_fallback: outcome.used_fallback,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let failed: Vec<ContentKind> = slots
            .iter()
            .filter(|slot| slot.error.is_some())
            .map(|slot| slot.kind)
            .collect();
        let error = (!failed.is_empty()).then(|| AppError::ContentLoad { failed });

        let mut current = false;
        let mut applied = false;
        self.state.send_modify(|state| {
            if generation > self.applied_generation.load(Ordering::SeqCst) {
                applied = true;
                self.applied_generation.store(generation, Ordering::SeqCst);
                for collection in loaded {
                    state.apply(collection);
                }
            } else {
                debug!("newer content already applied; dropping superseded results");
            }
            // A newer load owns the flags; this one only contributes data.
            if self.generation.load(Ordering::SeqCst) == generation {
                current = true;
                state.is_loading = false;
                match &error {
                    Some(err) => state.error = Some(err.presentation_message().to_string()),
                    None => {
                        state.error = None;
                        state.loaded_at = Some(OffsetDateTime::now_utc());
                    }
                }
            }
        });

        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(
            METRIC_LOAD_MS,
            "outcome" => if error.is_none() { "ok" } else { "partial" }
        )
        .record(elapsed_ms);

        match &error {
            Some(err) => warn!(error = %err, elapsed_ms, "content load completed with failures"),
            None => info!(elapsed_ms, "content load complete"),
        }

        LoadReport {
            generation,
            slots,
            current,
            applied,
        }
    }

    async fn load_kind(&self, kind: ContentKind) -> SlotOutcome {
        let plan = kind.plan();
        let primary = self.fetch(kind, (plan.primary)()).await;

        match (primary, plan.fallback) {
            (Ok(collection), Some(fallback)) if collection.is_empty() => {
                debug!(kind = %kind, "primary query returned nothing; using fallback");
                counter!(METRIC_FALLBACK, "kind" => kind.as_str()).increment(1);
                SlotOutcome {
                    kind,
                    result: self.fetch(kind, fallback()).await,
                    used_fallback: true,
                }
            }
            (result, _) => SlotOutcome {
                kind,
                result,
                used_fallback: false,
            },
        }
    }

    async fn fetch(&self, kind: ContentKind, query: Query) -> Result<Collection, SourceError> {
        self.client
            .fetch_cached_with(query, move |value| kind.decode(value))
            .await
    }
}
