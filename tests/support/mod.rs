#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gazette::application::client::ContentClient;
use gazette::application::source::{ContentSource, Query, SourceError};
use gazette::cache::{CacheConfig, QueryCache};
use serde_json::{Value, json};

/// Scripted in-memory backend.
///
/// Responses are matched by full cache key first, then by query name, and
/// captured when the request starts. Unscripted queries answer `null`, which
/// decodes as empty or not found.
#[derive(Default)]
pub struct FakeSource {
    responses: Mutex<HashMap<String, Result<Value, SourceError>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    delays: Mutex<HashMap<String, Duration>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn respond(&self, name_or_key: &str, value: Value) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(name_or_key.to_string(), Ok(value));
    }

    pub fn fail(&self, name_or_key: &str, err: SourceError) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(name_or_key.to_string(), Err(err));
    }

    /// Override the response delay for one query name.
    pub fn set_delay(&self, name: &str, delay: Duration) {
        self.delays
            .lock()
            .expect("delays lock")
            .insert(name.to_string(), delay);
    }

    /// Most requests that were outstanding at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Query names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|call| call.as_str() == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch(&self, query: &Query) -> Result<Value, SourceError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(query.name().to_string());

        let response = {
            let key = query.cache_key();
            let responses = self.responses.lock().expect("responses lock");
            responses
                .get(key.as_str())
                .or_else(|| responses.get(query.name()))
                .cloned()
                .unwrap_or(Ok(Value::Null))
        };
        let delay = self
            .delays
            .lock()
            .expect("delays lock")
            .get(query.name())
            .copied()
            .or(self.delay);

        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(outstanding, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        response
    }
}

pub fn client(source: &Arc<FakeSource>) -> ContentClient {
    client_with(source, CacheConfig::default())
}

pub fn client_with(source: &Arc<FakeSource>, config: CacheConfig) -> ContentClient {
    let source: Arc<dyn ContentSource> = source.clone();
    ContentClient::new(source, QueryCache::new(config))
}

pub fn article(id: &str, slug: &str) -> Value {
    json!({
        "_id": id,
        "slug": slug,
        "title": format!("Title of {slug}"),
        "publishedAt": "2024-05-01T08:00:00Z",
    })
}

pub fn articles(prefix: &str, count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|index| article(&format!("{prefix}-{index}"), &format!("{prefix}-slug-{index}")))
            .collect(),
    )
}

/// Script every aggregate query with one or more records.
pub fn script_full_load(source: &FakeSource) {
    source.respond("articles.featured", articles("featured", 2));
    source.respond("articles.trending", articles("trending", 3));
    source.respond(
        "universes.all",
        json!([{ "_id": "u1", "slug": "science", "title": "Science" }]),
    );
    source.respond(
        "club.features",
        json!([{ "_id": "cf1", "title": "Weekly letter" }]),
    );
    source.respond(
        "club.pricing",
        json!([{ "_id": "cp1", "name": "Monthly", "price": 4.5 }]),
    );
    source.respond(
        "podcasts.recent",
        json!([
            { "_id": "p1", "slug": "episode-1", "title": "Episode 1" },
            { "_id": "p2", "slug": "episode-2", "title": "Episode 2" }
        ]),
    );
    source.respond(
        "case_studies.all",
        json!([{ "_id": "cs1", "slug": "acme", "title": "Acme" }]),
    );
    source.respond(
        "success_stories.all",
        json!([{ "_id": "ss1", "name": "Ada" }]),
    );
}
