use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every metric the crate emits. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "gazette_query_cache_hit_total",
            Unit::Count,
            "Reads answered from a fresh query cache entry."
        );
        describe_counter!(
            "gazette_query_cache_miss_total",
            Unit::Count,
            "Reads that started a backend query."
        );
        describe_counter!(
            "gazette_query_cache_coalesced_total",
            Unit::Count,
            "Reads that joined a query already in flight for the same key."
        );
        describe_counter!(
            "gazette_query_cache_evict_total",
            Unit::Count,
            "Query cache entries evicted due to capacity."
        );
        describe_counter!(
            "gazette_query_cache_stale_served_total",
            Unit::Count,
            "Expired entries served after a failed refetch."
        );
        describe_counter!(
            "gazette_content_load_failed_total",
            Unit::Count,
            "Content kinds that failed during an aggregate load."
        );
        describe_counter!(
            "gazette_content_fallback_total",
            Unit::Count,
            "Aggregate loads that used a fallback query."
        );
        describe_histogram!(
            "gazette_content_load_ms",
            Unit::Milliseconds,
            "Aggregate content load latency in milliseconds."
        );
    });
}
