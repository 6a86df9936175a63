//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

mod cli;

pub use cli::{ArticleArgs, ClientOverrides, CliArgs, Command, LoadArgs, WatchArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "gazette";
const ENV_PREFIX: &str = "GAZETTE";
const DEFAULT_DATASET: &str = "production";
const DEFAULT_API_VERSION: &str = "2024-01-01";
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 512;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_FRESH_WINDOW_DAYS: u64 = 7;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub backend: BackendSettings,
    pub cache: CacheSettings,
    pub navigation: NavigationSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    /// Base URL for published reads (CDN host when enabled).
    pub published_base: Url,
    /// Base URL for preview reads; never the CDN.
    pub preview_base: Url,
    pub preview_token: Option<String>,
    pub request_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl: Duration,
    pub max_entries: NonZeroUsize,
    pub stale_on_error: bool,
}

#[derive(Debug, Clone)]
pub struct NavigationSettings {
    pub poll_interval: Duration,
    pub fresh_window: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    if let Some(command) = cli.command.as_ref() {
        raw.apply_overrides(command.overrides());
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the process arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    backend: RawBackendSettings,
    cache: RawCacheSettings,
    navigation: RawNavigationSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &ClientOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(project_id) = overrides.project_id.as_ref() {
            self.backend.project_id = Some(project_id.clone());
        }
        if let Some(dataset) = overrides.dataset.as_ref() {
            self.backend.dataset = Some(dataset.clone());
        }
        if let Some(host) = overrides.api_host.as_ref() {
            self.backend.api_host = Some(host.clone());
        }
        if let Some(use_cdn) = overrides.use_cdn {
            self.backend.use_cdn = Some(use_cdn);
        }
        if let Some(token) = overrides.preview_token.as_ref() {
            self.backend.preview_token = Some(token.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(seconds) = overrides.poll_interval_seconds {
            self.navigation.poll_interval_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            backend,
            cache,
            navigation,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            backend: build_backend_settings(backend)?,
            cache: build_cache_settings(cache)?,
            navigation: build_navigation_settings(navigation)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_backend_settings(backend: RawBackendSettings) -> Result<BackendSettings, LoadError> {
    let project_id = non_blank(backend.project_id)
        .ok_or_else(|| LoadError::invalid("backend.project_id", "must be set"))?;
    if !project_id
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-')
    {
        return Err(LoadError::invalid(
            "backend.project_id",
            "may only contain ASCII letters, digits and `-`",
        ));
    }

    let dataset = non_blank(backend.dataset).unwrap_or_else(|| DEFAULT_DATASET.to_string());
    let api_version =
        non_blank(backend.api_version).unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
    let use_cdn = backend.use_cdn.unwrap_or(true);

    let (published_base, preview_base) = match non_blank(backend.api_host) {
        Some(host) => {
            let base = parse_base_url(&host, "backend.api_host")?;
            (base.clone(), base)
        }
        None => {
            let api = format!("https://{project_id}.api.sanity.io");
            let published = if use_cdn {
                format!("https://{project_id}.apicdn.sanity.io")
            } else {
                api.clone()
            };
            (
                parse_base_url(&published, "backend.project_id")?,
                parse_base_url(&api, "backend.project_id")?,
            )
        }
    };

    let request_timeout = match backend.request_timeout_seconds {
        Some(0) => {
            return Err(LoadError::invalid(
                "backend.request_timeout_seconds",
                "must be greater than zero",
            ));
        }
        Some(seconds) => Some(Duration::from_secs(seconds)),
        None => None,
    };

    Ok(BackendSettings {
        project_id,
        dataset,
        api_version,
        published_base,
        preview_base,
        preview_token: non_blank(backend.preview_token),
        request_timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_secs = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    let max_entries = NonZeroUsize::new(cache.max_entries.unwrap_or(DEFAULT_CACHE_MAX_ENTRIES))
        .ok_or_else(|| LoadError::invalid("cache.max_entries", "must be greater than zero"))?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        ttl: Duration::from_secs(ttl_secs),
        max_entries,
        stale_on_error: cache.stale_on_error.unwrap_or(false),
    })
}

fn build_navigation_settings(
    navigation: RawNavigationSettings,
) -> Result<NavigationSettings, LoadError> {
    let poll_secs = navigation
        .poll_interval_seconds
        .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
    if poll_secs == 0 {
        return Err(LoadError::invalid(
            "navigation.poll_interval_seconds",
            "must be greater than zero",
        ));
    }

    let fresh_days = navigation
        .fresh_window_days
        .unwrap_or(DEFAULT_FRESH_WINDOW_DAYS);
    if fresh_days == 0 {
        return Err(LoadError::invalid(
            "navigation.fresh_window_days",
            "must be greater than zero",
        ));
    }

    Ok(NavigationSettings {
        poll_interval: Duration::from_secs(poll_secs),
        fresh_window: Duration::from_secs(fresh_days * 24 * 60 * 60),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawBackendSettings {
    project_id: Option<String>,
    dataset: Option<String>,
    api_version: Option<String>,
    api_host: Option<String>,
    use_cdn: Option<bool>,
    preview_token: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    max_entries: Option<usize>,
    stale_on_error: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawNavigationSettings {
    poll_interval_seconds: Option<u64>,
    fresh_window_days: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_base_url(raw: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(raw).map_err(|err| LoadError::invalid(key, format!("invalid URL `{raw}`: {err}")))?;
    if url.cannot_be_a_base() {
        return Err(LoadError::invalid(key, format!("`{raw}` cannot be used as a base URL")));
    }
    Ok(url)
}

#[cfg(test)]
mod tests;
