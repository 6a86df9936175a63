use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Gazette operator binary.
#[derive(Debug, Parser)]
#[command(name = "gazette", version, about = "Gazette content client")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "GAZETTE_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Load every content collection once and print a summary.
    Load(LoadArgs),
    /// Resolve a single article by slug.
    Article(ArticleArgs),
    /// Poll for new articles and print the navigation badge on change.
    Watch(WatchArgs),
}

impl Default for Command {
    fn default() -> Self {
        Command::Load(LoadArgs::default())
    }
}

impl Command {
    pub fn overrides(&self) -> &ClientOverrides {
        match self {
            Command::Load(args) => &args.overrides,
            Command::Article(args) => &args.overrides,
            Command::Watch(args) => &args.overrides,
        }
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct LoadArgs {
    #[command(flatten)]
    pub overrides: ClientOverrides,

    /// Run the load a second time to show cache hits.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub twice: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ArticleArgs {
    #[command(flatten)]
    pub overrides: ClientOverrides,

    /// Article slug.
    pub slug: String,

    /// Prefer the draft revision (requires a preview token).
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub preview: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WatchArgs {
    #[command(flatten)]
    pub overrides: ClientOverrides,

    /// Check once and exit instead of polling.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub once: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ClientOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the backend project id.
    #[arg(long = "backend-project-id", value_name = "ID")]
    pub project_id: Option<String>,

    /// Override the backend dataset.
    #[arg(long = "backend-dataset", value_name = "NAME")]
    pub dataset: Option<String>,

    /// Override the backend API host (e.g. a local mock).
    #[arg(long = "backend-api-host", value_name = "URL", value_hint = ValueHint::Url)]
    pub api_host: Option<String>,

    /// Toggle the CDN host for published reads.
    #[arg(
        long = "backend-use-cdn",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub use_cdn: Option<bool>,

    /// Override the preview token.
    #[arg(long = "backend-preview-token", env = "GAZETTE_PREVIEW_TOKEN", value_name = "TOKEN")]
    pub preview_token: Option<String>,

    /// Toggle the query cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the query cache TTL.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Override the new-content poll interval.
    #[arg(long = "navigation-poll-seconds", value_name = "SECONDS")]
    pub poll_interval_seconds: Option<u64>,
}
