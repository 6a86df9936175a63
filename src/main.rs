use std::{process, sync::Arc};

use gazette::{
    application::{
        client::ContentClient,
        error::AppError,
        loader::ContentLoader,
        navigation::{NewContentWatcher, WatchConfig},
        preview::DraftResolver,
        source::ContentSource,
    },
    cache::{CacheConfig, QueryCache},
    config,
    domain::documents::LookupMode,
    infra::{backend::HttpContentSource, error::InfraError, telemetry},
};
use gazette_content_types::ArticleRecord;
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args.command.unwrap_or_default();

    telemetry::init(&settings.logging).map_err(AppError::from)?;
    info!(
        project = %settings.backend.project_id,
        dataset = %settings.backend.dataset,
        "gazette starting"
    );

    let clients = Clients::build(&settings)?;

    match command {
        config::Command::Load(args) => run_load(clients, args).await,
        config::Command::Article(args) => run_article(clients, args).await,
        config::Command::Watch(args) => run_watch(clients, &settings, args).await,
    }
}

/// Backend channels sharing one query cache.
struct Clients {
    published: ContentClient,
    preview: Option<ContentClient>,
}

impl Clients {
    fn build(settings: &config::Settings) -> Result<Self, InfraError> {
        let cache = QueryCache::new(CacheConfig::from(&settings.cache));

        let published: Arc<dyn ContentSource> =
            Arc::new(HttpContentSource::published(&settings.backend)?);
        // Preview reads bypass the cache.
        let preview = HttpContentSource::preview(&settings.backend)?.map(|source| {
            let source: Arc<dyn ContentSource> = Arc::new(source);
            ContentClient::new(source, cache.clone())
        });

        Ok(Self {
            published: ContentClient::new(published, cache),
            preview,
        })
    }
}

async fn run_load(clients: Clients, args: config::LoadArgs) -> Result<(), AppError> {
    let loader = ContentLoader::new(clients.published);

    let Some(mut report) = loader.init().await else {
        return Err(AppError::unexpected("content loader initialized twice"));
    };
    print_json(&report)?;

    if args.twice {
        report = loader.refetch().await;
        print_json(&report)?;
    }

    if let Some(message) = loader.snapshot().error {
        warn!(message = %message, "content loaded with errors");
        return Err(AppError::ContentLoad {
            failed: report.failed_kinds(),
        });
    }
    Ok(())
}

async fn run_article(clients: Clients, args: config::ArticleArgs) -> Result<(), AppError> {
    let mode = if args.preview {
        LookupMode::Preview
    } else {
        LookupMode::Normal
    };
    if mode == LookupMode::Preview && clients.preview.is_none() {
        warn!("no preview token configured; draft lookups will report not found");
    }

    let resolver = DraftResolver::new(clients.published, clients.preview);
    match resolver.resolve::<ArticleRecord>(&args.slug, mode).await {
        Some(article) => print_json(&article),
        None => Err(AppError::NotFound),
    }
}

async fn run_watch(
    clients: Clients,
    settings: &config::Settings,
    args: config::WatchArgs,
) -> Result<(), AppError> {
    let watcher = Arc::new(NewContentWatcher::new(
        clients.published,
        WatchConfig::from(&settings.navigation),
    ));

    if args.once {
        let badge = watcher.check_once().await?;
        return print_json(&badge);
    }

    let mut updates = watcher.subscribe();
    let handle = Arc::clone(&watcher).spawn();
    info!(
        interval_secs = settings.navigation.poll_interval.as_secs(),
        "watching for new content; press Ctrl-C to stop"
    );

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let badge = updates.borrow_and_update().clone();
                print_json(&badge)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    handle.abort();
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{rendered}");
    Ok(())
}
