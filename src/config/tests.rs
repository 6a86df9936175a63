use std::io::Write;

use serial_test::serial;

use super::*;

fn raw_with_project() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.backend.project_id = Some("abc123".to_string());
    raw
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_project();
    raw.logging.level = Some("info".to_string());
    raw.cache.ttl_seconds = Some(60);

    let overrides = ClientOverrides {
        log_level: Some("debug".to_string()),
        cache_ttl_seconds: Some(30),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.ttl, Duration::from_secs(30));
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(raw_with_project()).expect("valid settings");

    assert!(settings.cache.enabled);
    assert_eq!(settings.cache.ttl, Duration::from_secs(300));
    assert_eq!(settings.cache.max_entries.get(), DEFAULT_CACHE_MAX_ENTRIES);
    assert!(!settings.cache.stale_on_error);
    assert_eq!(settings.navigation.poll_interval, Duration::from_secs(300));
    assert_eq!(
        settings.navigation.fresh_window,
        Duration::from_secs(7 * 24 * 60 * 60)
    );
    assert_eq!(settings.backend.dataset, "production");
    assert!(settings.backend.preview_token.is_none());
    assert!(settings.backend.request_timeout.is_none());
}

#[test]
fn published_reads_use_cdn_by_default() {
    let settings = Settings::from_raw(raw_with_project()).expect("valid settings");
    assert_eq!(
        settings.backend.published_base.as_str(),
        "https://abc123.apicdn.sanity.io/"
    );
    assert_eq!(
        settings.backend.preview_base.as_str(),
        "https://abc123.api.sanity.io/"
    );

    let mut raw = raw_with_project();
    raw.backend.use_cdn = Some(false);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.backend.published_base,
        settings.backend.preview_base
    );
}

#[test]
fn api_host_override_applies_to_both_channels() {
    let mut raw = raw_with_project();
    raw.apply_overrides(&ClientOverrides {
        api_host: Some("http://127.0.0.1:9000".to_string()),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.backend.published_base.as_str(),
        "http://127.0.0.1:9000/"
    );
    assert_eq!(
        settings.backend.preview_base.as_str(),
        "http://127.0.0.1:9000/"
    );
}

#[test]
fn missing_project_id_is_rejected() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("project id required");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "backend.project_id",
            ..
        }
    ));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = raw_with_project();
    raw.cache.ttl_seconds = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.ttl_seconds",
            ..
        })
    ));

    let mut raw = raw_with_project();
    raw.cache.max_entries = Some(0);
    assert!(matches!(
        Settings::from_raw(raw),
        Err(LoadError::Invalid {
            key: "cache.max_entries",
            ..
        })
    ));

    let mut raw = raw_with_project();
    raw.navigation.poll_interval_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn blank_preview_token_is_treated_as_absent() {
    let mut raw = raw_with_project();
    raw.backend.preview_token = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.backend.preview_token.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_project();
    raw.apply_overrides(&ClientOverrides {
        log_json: Some(true),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_load_command() {
    let args = CliArgs::parse_from(["gazette"]);
    let command = args.command.unwrap_or_default();
    assert!(matches!(command, Command::Load(_)));
}

#[test]
fn parse_article_arguments() {
    let args = CliArgs::parse_from([
        "gazette",
        "article",
        "hello-world",
        "--preview",
        "--backend-dataset",
        "staging",
    ]);

    match args.command.expect("article command") {
        Command::Article(article) => {
            assert_eq!(article.slug, "hello-world");
            assert!(article.preview);
            assert_eq!(article.overrides.dataset.as_deref(), Some("staging"));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_watch_arguments() {
    let args = CliArgs::parse_from(["gazette", "watch", "--once", "--navigation-poll-seconds", "30"]);

    match args.command.expect("watch command") {
        Command::Watch(watch) => {
            assert!(watch.once);
            assert_eq!(watch.overrides.poll_interval_seconds, Some(30));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
#[serial]
fn file_then_env_then_cli() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config file");
    writeln!(
        file,
        "[backend]\nproject_id = \"fromfile\"\ndataset = \"filed\"\n\n[cache]\nttl_seconds = 120\nmax_entries = 64\n"
    )
    .expect("write config");

    // SAFETY: serialised with every other env-mutating test.
    unsafe {
        std::env::set_var("GAZETTE__CACHE__TTL_SECONDS", "90");
        std::env::set_var("GAZETTE__BACKEND__DATASET", "fromenv");
    }

    let config_file = file.path().to_string_lossy().into_owned();
    let args = CliArgs::parse_from([
        "gazette",
        "--config-file",
        config_file.as_str(),
        "load",
        "--backend-dataset",
        "fromcli",
    ]);
    let result = load(&args);

    unsafe {
        std::env::remove_var("GAZETTE__CACHE__TTL_SECONDS");
        std::env::remove_var("GAZETTE__BACKEND__DATASET");
    }

    let settings = result.expect("settings load");
    assert_eq!(settings.backend.project_id, "fromfile");
    assert_eq!(settings.backend.dataset, "fromcli");
    assert_eq!(settings.cache.ttl, Duration::from_secs(90));
    assert_eq!(settings.cache.max_entries.get(), 64);
}
