//! CLI parsing and configuration merge tests.

use std::path::PathBuf;
use std::time::Duration;

use alert_spooler_core::config::SpoolerConfig;
use alert_spooler_daemon::cli::DaemonCli;
use alert_spooler_daemon::settings;
use chrono::{FixedOffset, TimeZone, Utc};
use clap::Parser;

fn parse(args: &[&str]) -> DaemonCli {
    let mut argv = vec!["alert-spooler"];
    argv.extend_from_slice(args);
    DaemonCli::try_parse_from(argv).expect("cli should parse")
}

fn base_config() -> SpoolerConfig {
    SpoolerConfig::parse(
        r#"
[database]
folder = "/var/lib/alert-spooler"

[spooler]
job = "mhdbs"
input_globs = ["/data/general/*.warn"]

[tagging]
codes = ["ZBBB"]
"#,
    )
    .expect("base config should parse")
}

fn east8() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

#[test]
fn test_cli_defaults() {
    let cli = parse(&[]);

    assert!(cli.config.is_none());
    assert!(cli.once, "once should default to true");
    assert_eq!(cli.poll_interval_secs, 5);
    assert!(cli.delete_after_send.is_none());
    assert!(cli.input_globs.is_empty());
    assert!(!cli.validate);
}

#[test]
fn test_cli_parses_loop_mode_and_repeated_globs() {
    let cli = parse(&[
        "--once",
        "false",
        "--poll-interval-secs",
        "30",
        "--input-glob",
        "/a/*.warn",
        "--input-glob",
        "/b/**/*.alarm",
        "--config",
        "/etc/alert-spooler.toml",
    ]);

    assert!(!cli.once);
    assert_eq!(settings::poll_interval(&cli), Duration::from_secs(30));
    assert_eq!(cli.input_globs, vec!["/a/*.warn", "/b/**/*.alarm"]);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/alert-spooler.toml")));
}

#[test]
fn test_delete_after_send_flag_forms() {
    assert_eq!(parse(&["--delete-after-send"]).delete_after_send, Some(true));
    assert_eq!(
        parse(&["--delete-after-send", "false"]).delete_after_send,
        Some(false)
    );
}

#[test]
fn test_zero_poll_interval_is_clamped() {
    let cli = parse(&["--poll-interval-secs", "0"]);
    assert_eq!(settings::poll_interval(&cli), Duration::from_secs(1));
}

#[test]
fn test_apply_cli_overrides_file_values() {
    // Given: a file config and a command line overriding part of it
    let mut config = base_config();
    let cli = parse(&[
        "--input-glob",
        "/override/*.warn",
        "--db-prefix",
        "spool_",
        "--job",
        "billing",
        "--syslog-addr",
        "10.0.0.5:514",
        "--hash-hex-len",
        "16",
        "--codes",
        "ZGGG, ZSSS",
        "--delete-after-send",
        "false",
        "--timeout",
        "45",
        "--deadman",
        "beat",
        "--debug",
    ]);

    // When
    settings::apply_cli(&mut config, &cli);

    // Then
    assert_eq!(config.spooler.input_globs, vec!["/override/*.warn"]);
    assert_eq!(config.database.folder, "/var/lib/alert-spooler");
    assert_eq!(config.database.prefix, "spool_");
    assert_eq!(config.spooler.job, "billing");
    assert_eq!(config.delivery.syslog_addr, "10.0.0.5:514");
    assert_eq!(config.spooler.hash_hex_len, 16);
    assert_eq!(config.tagging.codes, vec!["ZGGG", "ZSSS"]);
    assert!(!config.spooler.delete_after_send);
    assert_eq!(config.spooler.timeout_secs, 45);
    assert_eq!(config.spooler.deadman, "beat");
    assert_eq!(config.effective_log_level(), "debug");
}

#[test]
fn test_blank_flags_keep_file_values() {
    let mut config = base_config();
    let cli = parse(&["--job", "  ", "--codes", " "]);

    settings::apply_cli(&mut config, &cli);

    assert_eq!(config.spooler.job, "mhdbs");
    assert_eq!(config.tagging.codes, vec!["ZBBB"]);
    assert!(config.spooler.delete_after_send);
}

#[tokio::test]
async fn test_load_config_from_file_and_cli() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alert-spooler.toml");
    std::fs::write(
        &path,
        r#"
[database]
path = "/tmp/spool.db"

[spooler]
input_globs = ["/data/*.warn"]
"#,
    )
    .unwrap();

    let path_arg = path.to_string_lossy().into_owned();
    let cli = parse(&["--config", &path_arg, "--job", "mhdbs"]);
    let config = settings::load_config(&cli).await.unwrap();

    assert_eq!(config.database.path, "/tmp/spool.db");
    assert_eq!(config.spooler.job, "mhdbs");
}

#[tokio::test]
async fn test_load_config_rejects_missing_job() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alert-spooler.toml");
    std::fs::write(&path, "[spooler]\ninput_globs = [\"/data/*.warn\"]\n").unwrap();

    let path_arg = path.to_string_lossy().into_owned();
    let err = settings::load_config(&parse(&["--config", &path_arg]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("spooler.job"), "{err}");
}

#[tokio::test]
async fn test_load_config_missing_file_is_error() {
    let cli = parse(&["--config", "/nonexistent/alert-spooler.toml"]);
    let err = settings::load_config(&cli).await.unwrap_err();
    assert!(err.to_string().contains("failed to load config"), "{err}");
}

#[test]
fn test_parse_replay_from_formats() {
    let expected = Utc.with_ymd_and_hms(2024, 1, 2, 7, 4, 5).unwrap();

    for text in [
        "2024-01-02T07:04:05Z",
        "2024-01-02T15:04:05+08:00",
        "2024-01-02 15:04:05",
        "2024-01-02T15:04:05",
        "2024-01-02 15:04:05.000",
    ] {
        let parsed = settings::parse_replay_from(text, &east8()).unwrap();
        assert_eq!(parsed, expected, "{text}");
    }
}

#[test]
fn test_parse_replay_from_rejects_garbage() {
    let err = settings::parse_replay_from("yesterday", &east8()).unwrap_err();
    assert!(err.to_string().contains("--replay-from"));
}

#[test]
fn test_runner_config_carries_replay_start() {
    let config = base_config();
    let cli = parse(&["--replay-from", "2024-03-01 08:00:00"]);

    let runner = settings::runner_config(&config, &cli).unwrap();

    assert_eq!(
        runner.replay_from,
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(runner.job(), "mhdbs");
    assert_eq!(runner.tag_codes, vec!["ZBBB"]);
}

#[test]
fn test_runner_config_without_replay() {
    let runner = settings::runner_config(&base_config(), &parse(&[])).unwrap();
    assert!(runner.replay_from.is_none());
    assert_eq!(
        runner.db_folder,
        Some(PathBuf::from("/var/lib/alert-spooler"))
    );
}
