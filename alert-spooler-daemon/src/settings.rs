//! Configuration loading and CLI merge.
//!
//! Precedence: built-in defaults < TOML file < `ALERT_SPOOLER_*` env vars < CLI flags.

use std::time::Duration;

use alert_spooler_core::config::{SpoolerConfig, parse_utc_offset};
use alert_spooler_pipeline::RunnerConfig;
use alert_spooler_pipeline::event::parse_time_str;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};

use crate::cli::DaemonCli;

/// Load the file (or defaults), apply env overrides, merge CLI flags and validate.
pub async fn load_config(cli: &DaemonCli) -> Result<SpoolerConfig> {
    let mut config = match &cli.config {
        Some(path) => SpoolerConfig::load(path)
            .await
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            let mut config = SpoolerConfig::default();
            config.apply_env_overrides();
            config
        }
    };

    apply_cli(&mut config, cli);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;
    Ok(config)
}

/// Overwrite config values with the flags given on the command line.
///
/// Blank string flags are treated as absent.
pub fn apply_cli(config: &mut SpoolerConfig, cli: &DaemonCli) {
    if !cli.input_globs.is_empty() {
        config.spooler.input_globs = cli.input_globs.clone();
    }

    set_if_given(&mut config.database.path, cli.db.as_deref());
    set_if_given(&mut config.database.folder, cli.db_folder.as_deref());
    set_if_given(&mut config.database.prefix, cli.db_prefix.as_deref());
    set_if_given(&mut config.spooler.job, cli.job.as_deref());
    set_if_given(&mut config.delivery.syslog_addr, cli.syslog_addr.as_deref());
    set_if_given(&mut config.delivery.service, cli.service.as_deref());
    set_if_given(&mut config.spooler.deadman, cli.deadman.as_deref());
    set_if_given(&mut config.general.log_level, cli.log_level.as_deref());
    set_if_given(&mut config.general.log_format, cli.log_format.as_deref());

    if let Some(len) = cli.hash_hex_len {
        config.spooler.hash_hex_len = len;
    }
    if let Some(enabled) = cli.delete_after_send {
        config.spooler.delete_after_send = enabled;
    }
    if let Some(secs) = cli.timeout {
        config.spooler.timeout_secs = secs;
    }
    if let Some(codes) = cli.codes.as_deref().filter(|c| !c.trim().is_empty()) {
        config.tagging.codes = split_csv(codes);
    }
    if cli.debug {
        config.general.debug = true;
    }
}

/// Build the runner configuration, resolving `--replay-from` against the event time offset.
pub fn runner_config(config: &SpoolerConfig, cli: &DaemonCli) -> Result<RunnerConfig> {
    let mut runner = RunnerConfig::from_core(config)
        .map_err(|e| anyhow::anyhow!("failed to build runner config: {}", e))?;

    if let Some(text) = cli.replay_from.as_deref().filter(|t| !t.trim().is_empty()) {
        let offset = parse_utc_offset(&config.spooler.event_time_offset)
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        runner.replay_from = Some(parse_replay_from(text, &offset)?);
    }
    Ok(runner)
}

/// Parse a `--replay-from` value.
pub fn parse_replay_from(text: &str, offset: &FixedOffset) -> Result<DateTime<Utc>> {
    parse_time_str(text, offset).ok_or_else(|| {
        anyhow::anyhow!(
            "invalid --replay-from '{}': expected RFC3339 or 'YYYY-MM-DD HH:MM:SS[.fff]'",
            text
        )
    })
}

/// Poll interval for loop mode, never shorter than one second.
pub fn poll_interval(cli: &DaemonCli) -> Duration {
    Duration::from_secs(cli.poll_interval_secs.max(1))
}

fn set_if_given(target: &mut String, value: Option<&str>) {
    if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
        *target = v.trim().to_owned();
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}
