//! CLI argument definitions for alert-spooler.
//!
//! Uses `clap` v4 derive macros. Every flag is optional and, when given,
//! overrides the value loaded from the configuration file.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Durable alert-file forwarder.
///
/// Archives alert files into a SQLite ledger, forwards every event as an
/// RFC 5424 syslog line and deletes sources only after confirmed delivery.
#[derive(Parser, Debug, Default)]
#[command(name = "alert-spooler")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to alert-spooler.toml. Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Input glob (repeatable). Replaces `spooler.input_globs` from the file.
    #[arg(long = "input-glob", value_name = "GLOB")]
    pub input_globs: Vec<String>,

    /// Single static store file path.
    #[arg(long)]
    pub db: Option<String>,

    /// Monthly rolling store folder (wins over --db).
    #[arg(long)]
    pub db_folder: Option<String>,

    /// Monthly rolling store file prefix.
    #[arg(long)]
    pub db_prefix: Option<String>,

    /// `job` structured-data label.
    #[arg(long)]
    pub job: Option<String>,

    /// Syslog receiver address (tcp).
    #[arg(long)]
    pub syslog_addr: Option<String>,

    /// `service` structured-data label.
    #[arg(long)]
    pub service: Option<String>,

    /// Fingerprint hex length (0-64).
    #[arg(long)]
    pub hash_hex_len: Option<usize>,

    /// Comma-separated tag codes (e.g. ZBBB,ZGGG).
    #[arg(long, value_name = "CSV")]
    pub codes: Option<String>,

    /// Delete sources after confirmed delivery (`--delete-after-send false` to keep).
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub delete_after_send: Option<bool>,

    /// Overall timeout for one cycle, in seconds (0 = none).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Heartbeat token sent after every cycle.
    #[arg(long)]
    pub deadman: Option<String>,

    /// Replay mode: resend archived events from this time.
    ///
    /// RFC 3339, or `YYYY-MM-DD HH:MM:SS[.fff]` / `YYYY-MM-DDTHH:MM:SS[.fff]`
    /// at the configured event time offset.
    #[arg(long, value_name = "TIME")]
    pub replay_from: Option<String>,

    /// Run one cycle and exit (`--once false` to keep polling).
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub once: bool,

    /// Polling interval when not running once.
    #[arg(long, default_value_t = 5, value_name = "SECS")]
    pub poll_interval_secs: u64,

    /// Enable debug logs (same as `--log-level debug`).
    #[arg(long)]
    pub debug: bool,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration and exit without running.
    #[arg(long)]
    pub validate: bool,
}
