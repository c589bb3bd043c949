use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use humantime::parse_duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Drive a toast store from stdin, printing every snapshot as JSON",
    long_about = None
)]
pub struct Cli {
    /// TOML configuration file. Defaults to `toasts.toml` when present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Timeout for `add` commands that do not give one (e.g. "3s").
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Exit on end of input instead of waiting for remaining toasts to expire.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_drain: bool,

    /// Emit logs as JSON (requires `--features json-logs`).
    #[arg(long, action = ArgAction::SetTrue)]
    pub json_logs: bool,

    /// Explicit log filter (e.g. "toast_store=debug").
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
