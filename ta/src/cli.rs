//! Command-line interface

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// TaskAgent - natural-language task manager
#[derive(Debug, Parser)]
#[command(
    name = "ta",
    about = "Turn free-text requests into dated tasks, calendar events and email summaries",
    version,
    after_help = after_help(),
)]
pub struct Cli {
    /// Request to handle; prompted for when omitted
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Planning passes before giving up
    #[arg(short, long)]
    pub iterations: Option<u32>,

    /// Stop asking for a due date after this many answers
    #[arg(long = "max-clarifications")]
    pub max_clarifications: Option<u32>,
}

/// Location of the log file
pub fn get_log_path() -> PathBuf {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskagent")
        .join("logs")
        .join("taskagent.log");
    debug!(?path, "get_log_path: returning path");
    path
}

fn after_help() -> String {
    format!("Logs are written to: {}", get_log_path().display())
}
