// src/logging.rs

//! Subscriber setup for the `testwatch` binary.
//!
//! `--log-level` applies one level to everything. Without it,
//! `TESTWATCH_LOG` is read as a full filter directive, so
//! `TESTWATCH_LOG=testwatch::engine=trace,info` narrows tracing to the
//! watchdog. Anything else falls back to `info`.
//!
//! Test output from the supervised command is forwarded as log events, so
//! everything goes to stderr and stdout stays clean.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

const LOG_ENV: &str = "TESTWATCH_LOG";

/// Install the global subscriber. Call once, before `run`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::default().add_directive(level_filter(level).into()),
        None => EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .with_env_var(LOG_ENV)
            .from_env_lossy(),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
