// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::ERROR_EXIT_CODE;

/// Command-line arguments for `testwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "testwatch",
    version,
    about = "Run a test command under a hang and crash watchdog.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// A missing file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Testwatch.toml")]
    pub config: String,

    /// Override `[run].attempt` from the config file.
    #[arg(long, value_name = "N")]
    pub attempt: Option<u32>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TESTWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config and print it, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Test command to supervise.
    ///
    /// A single argument is run through the shell; several are executed
    /// directly with their quoting intact.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "dry_run"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Parse the process arguments.
///
/// Usage errors exit with [`ERROR_EXIT_CODE`] instead of clap's default of 2,
/// which would read as a test timeout. `--help` and `--version` exit 0.
pub fn parse() -> CliArgs {
    CliArgs::try_parse().unwrap_or_else(|err| {
        if err.use_stderr() {
            let _ = err.print();
            std::process::exit(ERROR_EXIT_CODE);
        }
        err.exit()
    })
}
