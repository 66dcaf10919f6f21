// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod process;
pub mod skip;
pub mod stats;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::{CoreMonitor, LoggingAbortHandler, MonitorEvent, MonitorRuntime};
use crate::exec::TestCommand;
use crate::process::SystemProcessControl;
use crate::stats::{Counter, MemoryStats};
use crate::types::ExitClassification;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the core monitor and its async runtime
/// - the test process driver
/// - Ctrl-C handling
///
/// Returns the exit classification of the attempt, or `None` for a dry run.
pub async fn run(args: CliArgs) -> Result<Option<ExitClassification>> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_or_default(&config_path)?;
    if let Some(attempt) = args.attempt {
        cfg.run.attempt = attempt.max(1);
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(None);
    }

    let Some(command) = TestCommand::from_args(args.command) else {
        anyhow::bail!("no test command given");
    };
    let run_cfg = cfg.run;
    let skip_list = run_cfg.tests_to_skip.clone();

    let stats = Arc::new(MemoryStats::new());
    let process = SystemProcessControl::new(run_cfg.diagnostics_cmd.clone());
    let core = CoreMonitor::new(run_cfg, stats.clone());
    let (runtime, handle) = MonitorRuntime::new(core, process, LoggingAbortHandler, 256);

    let runtime_task = tokio::spawn(runtime.run());

    tokio::select! {
        res = crate::exec::run_test_process(&command, handle.sender()) => {
            let status = res?;
            debug!(?status, "test process driver finished");
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => info!("Ctrl+C received; shutting down"),
                Err(e) => warn!(error = %e, "failed to listen for Ctrl+C"),
            }
            if handle.send(MonitorEvent::ShutdownRequested).await.is_err() {
                debug!("monitor already stopped");
            }
        }
    }

    // Closing the last sender lets the runtime finish if it is still waiting.
    drop(handle);
    let report = runtime_task.await??;

    info!(
        exit = %report.exit,
        failures = report.failure_count,
        attempted = stats.counter(Counter::TestsAttempted),
        app_crashes = stats.counter(Counter::AppCrashes),
        timeouts = stats.counter(Counter::TestRuntimeTimeouts) + stats.counter(Counter::OutputTimeouts),
        skip_next_attempt = skip_list.len(),
        "run finished"
    );
    for key in skip_list.snapshot() {
        debug!(test = %key, "skip on next attempt");
    }

    Ok(Some(report.exit))
}

/// Simple dry-run output: print the resolved run configuration.
fn print_dry_run(cfg: &ConfigFile) {
    let run = &cfg.run;
    println!("testwatch dry-run");
    println!("  run.attempt = {}", run.attempt);
    println!("  run.test_case_timeout = {:?}", run.test_case_timeout);
    println!("  run.output_timeout = {:?}", run.output_timeout);
    println!("  run.only_retry_failed = {}", run.only_retry_failed);
    println!("  run.retry_app_crash_tests = {}", run.retry_app_crash_tests);
    println!("  run.output_dir = {}", run.output_dir.display());
    println!("  run.process_control = {}", run.process_control);
    if let Some(ref cmd) = run.diagnostics_cmd {
        println!("  run.diagnostics_cmd = {cmd}");
        println!("  run.diagnostics_timeout = {:?}", run.diagnostics_timeout);
    }

    let skipped = run.tests_to_skip.snapshot();
    println!();
    println!("tests_to_skip ({}):", skipped.len());
    for key in skipped {
        println!("  - {key}");
    }

    debug!("dry-run complete (no execution)");
}
