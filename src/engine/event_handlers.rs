// src/engine/event_handlers.rs

//! Event handling logic for the core monitor.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::engine::abort::AbortNotice;
use crate::engine::core::CoreMonitor;
use crate::engine::watchdog::{OutputCheck, arm_test_timeout};
use crate::stats::{Counter, IntervalKey, IntervalResult};
use crate::types::{ExitClassification, TestIdentity, test_key};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Deliver `TestDeadlineElapsed { test }` after `after`.
    ArmTestTimeout { test: TestIdentity, after: Duration },
    /// Deliver `OutputDeadlineElapsed(check)` after `after`.
    ArmOutputTimeout { check: OutputCheck, after: Duration },
    /// Best-effort stack sample of the application, bounded by `time_box`.
    CaptureDiagnostics {
        pid: u32,
        output_dir: PathBuf,
        time_box: Duration,
    },
    /// Force-terminate the application if it still exists.
    TerminateProcess { pid: u32 },
    /// Invoke the abort callback.
    NotifyAborted(AbortNotice),
}

/// Decision returned by the core after handling a single `MonitorEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

pub fn handle_application_launched(monitor: &mut CoreMonitor, pid: u32) -> Vec<CoreCommand> {
    info!(pid, "application launched");
    monitor.app_pid = Some(pid);
    monitor.state.application_launched();
    Vec::new()
}

pub fn handle_application_exited(monitor: &mut CoreMonitor) -> Vec<CoreCommand> {
    info!(pid = ?monitor.app_pid, "application exited");
    monitor.state.application_exited();
    Vec::new()
}

pub fn handle_all_tests_began(monitor: &mut CoreMonitor) -> Vec<CoreCommand> {
    info!(attempt = monitor.config.attempt, "all tests began");
    monitor.state.suite_started();
    monitor.stats.start_run(monitor.config.attempt);
    Vec::new()
}

pub fn handle_all_tests_ended(monitor: &mut CoreMonitor) -> Vec<CoreCommand> {
    if monitor.is_finalized() {
        debug!("ignoring end of tests for a run that was already aborted");
        return Vec::new();
    }

    monitor.state.suite_completed();

    let failures = monitor.ledger.failure_count();
    let (exit, result) = if failures > 0 {
        (ExitClassification::TestsFailed, IntervalResult::Failed)
    } else {
        (ExitClassification::AllTestsPassed, IntervalResult::Passed)
    };
    monitor.exit = exit;
    monitor.stats.stop_run(monitor.config.attempt, result);

    info!(failures, exit = %exit, "all tests ended");
    Vec::new()
}

pub fn handle_test_suite_began(
    monitor: &mut CoreMonitor,
    name: String,
    started_at: SystemTime,
    is_root: bool,
) -> Vec<CoreCommand> {
    debug!(suite = %name, ?started_at, is_root, "test suite began");
    let key = IntervalKey::suite(monitor.config.attempt, &name);
    monitor.stats.start_interval(&key);
    Vec::new()
}

pub fn handle_test_suite_ended(monitor: &mut CoreMonitor, name: String, is_root: bool) -> Vec<CoreCommand> {
    debug!(suite = %name, is_root, "test suite ended");
    let key = IntervalKey::suite(monitor.config.attempt, &name);
    monitor.stats.stop_interval(&key, IntervalResult::Info);
    Vec::new()
}

pub fn handle_test_case_began(monitor: &mut CoreMonitor, name: String, class: String) -> Vec<CoreCommand> {
    let test = TestIdentity::new(name, class);
    let key = monitor.test_interval(test.key());

    monitor.stats.start_interval(&key);
    monitor.state.suite_started();
    info!(test = %test.name, class = %test.class, "test case began");

    monitor.ledger.begin(test.clone());
    monitor.stats.increment(Counter::TestsAttempted, &key);

    vec![arm_test_timeout(monitor, test)]
}

pub fn handle_test_case_passed(
    monitor: &mut CoreMonitor,
    name: String,
    class: String,
    duration: Duration,
) -> Vec<CoreCommand> {
    let key = test_key(&name, &class);
    let elapsed = monitor.ledger.elapsed_since_start(&key);
    info!(
        test = %name,
        class = %class,
        reported = ?duration,
        elapsed = ?elapsed,
        "test case passed"
    );

    monitor.ledger.record_executed(&name, &class);
    monitor.ledger.finish_current();

    let interval = monitor.test_interval(key);
    monitor.stats.stop_interval(&interval, IntervalResult::Passed);
    Vec::new()
}

pub fn handle_test_case_failed(
    monitor: &mut CoreMonitor,
    name: String,
    class: String,
    file: String,
    line: u32,
    was_exception: bool,
) -> Vec<CoreCommand> {
    let key = test_key(&name, &class);
    if !monitor.ledger.record_failure(&key) {
        return Vec::new();
    }

    warn!(
        test = %name,
        class = %class,
        file = %file,
        line,
        was_exception,
        "test case failed"
    );

    if !monitor.config.only_retry_failed {
        monitor.ledger.record_executed(&name, &class);
    }
    monitor.ledger.finish_current();

    let interval = monitor.test_interval(key);
    monitor.stats.stop_interval(&interval, IntervalResult::Failed);
    monitor.stats.increment(Counter::TestErrors, &interval);
    if was_exception {
        monitor.stats.increment(Counter::TestFailures, &interval);
    }
    Vec::new()
}

pub fn handle_parser_completed(monitor: &mut CoreMonitor) -> Vec<CoreCommand> {
    debug!("output parser completed");
    monitor.state.parser_completed();
    Vec::new()
}
