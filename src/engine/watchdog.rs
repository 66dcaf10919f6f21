// src/engine/watchdog.rs

//! Watchdog deadlines.
//!
//! Neither deadline is ever cancelled. Arming one captures the precondition
//! it protects (the test that was current, or the output epoch); when the
//! deadline event comes back, the captured value is compared with live
//! state and a mismatch makes the check a silent no-op.

use tracing::{debug, error, info, trace};

use crate::engine::abort::{AbortDisposition, stop_tests_with_error_message};
use crate::engine::core::CoreMonitor;
use crate::engine::event_handlers::CoreCommand;
use crate::stats::{Counter, IntervalKey, IntervalResult};
use crate::types::{ExitClassification, TestIdentity};

/// Output line that signals the application process has ended.
pub const APP_PROCESS_ENDED: &str = "TESTWATCH_APP_PROCESS_ENDED";

/// Snapshot taken when an output-staleness deadline is armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputCheck {
    pub epoch: u64,
    pub current: Option<TestIdentity>,
    pub previous: Option<TestIdentity>,
}

impl OutputCheck {
    fn resolve(&self) -> Option<TestIdentity> {
        self.current.clone().or_else(|| self.previous.clone())
    }
}

pub(crate) fn arm_test_timeout(monitor: &CoreMonitor, test: TestIdentity) -> CoreCommand {
    CoreCommand::ArmTestTimeout {
        test,
        after: monitor.config.test_case_timeout,
    }
}

pub(crate) fn handle_output_received(monitor: &mut CoreMonitor, output: String) -> Vec<CoreCommand> {
    monitor.output_epoch += 1;
    monitor.state.parser_started();
    trace!(epoch = monitor.output_epoch, "output received");

    let check = OutputCheck {
        epoch: monitor.output_epoch,
        current: monitor.ledger.current().cloned(),
        previous: monitor.ledger.previous().cloned(),
    };
    let mut commands = vec![CoreCommand::ArmOutputTimeout {
        check,
        after: monitor.config.output_timeout,
    }];

    if output.trim() == APP_PROCESS_ENDED {
        commands.extend(handle_app_process_ended(monitor));
    }

    commands
}

pub(crate) fn handle_test_deadline(monitor: &mut CoreMonitor, test: TestIdentity) -> Vec<CoreCommand> {
    if monitor.is_finalized() {
        return Vec::new();
    }
    if monitor.ledger.current() != Some(&test) || !monitor.state.is_suite_running() {
        trace!(test = %test, "test deadline superseded");
        return Vec::new();
    }

    error!(
        test = %test.name,
        class = %test.class,
        timeout = ?monitor.config.test_case_timeout,
        "test case exceeded its timeout"
    );
    monitor.exit = ExitClassification::TestTimeout;

    let key = monitor.test_interval(test.key());
    monitor.stats.stop_interval(&key, IntervalResult::Error);
    monitor.stats.increment(Counter::TestRuntimeTimeouts, &key);

    let message = format!(
        "Test {} timed out after {:?}",
        test, monitor.config.test_case_timeout
    );
    stop_tests_with_error_message(monitor, message, Some(test), AbortDisposition::SkipOnRetry)
}

pub(crate) fn handle_output_deadline(monitor: &mut CoreMonitor, check: OutputCheck) -> Vec<CoreCommand> {
    if monitor.is_finalized() {
        return Vec::new();
    }
    if check.epoch != monitor.output_epoch || !monitor.state.is_application_launched() {
        trace!(epoch = check.epoch, live_epoch = monitor.output_epoch, "output deadline superseded");
        return Vec::new();
    }

    let tests_started = monitor.state.did_tests_start();
    let resolved = check.resolve();

    if resolved.is_none() && monitor.state.is_suite_running() {
        error!(
            timeout = ?monitor.config.output_timeout,
            "application froze before the first test began"
        );
        monitor.exit = ExitClassification::SimulatorCrashed;
        let message = format!(
            "No output for {:?} before the first test began",
            monitor.config.output_timeout
        );
        return stop_tests_with_error_message(monitor, message, None, AbortDisposition::SkipOnRetry);
    }

    error!(
        test = %resolved.as_ref().map_or("", |t| t.name.as_str()),
        class = %resolved.as_ref().map_or("", |t| t.class.as_str()),
        timeout = ?monitor.config.output_timeout,
        tests_started,
        "no output from the application within the output timeout"
    );

    let key = match &resolved {
        Some(test) => {
            let key = monitor.test_interval(test.key());
            monitor.stats.stop_interval(&key, IntervalResult::Timeout);
            key
        }
        None => IntervalKey::run(monitor.config.attempt),
    };
    monitor.exit = if tests_started {
        ExitClassification::TestTimeout
    } else {
        ExitClassification::SimulatorCrashed
    };
    monitor.stats.increment(Counter::OutputTimeouts, &key);

    let message = format!("No output for {:?}", monitor.config.output_timeout);
    stop_tests_with_error_message(monitor, message, resolved, AbortDisposition::SkipOnRetry)
}

fn handle_app_process_ended(monitor: &mut CoreMonitor) -> Vec<CoreCommand> {
    if monitor.is_finalized() {
        return Vec::new();
    }
    if monitor.state.is_suite_completed() {
        debug!("application process ended after the suite completed");
        return Vec::new();
    }

    let current = monitor.ledger.current().cloned();
    let resolved = monitor.ledger.resolve();

    let mut disposition = AbortDisposition::SkipOnRetry;
    if let Some(test) = &current {
        if monitor.config.retry_app_crash_tests {
            info!(
                test = %test.name,
                class = %test.class,
                "application crashed during test; it stays eligible for retry"
            );
            disposition = AbortDisposition::RetryEligible;
        } else {
            monitor.ledger.record_executed(&test.name, &test.class);
        }
    }

    let key = match &resolved {
        Some(test) => {
            error!(test = %test.name, class = %test.class, "application crashed");
            let key = monitor.test_interval(test.key());
            monitor.stats.stop_interval(&key, IntervalResult::Crashed);
            key
        }
        None => {
            error!("application crashed before any test began");
            IntervalKey::run(monitor.config.attempt)
        }
    };

    monitor.exit = if resolved.is_none() && monitor.state.is_application_launched() {
        ExitClassification::SimulatorCrashed
    } else {
        ExitClassification::AppCrashed
    };
    monitor.stats.increment(Counter::AppCrashes, &key);

    stop_tests_with_error_message(monitor, "App crashed".to_string(), resolved, disposition)
}
