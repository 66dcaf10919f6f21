// src/engine/abort.rs

//! Abort sequencer: the single code path that finalizes an aborted run.
//!
//! Whatever trips first (per-test timeout, output staleness, crash sentinel)
//! ends up in [`stop_tests_with_error_message`]. The first call latches the
//! run as finalized; later calls are no-ops, so the abort callback fires and
//! the application is terminated at most once per run.

use tracing::{debug, error, info, warn};

use crate::engine::core::CoreMonitor;
use crate::engine::event_handlers::CoreCommand;
use crate::types::TestIdentity;

/// Whether the aborted test should be excluded from the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbortDisposition {
    /// Add the test to the skip list unless `only_retry_failed` is set.
    #[default]
    SkipOnRetry,
    /// Leave the test eligible for the next attempt.
    RetryEligible,
}

/// What the abort callback receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortNotice {
    /// `None` when nothing could be attributed (e.g. a crash before the
    /// first test began).
    pub test: Option<TestIdentity>,
    pub message: String,
}

impl AbortNotice {
    /// Test name, or `""` when unattributed.
    pub fn name(&self) -> &str {
        self.test.as_ref().map_or("", |t| t.name.as_str())
    }

    /// Test class, or `""` when unattributed.
    pub fn class(&self) -> &str {
        self.test.as_ref().map_or("", |t| t.class.as_str())
    }
}

/// Receives the abort decision. Invoked at most once per run.
pub trait AbortHandler: Send {
    fn on_test_aborted(&mut self, notice: &AbortNotice);
}

/// Abort handler used by the CLI: reports the abort through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingAbortHandler;

impl AbortHandler for LoggingAbortHandler {
    fn on_test_aborted(&mut self, notice: &AbortNotice) {
        error!(
            test = %notice.name(),
            class = %notice.class(),
            reason = %notice.message,
            "test run aborted"
        );
    }
}

/// Finalize the run for `test` with `message`.
///
/// The caller sets the exit classification before calling this; it is never
/// touched here.
pub(crate) fn stop_tests_with_error_message(
    monitor: &mut CoreMonitor,
    message: String,
    test: Option<TestIdentity>,
    disposition: AbortDisposition,
) -> Vec<CoreCommand> {
    if let Some(earlier) = &monitor.aborted {
        debug!(
            reason = %message,
            earlier_reason = %earlier.message,
            "run already finalized; ignoring further abort request"
        );
        return Vec::new();
    }

    let mut commands = Vec::new();

    if disposition == AbortDisposition::SkipOnRetry && !monitor.config.only_retry_failed {
        match &test {
            Some(t) => {
                monitor.ledger.record_executed(&t.name, &t.class);
            }
            None => debug!("aborted without a test identity; nothing to skip next attempt"),
        }
    }

    if monitor.state.is_application_launched() && monitor.config.process_control {
        match monitor.app_pid {
            Some(pid) => {
                info!(pid, "capturing diagnostics and terminating application");
                commands.push(CoreCommand::CaptureDiagnostics {
                    pid,
                    output_dir: monitor.config.output_dir.clone(),
                    time_box: monitor.config.diagnostics_timeout,
                });
                commands.push(CoreCommand::TerminateProcess { pid });
            }
            None => warn!("application is running but its pid is unknown; cannot terminate it"),
        }
    }

    monitor.state.suite_completed();

    let notice = AbortNotice { test, message };
    monitor.aborted = Some(notice.clone());
    commands.push(CoreCommand::NotifyAborted(notice));

    commands
}
