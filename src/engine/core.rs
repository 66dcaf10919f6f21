// src/engine/core.rs

//! Pure core monitor state machine.
//!
//! This module contains a synchronous, deterministic "core monitor" that
//! consumes [`MonitorEvent`]s and produces:
//! - an updated core state
//! - a list of commands describing what the IO shell should do next
//!   (arm deadlines, sample and kill the application, fire the abort
//!   callback)
//!
//! The async shell (`engine::runtime::MonitorRuntime`) reads events from the
//! channel, runs timers and talks to the process. Events are handled one at
//! a time, so every handler and every deadline check sees a consistent
//! snapshot and no locking is needed here.

use std::fmt;
use std::sync::Arc;

use crate::config::RunConfig;
use crate::engine::abort::AbortNotice;
use crate::engine::event_handlers::{
    CoreStep, handle_all_tests_began, handle_all_tests_ended, handle_application_exited,
    handle_application_launched, handle_parser_completed, handle_test_case_began,
    handle_test_case_failed, handle_test_case_passed, handle_test_suite_began,
    handle_test_suite_ended,
};
use crate::engine::ledger::TestLedger;
use crate::engine::state::ExecutionState;
use crate::engine::watchdog::{handle_output_deadline, handle_output_received, handle_test_deadline};
use crate::engine::MonitorEvent;
use crate::stats::{IntervalKey, StatsRecorder};
use crate::types::ExitClassification;

/// Point-in-time view of a run, published after every step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSnapshot {
    pub state: ExecutionState,
    pub exit: ExitClassification,
    pub failure_count: usize,
    pub finalized: bool,
}

/// Pure core monitor state for one run attempt.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
pub struct CoreMonitor {
    pub(crate) config: RunConfig,
    pub(crate) state: ExecutionState,
    pub(crate) ledger: TestLedger,
    /// Bumped on every output chunk.
    pub(crate) output_epoch: u64,
    pub(crate) exit: ExitClassification,
    pub(crate) app_pid: Option<u32>,
    /// Set by the abort sequencer; `Some` means the run is finalized.
    pub(crate) aborted: Option<AbortNotice>,
    pub(crate) stats: Arc<dyn StatsRecorder>,
    shutdown_requested: bool,
}

impl fmt::Debug for CoreMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreMonitor")
            .field("state", &self.state)
            .field("ledger", &self.ledger)
            .field("output_epoch", &self.output_epoch)
            .field("exit", &self.exit)
            .field("app_pid", &self.app_pid)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

impl CoreMonitor {
    pub fn new(config: RunConfig, stats: Arc<dyn StatsRecorder>) -> Self {
        let ledger = TestLedger::new(config.tests_to_skip.clone());
        Self {
            config,
            state: ExecutionState::new(),
            ledger,
            output_epoch: 0,
            exit: ExitClassification::Unset,
            app_pid: None,
            aborted: None,
            stats,
            shutdown_requested: false,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn ledger(&self) -> &TestLedger {
        &self.ledger
    }

    pub fn exit_classification(&self) -> ExitClassification {
        self.exit
    }

    pub fn failure_count(&self) -> usize {
        self.ledger.failure_count()
    }

    pub fn output_epoch(&self) -> u64 {
        self.output_epoch
    }

    /// The abort decision, if the run was aborted.
    pub fn aborted(&self) -> Option<&AbortNotice> {
        self.aborted.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn snapshot(&self) -> ExecutionSnapshot {
        ExecutionSnapshot {
            state: self.state,
            exit: self.exit,
            failure_count: self.ledger.failure_count(),
            finalized: self.is_finalized(),
        }
    }

    pub(crate) fn test_interval(&self, key: String) -> IntervalKey {
        IntervalKey::test(self.config.attempt, key)
    }

    /// Handle a single monitor event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: MonitorEvent) -> CoreStep {
        let commands = match event {
            MonitorEvent::ApplicationLaunched { pid } => handle_application_launched(self, pid),
            MonitorEvent::ApplicationExited => handle_application_exited(self),
            MonitorEvent::AllTestsBegan => handle_all_tests_began(self),
            MonitorEvent::AllTestsEnded => handle_all_tests_ended(self),
            MonitorEvent::TestSuiteBegan {
                name,
                started_at,
                is_root,
            } => handle_test_suite_began(self, name, started_at, is_root),
            MonitorEvent::TestSuiteEnded { name, is_root } => {
                handle_test_suite_ended(self, name, is_root)
            }
            MonitorEvent::TestCaseBegan { name, class } => handle_test_case_began(self, name, class),
            MonitorEvent::TestCasePassed {
                name,
                class,
                duration,
            } => handle_test_case_passed(self, name, class, duration),
            MonitorEvent::TestCaseFailed {
                name,
                class,
                file,
                line,
                was_exception,
            } => handle_test_case_failed(self, name, class, file, line, was_exception),
            MonitorEvent::OutputReceived { output } => handle_output_received(self, output),
            MonitorEvent::ParserCompleted => handle_parser_completed(self),
            MonitorEvent::TestDeadlineElapsed { test } => handle_test_deadline(self, test),
            MonitorEvent::OutputDeadlineElapsed(check) => handle_output_deadline(self, check),
            MonitorEvent::ShutdownRequested => {
                self.shutdown_requested = true;
                Vec::new()
            }
        };

        CoreStep {
            commands,
            keep_running: !self.shutdown_requested && !self.state.is_execution_complete(),
        }
    }
}
