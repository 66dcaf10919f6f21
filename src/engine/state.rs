// src/engine/state.rs

//! Execution state tracker: three independent lifecycles plus the derived
//! predicates the rest of the engine asks about.

use tracing::debug;

use crate::types::LifecycleState;

/// Application, output-parser and test-suite lifecycles.
///
/// `Copy` so that a consistent snapshot can be published to other tasks
/// after every step; the predicates are plain reads of that snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionState {
    pub application: LifecycleState,
    pub parser: LifecycleState,
    pub suite: LifecycleState,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// All three lifecycles have reached `Completed`.
    pub fn is_execution_complete(&self) -> bool {
        self.application == LifecycleState::Completed
            && self.parser == LifecycleState::Completed
            && self.suite == LifecycleState::Completed
    }

    pub fn is_application_launched(&self) -> bool {
        self.application == LifecycleState::Running
    }

    pub fn did_tests_start(&self) -> bool {
        self.suite.has_started()
    }

    pub fn is_suite_running(&self) -> bool {
        self.suite == LifecycleState::Running
    }

    pub fn is_suite_completed(&self) -> bool {
        self.suite == LifecycleState::Completed
    }

    pub(crate) fn application_launched(&mut self) {
        if self.application == LifecycleState::Idle {
            self.application = LifecycleState::Running;
            debug!("application state -> Running");
        }
    }

    pub(crate) fn application_exited(&mut self) {
        self.application = LifecycleState::Completed;
        debug!("application state -> Completed");
    }

    /// Idle -> Running. A suite that already completed (for example after an
    /// abort) stays completed.
    pub(crate) fn suite_started(&mut self) {
        if self.suite == LifecycleState::Idle {
            self.suite = LifecycleState::Running;
            debug!("suite state -> Running");
        }
    }

    pub(crate) fn suite_completed(&mut self) {
        self.suite = LifecycleState::Completed;
        debug!("suite state -> Completed");
    }

    /// First output seen: the parser is now consuming.
    pub(crate) fn parser_started(&mut self) {
        if self.parser == LifecycleState::Idle {
            self.parser = LifecycleState::Running;
        }
    }

    pub(crate) fn parser_completed(&mut self) {
        self.parser = LifecycleState::Completed;
        debug!("parser state -> Completed");
    }
}
