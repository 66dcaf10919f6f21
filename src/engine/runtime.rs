// src/engine/runtime.rs

use std::fmt;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::engine::abort::{AbortHandler, AbortNotice};
use crate::engine::core::{CoreMonitor, ExecutionSnapshot};
use crate::engine::event_handlers::CoreCommand;
use crate::engine::state::ExecutionState;
use crate::engine::MonitorEvent;
use crate::errors::{Result, TestwatchError};
use crate::process::ProcessControl;
use crate::types::ExitClassification;

/// Final outcome of one monitored run attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub exit: ExitClassification,
    pub state: ExecutionState,
    pub failure_count: usize,
    /// Tests that reached a terminal disposition this attempt.
    pub executed: Vec<String>,
    pub aborted: Option<AbortNotice>,
}

/// Cloneable entry point for feeding events in and observing state.
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    events: mpsc::Sender<MonitorEvent>,
    state: watch::Receiver<ExecutionSnapshot>,
}

impl MonitorHandle {
    pub fn sender(&self) -> mpsc::Sender<MonitorEvent> {
        self.events.clone()
    }

    pub async fn send(&self, event: MonitorEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| TestwatchError::ChannelClosed)
    }

    /// Latest published snapshot. Never blocks on the event loop.
    pub fn snapshot(&self) -> ExecutionSnapshot {
        *self.state.borrow()
    }

    /// Resolve once the suite has reached `Completed`.
    ///
    /// Every skip-list append of the attempt happens before the step that
    /// publishes this snapshot, so the list is safe to read afterwards.
    pub async fn wait_for_suite_completed(&self) -> Result<ExecutionSnapshot> {
        let mut rx = self.state.clone();
        let snapshot = rx
            .wait_for(|s| s.state.is_suite_completed())
            .await
            .map_err(|_| TestwatchError::ChannelClosed)?;
        Ok(*snapshot)
    }
}

/// Drives the core monitor in response to `MonitorEvent`s, runs its
/// deadlines, and delegates process control and the abort callback.
///
/// This is a pure IO shell around `CoreMonitor`, which contains all the
/// watchdog semantics.
pub struct MonitorRuntime<P: ProcessControl, H: AbortHandler> {
    core: CoreMonitor,
    event_rx: mpsc::Receiver<MonitorEvent>,
    /// Deadline timers post back through this. Weak, so pending timers do
    /// not keep the channel open once every real producer is gone.
    deadline_tx: mpsc::WeakSender<MonitorEvent>,
    state_tx: watch::Sender<ExecutionSnapshot>,
    /// The one pending output-staleness timer. Re-arming replaces it, so a
    /// chatty application never piles up sleeping tasks.
    output_timer: Option<JoinHandle<()>>,
    process: P,
    abort_handler: H,
}

impl<P: ProcessControl, H: AbortHandler> fmt::Debug for MonitorRuntime<P, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorRuntime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<P: ProcessControl, H: AbortHandler> MonitorRuntime<P, H> {
    pub fn new(
        core: CoreMonitor,
        process: P,
        abort_handler: H,
        capacity: usize,
    ) -> (Self, MonitorHandle) {
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (state_tx, state_rx) = watch::channel(core.snapshot());

        let runtime = Self {
            core,
            event_rx,
            deadline_tx: event_tx.downgrade(),
            state_tx,
            output_timer: None,
            process,
            abort_handler,
        };
        let handle = MonitorHandle {
            events: event_tx,
            state: state_rx,
        };
        (runtime, handle)
    }

    /// Main event loop.
    ///
    /// - Consumes `MonitorEvent`s one at a time.
    /// - Feeds them into the core monitor.
    /// - Executes commands returned by the core, in order.
    /// - Publishes a fresh snapshot after every step.
    pub async fn run(mut self) -> Result<RunReport> {
        info!(attempt = self.core.config().attempt, "testwatch monitor started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("monitor event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "monitor received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await;
            }

            self.state_tx.send_replace(self.core.snapshot());

            if !step.keep_running {
                info!("execution complete; stopping monitor");
                break;
            }
        }

        if let Some(timer) = self.output_timer.take() {
            timer.abort();
        }

        let report = RunReport {
            exit: self.core.exit_classification(),
            state: self.core.state(),
            failure_count: self.core.failure_count(),
            executed: self.core.ledger().executed().map(str::to_string).collect(),
            aborted: self.core.aborted().cloned(),
        };
        info!(exit = %report.exit, failures = report.failure_count, "monitor exiting");
        Ok(report)
    }

    async fn execute_command(&mut self, command: CoreCommand) {
        match command {
            CoreCommand::ArmTestTimeout { test, after } => {
                self.schedule(after, MonitorEvent::TestDeadlineElapsed { test });
            }
            CoreCommand::ArmOutputTimeout { check, after } => {
                let timer = self.schedule(after, MonitorEvent::OutputDeadlineElapsed(check));
                if let Some(superseded) = self.output_timer.replace(timer) {
                    superseded.abort();
                }
            }
            CoreCommand::CaptureDiagnostics {
                pid,
                output_dir,
                time_box,
            } => {
                match timeout(time_box, self.process.capture_diagnostics(pid, output_dir)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(pid, error = %e, "diagnostics capture failed"),
                    Err(_) => warn!(pid, ?time_box, "diagnostics capture timed out"),
                }
            }
            CoreCommand::TerminateProcess { pid } => {
                if !self.process.exists(pid) {
                    debug!(pid, "application already gone; nothing to terminate");
                } else if let Err(e) = self.process.terminate(pid) {
                    warn!(pid, error = %e, "failed to terminate application");
                } else {
                    info!(pid, "application terminated");
                }
            }
            CoreCommand::NotifyAborted(notice) => {
                self.abort_handler.on_test_aborted(&notice);
            }
        }
    }

    /// Post `event` back onto the monitor channel after `after`.
    fn schedule(&self, after: std::time::Duration, event: MonitorEvent) -> JoinHandle<()> {
        let tx = self.deadline_tx.clone();
        tokio::spawn(async move {
            sleep(after).await;
            match tx.upgrade() {
                Some(tx) => {
                    let _ = tx.send(event).await;
                }
                None => debug!("monitor gone before deadline elapsed"),
            }
        })
    }
}
