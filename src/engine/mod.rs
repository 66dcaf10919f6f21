// src/engine/mod.rs

//! Test-execution watchdog engine.
//!
//! This module ties together:
//! - the execution state tracker (application / parser / suite lifecycles)
//! - the test lifecycle ledger (current and previous test, executed and
//!   failed sets)
//! - the watchdog deadlines (per-test timeout, output staleness, crash
//!   sentinel)
//! - the abort sequencer that finalizes a run exactly once
//!
//! The pure core state machine lives in [`core`]; the async/IO shell that
//! owns the event channel, timers and process control is implemented in
//! [`runtime`].

use std::time::{Duration, SystemTime};

use crate::types::TestIdentity;

/// Events flowing into the monitor from the output parser, the process
/// driver and the monitor's own deadline timers.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// The application process is up.
    ApplicationLaunched { pid: u32 },
    /// The application process is gone.
    ApplicationExited,
    AllTestsBegan,
    AllTestsEnded,
    /// A suite grouping started.
    TestSuiteBegan {
        name: String,
        started_at: SystemTime,
        is_root: bool,
    },
    TestSuiteEnded { name: String, is_root: bool },
    TestCaseBegan { name: String, class: String },
    TestCasePassed {
        name: String,
        class: String,
        duration: Duration,
    },
    TestCaseFailed {
        name: String,
        class: String,
        file: String,
        line: u32,
        was_exception: bool,
    },
    /// A raw chunk of console output, possibly the crash sentinel.
    OutputReceived { output: String },
    /// The output parser has consumed everything it will ever see.
    ParserCompleted,
    /// A per-test deadline armed for `test` has elapsed.
    TestDeadlineElapsed { test: TestIdentity },
    /// An output-staleness deadline has elapsed.
    OutputDeadlineElapsed(OutputCheck),
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod abort;
pub mod core;
pub mod event_handlers;
pub mod ledger;
pub mod runtime;
pub mod state;
pub mod watchdog;

pub use abort::{AbortDisposition, AbortHandler, AbortNotice, LoggingAbortHandler};
pub use self::core::{CoreMonitor, ExecutionSnapshot};
pub use event_handlers::{CoreCommand, CoreStep};
pub use ledger::TestLedger;
pub use runtime::{MonitorHandle, MonitorRuntime, RunReport};
pub use state::ExecutionState;
pub use watchdog::{APP_PROCESS_ENDED, OutputCheck};
