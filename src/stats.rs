// src/stats.rs

//! Interval and counter reporting.
//!
//! The monitor reports named intervals (run, suite, test) and counters to a
//! [`StatsRecorder`]. Storage and aggregation belong to the recorder; the
//! monitor only starts, stops and increments.
//!
//! [`MemoryStats`] is the bundled recorder. It keeps everything in memory
//! and is what the CLI summary and the tests read from.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Result label attached to a stopped interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalResult {
    Passed,
    Failed,
    Crashed,
    Timeout,
    Error,
    Info,
}

impl fmt::Display for IntervalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IntervalResult::Passed => "PASSED",
            IntervalResult::Failed => "FAILED",
            IntervalResult::Crashed => "CRASHED",
            IntervalResult::Timeout => "TIMEOUT",
            IntervalResult::Error => "ERROR",
            IntervalResult::Info => "INFO",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    TestsAttempted,
    TestRuntimeTimeouts,
    TestErrors,
    TestFailures,
    AppCrashes,
    OutputTimeouts,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IntervalScope {
    /// The whole physical run, across attempts.
    Run,
    /// A test suite grouping, by name.
    Suite(String),
    /// A single test case, as `"class/name"`.
    Test(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntervalKey {
    pub attempt: u32,
    pub scope: IntervalScope,
}

impl IntervalKey {
    pub fn run(attempt: u32) -> Self {
        Self {
            attempt,
            scope: IntervalScope::Run,
        }
    }

    pub fn suite(attempt: u32, name: &str) -> Self {
        Self {
            attempt,
            scope: IntervalScope::Suite(name.to_string()),
        }
    }

    pub fn test(attempt: u32, key: String) -> Self {
        Self {
            attempt,
            scope: IntervalScope::Test(key),
        }
    }
}

/// Sink for named intervals and counters.
///
/// Methods take `&self` so a recorder can be shared between the monitor and
/// whoever reads the numbers afterwards.
pub trait StatsRecorder: Send + Sync {
    /// Start the run-wide interval. Called on every attempt; implementations
    /// must only start it once per physical run.
    fn start_run(&self, attempt: u32);

    fn stop_run(&self, attempt: u32, result: IntervalResult);

    fn start_interval(&self, key: &IntervalKey);

    fn stop_interval(&self, key: &IntervalKey, result: IntervalResult);

    fn increment(&self, counter: Counter, key: &IntervalKey);
}

/// A finished interval as recorded by [`MemoryStats`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedInterval {
    pub key: IntervalKey,
    pub result: IntervalResult,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct MemoryStatsInner {
    run_started: Option<Instant>,
    run_result: Option<IntervalResult>,
    open: HashMap<IntervalKey, Instant>,
    finished: Vec<FinishedInterval>,
    counters: HashMap<Counter, u64>,
}

#[derive(Debug, Default)]
pub struct MemoryStats {
    inner: Mutex<MemoryStatsInner>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut MemoryStatsInner) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        self.with_inner(|s| s.counters.get(&counter).copied().unwrap_or(0))
    }

    pub fn finished_intervals(&self) -> Vec<FinishedInterval> {
        self.with_inner(|s| s.finished.clone())
    }

    /// Result of the most recently stopped interval for `key`, if any.
    pub fn result_of(&self, key: &IntervalKey) -> Option<IntervalResult> {
        self.with_inner(|s| {
            s.finished
                .iter()
                .rev()
                .find(|i| &i.key == key)
                .map(|i| i.result)
        })
    }

    pub fn run_started(&self) -> bool {
        self.with_inner(|s| s.run_started.is_some())
    }

    pub fn run_result(&self) -> Option<IntervalResult> {
        self.with_inner(|s| s.run_result)
    }
}

impl StatsRecorder for MemoryStats {
    fn start_run(&self, attempt: u32) {
        self.with_inner(|s| {
            if s.run_started.is_none() {
                debug!(attempt, "starting run interval");
                s.run_started = Some(Instant::now());
            }
        });
    }

    fn stop_run(&self, attempt: u32, result: IntervalResult) {
        self.with_inner(|s| {
            let elapsed = s.run_started.map(|t| t.elapsed()).unwrap_or_default();
            s.run_result = Some(result);
            s.finished.push(FinishedInterval {
                key: IntervalKey::run(attempt),
                result,
                elapsed,
            });
        });
    }

    fn start_interval(&self, key: &IntervalKey) {
        self.with_inner(|s| {
            s.open.insert(key.clone(), Instant::now());
        });
    }

    fn stop_interval(&self, key: &IntervalKey, result: IntervalResult) {
        self.with_inner(|s| {
            let elapsed = s
                .open
                .remove(key)
                .map(|t| t.elapsed())
                .unwrap_or_default();
            s.finished.push(FinishedInterval {
                key: key.clone(),
                result,
                elapsed,
            });
        });
    }

    fn increment(&self, counter: Counter, _key: &IntervalKey) {
        self.with_inner(|s| {
            *s.counters.entry(counter).or_insert(0) += 1;
        });
    }
}
