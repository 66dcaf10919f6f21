// src/engine/ledger.rs

//! Test lifecycle ledger.
//!
//! Tracks which test is running now, which one ran last, which tests reached
//! a terminal disposition this attempt and which ones were already counted
//! as failed.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::skip::SkipList;
use crate::types::{TestIdentity, test_key};

#[derive(Debug)]
pub struct TestLedger {
    current: Option<TestIdentity>,
    /// Last test that was current. Kept after `current` is cleared so late
    /// crash and hang signals can still be attributed.
    previous: Option<TestIdentity>,
    executed: BTreeSet<String>,
    failed: HashSet<String>,
    failure_count: usize,
    started_at: HashMap<String, Instant>,
    skip_list: SkipList,
}

impl TestLedger {
    pub fn new(skip_list: SkipList) -> Self {
        Self {
            current: None,
            previous: None,
            executed: BTreeSet::new(),
            failed: HashSet::new(),
            failure_count: 0,
            started_at: HashMap::new(),
            skip_list,
        }
    }

    pub fn current(&self) -> Option<&TestIdentity> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&TestIdentity> {
        self.previous.as_ref()
    }

    /// Current test, else the previous one.
    pub fn resolve(&self) -> Option<TestIdentity> {
        self.current.clone().or_else(|| self.previous.clone())
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    pub fn executed(&self) -> impl Iterator<Item = &str> {
        self.executed.iter().map(String::as_str)
    }

    pub fn was_executed(&self, key: &str) -> bool {
        self.executed.contains(key)
    }

    pub(crate) fn begin(&mut self, test: TestIdentity) {
        self.started_at.insert(test.key(), Instant::now());
        self.current = Some(test);
    }

    /// Wall time since `key` began, if it did.
    pub(crate) fn elapsed_since_start(&self, key: &str) -> Option<Duration> {
        self.started_at.get(key).map(Instant::elapsed)
    }

    /// Promote the current test to previous and clear current.
    pub(crate) fn finish_current(&mut self) {
        if let Some(test) = self.current.take() {
            self.previous = Some(test);
        }
    }

    /// Record a failure for `key`. Returns `false` if it was already
    /// counted, in which case nothing changes.
    pub(crate) fn record_failure(&mut self, key: &str) -> bool {
        if !self.failed.insert(key.to_string()) {
            return false;
        }
        self.failure_count += 1;
        true
    }

    /// Add `"class/name"` to the executed set and to the shared skip list.
    ///
    /// An empty name or class is logged and ignored.
    pub(crate) fn record_executed(&mut self, name: &str, class: &str) -> bool {
        if name.is_empty() || class.is_empty() {
            warn!(
                test = %name,
                class = %class,
                "refusing to record test with empty name or class as executed"
            );
            return false;
        }

        let key = test_key(name, class);
        let inserted = self.executed.insert(key.clone());
        if self.skip_list.insert(&key) {
            debug!(test = %key, "added to tests to skip on the next attempt");
        }
        inserted
    }
}
