// src/skip.rs

//! Shared registry of tests to exclude from the next attempt.
//!
//! The list is owned by whoever orchestrates retries and survives across
//! attempts. The monitor core is its only writer and only ever appends.
//! Readers should take a [`SkipList::snapshot`] after the run has been
//! observed `Completed` (see `MonitorHandle::wait_for_suite_completed`);
//! by then every append of that attempt has landed.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Default)]
pub struct SkipList {
    inner: Arc<RwLock<BTreeSet<String>>>,
}

impl SkipList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a list from identifiers carried over from a previous attempt.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        Self {
            inner: Arc::new(RwLock::new(set)),
        }
    }

    /// Union `key` into the list. Returns `true` if it was not present.
    pub(crate) fn insert(&self, key: &str) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy of the current contents.
    pub fn snapshot(&self) -> Vec<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.iter().cloned().collect()
    }
}
