use std::sync::{Arc, Mutex};

use testwatch::engine::{AbortHandler, AbortNotice};

/// Abort handler that records every notice it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingAbortHandler {
    notices: Arc<Mutex<Vec<AbortNotice>>>,
}

impl RecordingAbortHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<AbortNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl AbortHandler for RecordingAbortHandler {
    fn on_test_aborted(&mut self, notice: &AbortNotice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}
