#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use testwatch::config::RunConfig;
use testwatch::engine::CoreMonitor;
use testwatch::skip::SkipList;
use testwatch::stats::MemoryStats;

/// Builder for `RunConfig` to simplify test setup.
///
/// Defaults: 10s per-test timeout, 30s output timeout, process control on,
/// no diagnostics command.
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RunConfig {
                test_case_timeout: Duration::from_secs(10),
                output_timeout: Duration::from_secs(30),
                diagnostics_timeout: Duration::from_secs(1),
                output_dir: PathBuf::from("target/testwatch-test-output"),
                ..RunConfig::default()
            },
        }
    }

    pub fn attempt(mut self, attempt: u32) -> Self {
        self.config.attempt = attempt;
        self
    }

    pub fn test_case_timeout(mut self, timeout: Duration) -> Self {
        self.config.test_case_timeout = timeout;
        self
    }

    pub fn output_timeout(mut self, timeout: Duration) -> Self {
        self.config.output_timeout = timeout;
        self
    }

    pub fn only_retry_failed(mut self, val: bool) -> Self {
        self.config.only_retry_failed = val;
        self
    }

    pub fn retry_app_crash_tests(mut self, val: bool) -> Self {
        self.config.retry_app_crash_tests = val;
        self
    }

    pub fn process_control(mut self, val: bool) -> Self {
        self.config.process_control = val;
        self
    }

    pub fn skip_list(mut self, list: SkipList) -> Self {
        self.config.tests_to_skip = list;
        self
    }

    pub fn build(self) -> RunConfig {
        self.config
    }

    /// Build a core monitor over this config with a fresh in-memory recorder.
    pub fn build_monitor(self) -> (CoreMonitor, Arc<MemoryStats>) {
        let stats = Arc::new(MemoryStats::new());
        let monitor = CoreMonitor::new(self.config, stats.clone());
        (monitor, stats)
    }
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
