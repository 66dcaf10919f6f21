// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::skip::SkipList;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [run]
/// attempt = 1
/// test_case_timeout = "300s"
/// output_timeout = "120s"
/// only_retry_failed = false
/// retry_app_crash_tests = false
/// output_dir = "testwatch-output"
/// process_control = true
/// diagnostics_cmd = "sample {pid} 1"
/// diagnostics_timeout = "10s"
/// tests_to_skip = ["LoginTests/testLogout"]
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RawRunSection,
}

/// `[run]` section, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRunSection {
    /// 1-based attempt number, used to key stats.
    #[serde(default = "default_attempt")]
    pub attempt: u32,

    /// How long a single test case may run before it counts as stuck.
    #[serde(default = "default_test_case_timeout")]
    pub test_case_timeout: String,

    /// How long the application may stay silent before it counts as frozen.
    #[serde(default = "default_output_timeout")]
    pub output_timeout: String,

    #[serde(default)]
    pub only_retry_failed: bool,

    #[serde(default)]
    pub retry_app_crash_tests: bool,

    /// Where diagnostic captures are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Set to `false` to never sample or kill the application process.
    #[serde(default = "default_process_control")]
    pub process_control: bool,

    /// Shell command used to capture a stack sample on abort. `{pid}` is
    /// replaced by the application pid; stdout goes to a file in
    /// `output_dir`.
    #[serde(default)]
    pub diagnostics_cmd: Option<String>,

    #[serde(default = "default_diagnostics_timeout")]
    pub diagnostics_timeout: String,

    /// Tests already excluded by earlier attempts, as `"class/name"`.
    #[serde(default)]
    pub tests_to_skip: Vec<String>,
}

fn default_attempt() -> u32 {
    1
}

fn default_test_case_timeout() -> String {
    "300s".to_string()
}

fn default_output_timeout() -> String {
    "120s".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("testwatch-output")
}

fn default_process_control() -> bool {
    true
}

fn default_diagnostics_timeout() -> String {
    "10s".to_string()
}

impl Default for RawRunSection {
    fn default() -> Self {
        Self {
            attempt: default_attempt(),
            test_case_timeout: default_test_case_timeout(),
            output_timeout: default_output_timeout(),
            only_retry_failed: false,
            retry_app_crash_tests: false,
            output_dir: default_output_dir(),
            process_control: default_process_control(),
            diagnostics_cmd: None,
            diagnostics_timeout: default_diagnostics_timeout(),
            tests_to_skip: Vec::new(),
        }
    }
}

/// Validated configuration.
///
/// Construct it through `ConfigFile::try_from(raw)` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunConfig) -> Self {
        Self { run }
    }
}

/// Per-attempt run configuration consumed by the monitor.
///
/// Read-only for the monitor, except for `tests_to_skip`, which it appends
/// to.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub attempt: u32,
    pub test_case_timeout: Duration,
    pub output_timeout: Duration,
    pub only_retry_failed: bool,
    pub retry_app_crash_tests: bool,
    pub output_dir: PathBuf,
    pub process_control: bool,
    pub diagnostics_cmd: Option<String>,
    pub diagnostics_timeout: Duration,
    pub tests_to_skip: SkipList,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            attempt: default_attempt(),
            test_case_timeout: Duration::from_secs(300),
            output_timeout: Duration::from_secs(120),
            only_retry_failed: false,
            retry_app_crash_tests: false,
            output_dir: default_output_dir(),
            process_control: default_process_control(),
            diagnostics_cmd: None,
            diagnostics_timeout: Duration::from_secs(10),
            tests_to_skip: SkipList::new(),
        }
    }
}
