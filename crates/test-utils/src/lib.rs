//! Shared fixtures for the `testwatch` integration tests.
//!
//! - [`builders::RunConfigBuilder`] builds a `RunConfig` (or a ready
//!   `CoreMonitor`) with short test-friendly timeouts.
//! - [`fake_process::FakeProcessControl`] records sampling and kills
//!   instead of touching real processes.
//! - [`recording_handler::RecordingAbortHandler`] keeps every abort notice.

pub mod builders;
pub mod fake_process;
pub mod recording_handler;

use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

static TRACING: OnceLock<()> = OnceLock::new();

/// Install a test-writer subscriber once per test binary.
///
/// Captured output only shows for failing tests. Set `RUST_LOG`
/// (e.g. `RUST_LOG=testwatch=trace`) to see the monitor's decisions.
pub fn init_tracing() {
    TRACING.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("testwatch=debug,warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Cap on how long a test may wait for the monitor or the driver.
pub const TEST_DEADLINE: Duration = Duration::from_secs(30);

/// Await `f`, failing the test if it has not finished within
/// [`TEST_DEADLINE`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .unwrap_or_else(|_| panic!("monitor did not finish within {TEST_DEADLINE:?}"))
}
