use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use testwatch::errors::{Result, TestwatchError};
use testwatch::process::ProcessControl;

#[derive(Debug, Default)]
pub struct FakeProcessLog {
    pub captured: Vec<u32>,
    pub terminated: Vec<u32>,
    pub exists: bool,
    pub fail_terminate: bool,
    /// If set, diagnostics capture sleeps this long before returning.
    pub capture_delay: Option<Duration>,
}

/// A fake process control that:
/// - records which pids were sampled and terminated
/// - reports the process as alive until terminated (configurable)
#[derive(Debug, Clone)]
pub struct FakeProcessControl {
    log: Arc<Mutex<FakeProcessLog>>,
}

impl FakeProcessControl {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(FakeProcessLog {
                exists: true,
                ..FakeProcessLog::default()
            })),
        }
    }

    pub fn failing_terminate(self) -> Self {
        self.log.lock().unwrap().fail_terminate = true;
        self
    }

    pub fn already_exited(self) -> Self {
        self.log.lock().unwrap().exists = false;
        self
    }

    pub fn with_capture_delay(self, delay: Duration) -> Self {
        self.log.lock().unwrap().capture_delay = Some(delay);
        self
    }

    pub fn captured(&self) -> Vec<u32> {
        self.log.lock().unwrap().captured.clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.log.lock().unwrap().terminated.clone()
    }
}

impl Default for FakeProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessControl for FakeProcessControl {
    fn capture_diagnostics(
        &mut self,
        pid: u32,
        _output_dir: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let log = Arc::clone(&self.log);

        Box::pin(async move {
            let delay = {
                let mut guard = log.lock().unwrap();
                guard.captured.push(pid);
                guard.capture_delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(())
        })
    }

    fn exists(&self, _pid: u32) -> bool {
        self.log.lock().unwrap().exists
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        let mut guard = self.log.lock().unwrap();
        guard.terminated.push(pid);
        if guard.fail_terminate {
            return Err(TestwatchError::Process {
                pid,
                message: "simulated kill failure".to_string(),
            });
        }
        guard.exists = false;
        Ok(())
    }
}
