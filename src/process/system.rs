// src/process/system.rs

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::{Result, TestwatchError};
use crate::process::ProcessControl;

/// Production process control.
#[derive(Debug, Clone, Default)]
pub struct SystemProcessControl {
    /// Shell command with a `{pid}` placeholder; `None` disables capture.
    diagnostics_cmd: Option<String>,
}

impl SystemProcessControl {
    pub fn new(diagnostics_cmd: Option<String>) -> Self {
        Self { diagnostics_cmd }
    }
}

impl ProcessControl for SystemProcessControl {
    fn capture_diagnostics(
        &mut self,
        pid: u32,
        output_dir: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let template = self.diagnostics_cmd.clone();

        Box::pin(async move {
            let Some(template) = template else {
                debug!(pid, "no diagnostics command configured; skipping capture");
                return Ok(());
            };
            let command_line = template.replace("{pid}", &pid.to_string());

            tokio::fs::create_dir_all(&output_dir)
                .await
                .with_context(|| format!("creating diagnostics dir {:?}", output_dir))?;

            let mut cmd = shell_command(&command_line);
            cmd.stdout(Stdio::piped())
                .stderr(Stdio::null())
                .kill_on_drop(true);

            info!(pid, cmd = %command_line, "capturing application diagnostics");
            let output = cmd
                .output()
                .await
                .with_context(|| format!("running diagnostics command '{command_line}'"))?;

            let path = output_dir.join(format!("diagnostics-{pid}.txt"));
            tokio::fs::write(&path, &output.stdout)
                .await
                .with_context(|| format!("writing diagnostics to {:?}", path))?;

            debug!(pid, path = %path.display(), success = output.status.success(), "diagnostics written");
            Ok(())
        })
    }

    fn exists(&self, pid: u32) -> bool {
        pid_exists(pid)
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        kill_pid(pid)
    }
}

/// Build a shell command appropriate for the platform.
pub(crate) fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_line);
        c
    }
}

#[cfg(unix)]
fn to_pid_t(pid: u32) -> Result<libc::pid_t> {
    // 0 and 1 would make `-pid` address our own group or every process.
    match libc::pid_t::try_from(pid) {
        Ok(raw) if raw > 1 => Ok(raw),
        _ => Err(TestwatchError::Process {
            pid,
            message: "pid out of range".to_string(),
        }),
    }
}

/// Send `signal` to the process group led by `pid`, falling back to the
/// single process when `pid` does not lead a group.
///
/// The driver starts the application as a group leader, so a test command
/// run through a shell takes its whole process tree with it.
#[cfg(unix)]
fn signal_tree(pid: u32, signal: libc::c_int) -> std::io::Result<()> {
    let raw = to_pid_t(pid).map_err(|e| std::io::Error::other(e.to_string()))?;
    if unsafe { libc::kill(-raw, signal) } == 0 {
        return Ok(());
    }
    let group_err = std::io::Error::last_os_error();
    if group_err.raw_os_error() != Some(libc::ESRCH) {
        return Err(group_err);
    }
    if unsafe { libc::kill(raw, signal) } == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(unix)]
fn pid_exists(pid: u32) -> bool {
    // Signal 0 only performs the existence and permission checks.
    match signal_tree(pid, 0) {
        Ok(()) => true,
        Err(e) => e.raw_os_error() == Some(libc::EPERM),
    }
}

#[cfg(unix)]
fn kill_pid(pid: u32) -> Result<()> {
    signal_tree(pid, libc::SIGKILL).map_err(|e| TestwatchError::Process {
        pid,
        message: e.to_string(),
    })
}

#[cfg(not(unix))]
fn pid_exists(_pid: u32) -> bool {
    false
}

#[cfg(not(unix))]
fn kill_pid(pid: u32) -> Result<()> {
    Err(TestwatchError::Process {
        pid,
        message: "terminating by pid is only supported on unix".to_string(),
    })
}
