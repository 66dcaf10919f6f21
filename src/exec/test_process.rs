// src/exec/test_process.rs

//! Test process runner.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::engine::{APP_PROCESS_ENDED, MonitorEvent};
use crate::errors::{Result, TestwatchError};
use crate::exec::protocol::decode_line;
use crate::process::system::shell_command;

/// How long to keep draining stdout after the process has exited.
const STDOUT_DRAIN_GRACE: Duration = Duration::from_secs(5);

/// The supervised command as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestCommand {
    /// A single argument, handed to the platform shell as-is.
    Shell(String),
    /// Program plus arguments, spawned directly so quoting survives.
    Argv(Vec<String>),
}

impl TestCommand {
    /// `None` when `args` is empty.
    pub fn from_args(mut args: Vec<String>) -> Option<Self> {
        match args.len() {
            0 => None,
            1 => args.pop().map(TestCommand::Shell),
            _ => Some(TestCommand::Argv(args)),
        }
    }

    fn to_command(&self) -> Command {
        let mut cmd = match self {
            TestCommand::Shell(line) => shell_command(line),
            TestCommand::Argv(argv) => {
                // An empty argv fails at spawn with a not-found error.
                let (program, rest) = argv.split_first().map_or(("", &[][..]), |(p, r)| (p.as_str(), r));
                let mut c = Command::new(program);
                c.args(rest);
                c
            }
        };
        // Lead a fresh process group so a kill reaches everything the
        // command spawned, not just the shell.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

impl fmt::Display for TestCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestCommand::Shell(line) => f.write_str(line),
            TestCommand::Argv(argv) => write!(f, "{}", argv.join(" ")),
        }
    }
}

/// Run `command` as the supervised application.
///
/// Reports, in order: `ApplicationLaunched`, one `OutputReceived` per stdout
/// line (preceded by the decoded event for marker lines), `ParserCompleted`
/// at end of stdout, then the crash sentinel and `ApplicationExited` once the
/// process is gone.
pub async fn run_test_process(
    command: &TestCommand,
    events: mpsc::Sender<MonitorEvent>,
) -> Result<ExitStatus> {
    let mut cmd = command.to_command();
    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning test process '{command}'"))?;

    let pid = child
        .id()
        .ok_or_else(|| anyhow::anyhow!("test process '{command}' exited before reporting a pid"))?;
    info!(pid, cmd = %command, "test process started");
    send(&events, MonitorEvent::ApplicationLaunched { pid }).await?;

    let stdout_task = child
        .stdout
        .take()
        .map(|stdout| tokio::spawn(forward_stdout(stdout, events.clone())));

    // Always consume stderr so buffers don't fill; log at debug.
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(pid, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for test process {pid}"))?;
    info!(pid, exit_code = ?status.code(), success = status.success(), "test process exited");

    match stdout_task {
        Some(task) => match timeout(STDOUT_DRAIN_GRACE, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(pid, error = %e, "stdout forwarder panicked"),
            Err(_) => {
                warn!(pid, "stdout still open after process exit; giving up on it");
                send(&events, MonitorEvent::ParserCompleted).await?;
            }
        },
        None => send(&events, MonitorEvent::ParserCompleted).await?,
    }

    send(
        &events,
        MonitorEvent::OutputReceived {
            output: APP_PROCESS_ENDED.to_string(),
        },
    )
    .await?;
    send(&events, MonitorEvent::ApplicationExited).await?;

    Ok(status)
}

async fn forward_stdout(stdout: ChildStdout, events: mpsc::Sender<MonitorEvent>) {
    let mut lines = BufReader::new(stdout).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        debug!("stdout: {}", line);

        if let Some(event) = decode_line(&line) {
            if events.send(event).await.is_err() {
                break;
            }
        }
        if events
            .send(MonitorEvent::OutputReceived { output: line })
            .await
            .is_err()
        {
            break;
        }
    }

    let _ = events.send(MonitorEvent::ParserCompleted).await;
    debug!("stdout forwarder ended");
}

async fn send(events: &mpsc::Sender<MonitorEvent>, event: MonitorEvent) -> Result<()> {
    events
        .send(event)
        .await
        .map_err(|_| TestwatchError::ChannelClosed)
}
