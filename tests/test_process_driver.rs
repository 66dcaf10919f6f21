// tests/test_process_driver.rs
#![cfg(unix)]

mod common;
use crate::common::{RecordingAbortHandler, RunConfigBuilder, init_tracing};

use std::time::Duration;

use tokio::sync::mpsc;

use testwatch::engine::{APP_PROCESS_ENDED, MonitorEvent, MonitorRuntime};
use testwatch::exec::{TestCommand, run_test_process};
use testwatch::process::SystemProcessControl;
use testwatch::skip::SkipList;
use testwatch::types::{ExitClassification, TestIdentity};
use testwatch_test_utils::with_timeout;

const PASSING_SCRIPT: &str = "printf '##testwatch all-began\\nhello\\n##testwatch test-began C t1\\n##testwatch test-passed C t1 0.25\\n##testwatch all-ended\\n'";

fn shell(line: &str) -> TestCommand {
    TestCommand::Shell(line.to_string())
}

async fn collect(command: TestCommand) -> Vec<MonitorEvent> {
    let (tx, mut rx) = mpsc::channel(128);
    let status = with_timeout(run_test_process(&command, tx)).await.unwrap();
    assert!(status.code().is_some());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn is_output(event: &MonitorEvent, text: &str) -> bool {
    matches!(event, MonitorEvent::OutputReceived { output } if output == text)
}

#[tokio::test]
async fn driver_reports_lifecycle_in_order() {
    init_tracing();
    let events = collect(shell(PASSING_SCRIPT)).await;

    assert!(matches!(events[0], MonitorEvent::ApplicationLaunched { .. }));
    assert!(matches!(events[1], MonitorEvent::AllTestsBegan));
    assert!(is_output(&events[2], "##testwatch all-began"));
    assert!(is_output(&events[3], "hello"));
    assert!(matches!(&events[4], MonitorEvent::TestCaseBegan { name, class } if name == "t1" && class == "C"));
    assert!(matches!(events[6], MonitorEvent::TestCasePassed { .. }));
    assert!(matches!(events[8], MonitorEvent::AllTestsEnded));

    let n = events.len();
    assert!(matches!(events[n - 3], MonitorEvent::ParserCompleted));
    assert!(is_output(&events[n - 2], APP_PROCESS_ENDED));
    assert!(matches!(events[n - 1], MonitorEvent::ApplicationExited));
}

#[tokio::test]
async fn passing_run_completes_without_abort() {
    init_tracing();
    let skip = SkipList::new();
    let handler = RecordingAbortHandler::new();
    let (core, _stats) = RunConfigBuilder::new().skip_list(skip.clone()).build_monitor();
    let (runtime, handle) =
        MonitorRuntime::new(core, SystemProcessControl::new(None), handler.clone(), 64);
    let task = tokio::spawn(runtime.run());

    with_timeout(run_test_process(&shell(PASSING_SCRIPT), handle.sender()))
        .await
        .unwrap();
    drop(handle);

    let report = with_timeout(task).await.unwrap().unwrap();
    assert_eq!(report.exit, ExitClassification::AllTestsPassed);
    assert!(report.state.is_execution_complete());
    assert!(handler.notices().is_empty());
    assert!(skip.contains("C/t1"));
}

#[tokio::test]
async fn process_dying_mid_test_is_reported_as_a_crash() {
    init_tracing();
    let skip = SkipList::new();
    let handler = RecordingAbortHandler::new();
    let (core, _stats) = RunConfigBuilder::new().skip_list(skip.clone()).build_monitor();
    let (runtime, handle) =
        MonitorRuntime::new(core, SystemProcessControl::new(None), handler.clone(), 64);
    let task = tokio::spawn(runtime.run());

    let script = "printf '##testwatch all-began\\n##testwatch test-began C t1\\n'; exit 3";
    let status = with_timeout(run_test_process(&shell(script), handle.sender()))
        .await
        .unwrap();
    assert_eq!(status.code(), Some(3));
    drop(handle);

    let report = with_timeout(task).await.unwrap().unwrap();
    assert_eq!(report.exit, ExitClassification::AppCrashed);
    let notices = handler.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].test, Some(TestIdentity::new("t1", "C")));
    assert!(skip.contains("C/t1"));
}

#[tokio::test]
async fn argv_commands_keep_their_quoting() {
    init_tracing();
    let command = TestCommand::Argv(vec![
        "sh".to_string(),
        "-c".to_string(),
        "echo a b".to_string(),
    ]);

    let events = collect(command).await;

    assert!(events.iter().any(|e| is_output(e, "a b")));
}

/// Whether `pid` has exited. A zombie nobody has reaped yet counts as gone.
#[cfg(target_os = "linux")]
fn process_gone(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.trim_start().chars().next())
            .is_some_and(|state| state == 'Z' || state == 'X'),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn abort_kills_processes_spawned_by_the_command() {
    init_tracing();
    let dir = tempfile::TempDir::new().unwrap();
    let pid_file = dir.path().join("background.pid");
    let script = format!(
        "sleep 41.7 & echo $! > '{}'; echo '##testwatch test-began C t1'; wait",
        pid_file.display()
    );

    let handler = RecordingAbortHandler::new();
    let (core, _stats) = RunConfigBuilder::new()
        .test_case_timeout(Duration::from_millis(300))
        .build_monitor();
    let (runtime, handle) =
        MonitorRuntime::new(core, SystemProcessControl::new(None), handler.clone(), 64);
    let task = tokio::spawn(runtime.run());

    with_timeout(run_test_process(&shell(&script), handle.sender()))
        .await
        .unwrap();
    drop(handle);
    let report = with_timeout(task).await.unwrap().unwrap();

    assert_eq!(report.exit, ExitClassification::TestTimeout);
    assert_eq!(handler.notices().len(), 1);

    let background: u32 = std::fs::read_to_string(&pid_file)
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    let mut gone = process_gone(background);
    for _ in 0..100 {
        if gone {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        gone = process_gone(background);
    }
    assert!(gone, "background process {background} outlived the abort");
}
