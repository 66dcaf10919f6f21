#![allow(dead_code)]

pub use testwatch_test_utils::builders::RunConfigBuilder;
pub use testwatch_test_utils::fake_process::FakeProcessControl;
pub use testwatch_test_utils::init_tracing;
pub use testwatch_test_utils::recording_handler::RecordingAbortHandler;

use std::time::Duration;

use testwatch::engine::{APP_PROCESS_ENDED, MonitorEvent};

pub fn began(name: &str, class: &str) -> MonitorEvent {
    MonitorEvent::TestCaseBegan {
        name: name.to_string(),
        class: class.to_string(),
    }
}

pub fn passed(name: &str, class: &str) -> MonitorEvent {
    MonitorEvent::TestCasePassed {
        name: name.to_string(),
        class: class.to_string(),
        duration: Duration::from_millis(500),
    }
}

pub fn failed(name: &str, class: &str) -> MonitorEvent {
    failed_with(name, class, false)
}

pub fn failed_with(name: &str, class: &str, was_exception: bool) -> MonitorEvent {
    MonitorEvent::TestCaseFailed {
        name: name.to_string(),
        class: class.to_string(),
        file: format!("{class}.swift"),
        line: 42,
        was_exception,
    }
}

pub fn output(text: &str) -> MonitorEvent {
    MonitorEvent::OutputReceived {
        output: text.to_string(),
    }
}

pub fn app_crashed() -> MonitorEvent {
    output(APP_PROCESS_ENDED)
}
