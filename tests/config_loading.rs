// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::{NamedTempFile, TempDir};
use testwatch::config::{load_and_validate, load_or_default, parse_duration};
use testwatch::errors::TestwatchError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_run_section_is_parsed() {
    let file = write_config(
        r#"
[run]
attempt = 3
test_case_timeout = "90s"
output_timeout = "2m"
only_retry_failed = true
retry_app_crash_tests = true
output_dir = "artifacts/diag"
process_control = false
diagnostics_cmd = "sample {pid} 1"
diagnostics_timeout = "1500ms"
tests_to_skip = ["LoginTests/testLogout", "CartTests/testEmpty"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let run = cfg.run;

    assert_eq!(run.attempt, 3);
    assert_eq!(run.test_case_timeout, Duration::from_secs(90));
    assert_eq!(run.output_timeout, Duration::from_secs(120));
    assert!(run.only_retry_failed);
    assert!(run.retry_app_crash_tests);
    assert_eq!(run.output_dir, PathBuf::from("artifacts/diag"));
    assert!(!run.process_control);
    assert_eq!(run.diagnostics_cmd.as_deref(), Some("sample {pid} 1"));
    assert_eq!(run.diagnostics_timeout, Duration::from_millis(1500));
    assert_eq!(
        run.tests_to_skip.snapshot(),
        vec!["CartTests/testEmpty".to_string(), "LoginTests/testLogout".to_string()]
    );
}

#[test]
fn empty_file_gets_defaults() {
    let file = write_config("");

    let run = load_and_validate(file.path()).unwrap().run;

    assert_eq!(run.attempt, 1);
    assert_eq!(run.test_case_timeout, Duration::from_secs(300));
    assert_eq!(run.output_timeout, Duration::from_secs(120));
    assert!(!run.only_retry_failed);
    assert!(!run.retry_app_crash_tests);
    assert!(run.process_control);
    assert!(run.diagnostics_cmd.is_none());
    assert!(run.tests_to_skip.is_empty());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();

    let run = load_or_default(dir.path().join("Testwatch.toml")).unwrap().run;

    assert_eq!(run.attempt, 1);
    assert_eq!(run.output_dir, PathBuf::from("testwatch-output"));
}

#[test]
fn missing_file_is_an_io_error_for_strict_loading() {
    let dir = TempDir::new().unwrap();

    let result = load_and_validate(dir.path().join("nope.toml"));

    assert!(matches!(result, Err(TestwatchError::IoError(_))));
}

#[test]
fn zero_attempt_is_rejected() {
    let file = write_config("[run]\nattempt = 0\n");

    match load_and_validate(file.path()) {
        Err(TestwatchError::ConfigError(msg)) => assert!(msg.contains("attempt")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn zero_timeout_is_rejected() {
    let file = write_config("[run]\noutput_timeout = \"0s\"\n");

    match load_and_validate(file.path()) {
        Err(TestwatchError::ConfigError(msg)) => {
            assert!(msg.contains("output_timeout"));
            assert!(msg.contains("greater than zero"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn bad_duration_unit_is_reported() {
    let file = write_config("[run]\ntest_case_timeout = \"5 days\"\n");

    match load_and_validate(file.path()) {
        Err(TestwatchError::InvalidDuration { value, reason }) => {
            assert_eq!(value, "5 days");
            assert!(reason.contains("unsupported unit"));
        }
        Err(e) => panic!("Expected InvalidDuration, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_skip_key_is_rejected() {
    let file = write_config("[run]\ntests_to_skip = [\"testLogout\"]\n");

    match load_and_validate(file.path()) {
        Err(TestwatchError::ConfigError(msg)) => assert!(msg.contains("testLogout")),
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn blank_diagnostics_command_is_rejected() {
    let file = write_config("[run]\ndiagnostics_cmd = \"   \"\n");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TestwatchError::ConfigError(_))
    ));
}

#[test]
fn invalid_toml_is_a_toml_error() {
    let file = write_config("[run\nattempt = ");

    assert!(matches!(
        load_and_validate(file.path()),
        Err(TestwatchError::TomlError(_))
    ));
}

#[test]
fn duration_suffixes() {
    assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
    assert_eq!(parse_duration(" 3s ").unwrap(), Duration::from_secs(3));
    assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
    assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    assert!(parse_duration("").is_err());
    assert!(parse_duration("10").is_err());
    assert!(parse_duration("s").is_err());
}

#[test]
fn durations_that_overflow_are_rejected() {
    for text in ["18446744073709551615h", "18446744073709551615m", "307445734561825861m"] {
        match parse_duration(text) {
            Err(TestwatchError::InvalidDuration { value, reason }) => {
                assert_eq!(value, text);
                assert!(reason.contains("too large"), "reason: {reason}");
            }
            other => panic!("Expected InvalidDuration for {text}, got: {:?}", other),
        }
    }

    assert_eq!(
        parse_duration("18446744073709551615s").unwrap(),
        Duration::from_secs(u64::MAX)
    );
}
