// tests/protocol_decoding.rs

use std::time::Duration;

use testwatch::engine::MonitorEvent;
use testwatch::exec::decode_line;

#[test]
fn plain_output_is_not_an_event() {
    assert!(decode_line("Compiling LoginTests...").is_none());
    assert!(decode_line("").is_none());
    assert!(decode_line("  ##testwatch all-began").is_none());
}

#[test]
fn run_boundaries() {
    assert!(matches!(decode_line("##testwatch all-began"), Some(MonitorEvent::AllTestsBegan)));
    assert!(matches!(decode_line("##testwatch all-ended\r"), Some(MonitorEvent::AllTestsEnded)));
}

#[test]
fn suite_markers_carry_name_and_root_flag() {
    match decode_line("##testwatch suite-began All root") {
        Some(MonitorEvent::TestSuiteBegan { name, is_root, .. }) => {
            assert_eq!(name, "All");
            assert!(is_root);
        }
        other => panic!("Expected TestSuiteBegan, got: {:?}", other),
    }
    match decode_line("##testwatch suite-ended LoginTests") {
        Some(MonitorEvent::TestSuiteEnded { name, is_root }) => {
            assert_eq!(name, "LoginTests");
            assert!(!is_root);
        }
        other => panic!("Expected TestSuiteEnded, got: {:?}", other),
    }
}

#[test]
fn test_case_markers() {
    match decode_line("##testwatch test-began LoginTests testLogout") {
        Some(MonitorEvent::TestCaseBegan { name, class }) => {
            assert_eq!(name, "testLogout");
            assert_eq!(class, "LoginTests");
        }
        other => panic!("Expected TestCaseBegan, got: {:?}", other),
    }

    match decode_line("##testwatch test-passed LoginTests testLogout 1.5") {
        Some(MonitorEvent::TestCasePassed { duration, .. }) => {
            assert_eq!(duration, Duration::from_millis(1500));
        }
        other => panic!("Expected TestCasePassed, got: {:?}", other),
    }

    match decode_line("##testwatch test-failed LoginTests testLogout Sources/Login.swift:88 exception") {
        Some(MonitorEvent::TestCaseFailed {
            name,
            class,
            file,
            line,
            was_exception,
        }) => {
            assert_eq!((name.as_str(), class.as_str()), ("testLogout", "LoginTests"));
            assert_eq!(file, "Sources/Login.swift");
            assert_eq!(line, 88);
            assert!(was_exception);
        }
        other => panic!("Expected TestCaseFailed, got: {:?}", other),
    }

    assert!(matches!(
        decode_line("##testwatch test-failed C t a.swift:1"),
        Some(MonitorEvent::TestCaseFailed { was_exception: false, .. })
    ));
}

#[test]
fn malformed_markers_fall_back_to_plain_output() {
    assert!(decode_line("##testwatch test-began OnlyClass").is_none());
    assert!(decode_line("##testwatch test-passed C t soon").is_none());
    assert!(decode_line("##testwatch test-passed C t -1").is_none());
    assert!(decode_line("##testwatch test-failed C t nowhere").is_none());
    assert!(decode_line("##testwatch all-began extra").is_none());
    assert!(decode_line("##testwatch reticulate").is_none());
}
