// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{ConfigFile, RawConfigFile, RawRunSection, RunConfig};
use crate::errors::{Result, TestwatchError};
use crate::skip::SkipList;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TestwatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let run = validate_run_section(raw.run)?;
        Ok(ConfigFile::new_unchecked(run))
    }
}

fn validate_run_section(raw: RawRunSection) -> Result<RunConfig> {
    if raw.attempt == 0 {
        return Err(TestwatchError::ConfigError(
            "[run].attempt is 1-based and must be >= 1 (got 0)".to_string(),
        ));
    }

    let test_case_timeout = nonzero_duration("test_case_timeout", &raw.test_case_timeout)?;
    let output_timeout = nonzero_duration("output_timeout", &raw.output_timeout)?;
    let diagnostics_timeout =
        nonzero_duration("diagnostics_timeout", &raw.diagnostics_timeout)?;

    validate_skip_keys(&raw.tests_to_skip)?;

    if let Some(cmd) = &raw.diagnostics_cmd {
        if cmd.trim().is_empty() {
            return Err(TestwatchError::ConfigError(
                "[run].diagnostics_cmd must not be empty when set".to_string(),
            ));
        }
    }

    Ok(RunConfig {
        attempt: raw.attempt,
        test_case_timeout,
        output_timeout,
        only_retry_failed: raw.only_retry_failed,
        retry_app_crash_tests: raw.retry_app_crash_tests,
        output_dir: raw.output_dir,
        process_control: raw.process_control,
        diagnostics_cmd: raw.diagnostics_cmd,
        diagnostics_timeout,
        tests_to_skip: SkipList::from_keys(raw.tests_to_skip),
    })
}

fn nonzero_duration(field: &str, value: &str) -> Result<Duration> {
    let dur = parse_duration(value)?;
    if dur.is_zero() {
        return Err(TestwatchError::ConfigError(format!(
            "[run].{field} must be greater than zero (got \"{value}\")"
        )));
    }
    Ok(dur)
}

fn validate_skip_keys(keys: &[String]) -> Result<()> {
    for key in keys {
        let valid = key
            .split_once('/')
            .is_some_and(|(class, name)| !class.is_empty() && !name.is_empty());
        if !valid {
            return Err(TestwatchError::ConfigError(format!(
                "[run].tests_to_skip entry '{key}' must look like \"Class/test\""
            )));
        }
    }
    Ok(())
}
