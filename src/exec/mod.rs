// src/exec/mod.rs

//! Test process driver.
//!
//! This stands in for the execution environment: it launches the test
//! command and turns what it observes into `MonitorEvent`s.
//!
//! - [`test_process`] spawns the command, forwards output and reports the
//!   process ending via the crash sentinel.
//! - [`protocol`] decodes `##testwatch` marker lines into lifecycle events.

pub mod protocol;
pub mod test_process;

pub use protocol::decode_line;
pub use test_process::{TestCommand, run_test_process};
