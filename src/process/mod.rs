// src/process/mod.rs

//! Process control abstraction.
//!
//! The runtime talks to a `ProcessControl` instead of calling into the OS
//! directly, so tests can swap in a fake that records what would have been
//! sampled or killed.
//!
//! - [`SystemProcessControl`] is the production implementation: it checks
//!   and kills by pid with `libc`, and runs the configured diagnostics
//!   command with `tokio::process`.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::errors::Result;

pub mod system;

pub use system::SystemProcessControl;

pub trait ProcessControl: Send {
    /// Best-effort diagnostic capture (e.g. a stack sample) for `pid`,
    /// written under `output_dir`. The runtime bounds how long it waits.
    fn capture_diagnostics(
        &mut self,
        pid: u32,
        output_dir: PathBuf,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Whether a process with this pid still exists.
    fn exists(&self, pid: u32) -> bool;

    /// Force-terminate `pid`.
    fn terminate(&mut self, pid: u32) -> Result<()>;
}
