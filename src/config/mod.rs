// src/config/mod.rs

//! Configuration loading and validation for testwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse duration strings such as `"300s"` (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert into the runtime [`RunConfig`] (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, RawConfigFile, RawRunSection, RunConfig};
