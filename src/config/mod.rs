// src/config/mod.rs

//! Configuration loading and validation for vipser.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_PATH, load_and_validate, load_from_path, load_or_default};
pub use model::{ConfigFile, ExecutableSection, RunSection};
pub use validate::validate_config;
