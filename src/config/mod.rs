// src/config/mod.rs

//! Configuration loading and validation for kapo.
//!
//! Responsibilities:
//! - Define the TOML-backed raw model and the validated `Config` (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Merge defaults per mode and validate addresses, signals and bounds
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    Config, ProcessConfig, RawConfig, RawProcessSection, RawServerSection, RawStatusSection,
    RawWatchSection, ServerConfig, StatusConfig, WatchConfig,
};
pub use validate::validate_config;
