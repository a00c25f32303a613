// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{Config, RawConfig};
use crate::config::validate::validate_config;
use crate::errors::Result;
use crate::types::Mode;

/// Load a configuration file and return the raw `RawConfig`.
///
/// This only performs TOML deserialization; mode defaults and semantic
/// checks happen in [`validate_config`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Assemble the final configuration for `mode`.
///
/// - Reads the TOML file when `path` is given (a missing file is an error).
/// - Overlays `overrides` (values from the command line / environment).
/// - Applies mode defaults and validates the result.
pub fn load_and_validate(
    path: Option<&Path>,
    overrides: RawConfig,
    mode: Mode,
) -> Result<Config> {
    let base = match path {
        Some(path) => load_from_path(path)?,
        None => RawConfig::default(),
    };
    let raw = base.merged_with(overrides);
    validate_config(&raw, mode)
}
