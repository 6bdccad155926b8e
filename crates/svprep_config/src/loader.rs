//! Loading lowering options from TOML.

use crate::error::ConfigError;
use crate::options::LoweringOptions;
use serde::Deserialize;
use std::path::Path;

/// The subset of a project file this crate cares about.
#[derive(Debug, Default, Deserialize)]
struct OptionsFile {
    #[serde(default)]
    lowering: LoweringOptions,
}

/// Loads options from the `[lowering]` table of a TOML file.
///
/// A file without a `[lowering]` table yields the defaults.
pub fn load_options(path: &Path) -> Result<LoweringOptions, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_options_from_str(&content)
}

/// Parses and validates options from TOML text.
pub fn load_options_from_str(content: &str) -> Result<LoweringOptions, ConfigError> {
    let file: OptionsFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    file.lowering.validate()?;
    Ok(file.lowering)
}
