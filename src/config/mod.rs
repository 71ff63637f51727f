//! Configuration loading and validation

mod mapping;
mod schema;

pub use mapping::*;
pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Example configuration written by `audiograph init`
pub const EXAMPLE_CONFIG: &str = include_str!("../../audiograph.example.yaml");

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<AudiographConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let config: AudiographConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults
pub fn load_or_default(path: &Path) -> Result<AudiographConfig> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(AudiographConfig::default())
    }
}
