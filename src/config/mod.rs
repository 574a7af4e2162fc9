mod builder;
mod types;

#[cfg(test)]
mod tests;

pub use builder::ConfigBuilder;
pub use types::{Config, ConfigInput, ConnectionArgs};

use anyhow::{Context, Result};
use std::path::Path;

/// Read the YAML configuration file. A missing file is not an error; it
/// simply contributes nothing to the layered resolution.
pub fn load_config(config_file: &str) -> Result<ConfigInput> {
    if !Path::new(config_file).exists() {
        return Ok(ConfigInput::default());
    }

    let contents = std::fs::read_to_string(config_file)
        .with_context(|| format!("failed to read config file {config_file}"))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {config_file}"))
}
