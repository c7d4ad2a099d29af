//! Config file loading.

use std::collections::HashMap;
use std::path::Path;

use tokio::fs;
use tracing::{debug, info};

use crate::env::resolve_env_vars_with;
use crate::schema::VoxscribeConfig;
use crate::ConfigError;

/// Environment variable naming an optional config file.
pub const CONFIG_PATH_VAR: &str = "VOXSCRIBE_CONFIG";

/// Read a YAML config file and substitute `${VAR}` references from `env`.
///
/// A missing file yields the defaults.
pub async fn load_config_file(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<VoxscribeConfig, ConfigError> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(VoxscribeConfig::default());
    }

    let raw = fs::read_to_string(path).await.map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&raw, env)?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Parse YAML text into a config, substituting env references.
pub fn parse_config(raw: &str, env: &HashMap<String, String>) -> Result<VoxscribeConfig, ConfigError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw)?;
    if yaml.is_null() {
        return Ok(VoxscribeConfig::default());
    }
    let value = serde_json::to_value(yaml)?;
    let value = resolve_env_vars_with(&value, env)?;
    Ok(serde_json::from_value(value)?)
}
