//! `voxscribe-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema with defaults for every setting
//! - Optional YAML file with `${ENV_VAR}` substitution
//! - Environment overrides for credentials and paths
//! - Validation that fails fast on missing credentials
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use env::{apply_env_overrides, process_env, resolve_env_vars_with, MissingEnvVarError};
pub use io::{load_config_file, parse_config, CONFIG_PATH_VAR};
pub use redact::redact;
pub use schema::{
    ExtractionConfig, LoggingConfig, PipelineConfig, Secret, TelegramConfig, TranscriptionConfig,
    VoxscribeConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("config has an invalid shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    #[error("invalid configuration: {}", format_errors(.0))]
    Invalid(Vec<ConfigValidationError>),
}

fn format_errors(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build the config without validating it: defaults, then the optional
/// file (explicit `path`, else `VOXSCRIBE_CONFIG`), then env overrides.
pub async fn load_with_env(
    path: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<VoxscribeConfig, ConfigError> {
    let file = path
        .map(Path::to_path_buf)
        .or_else(|| env.get(CONFIG_PATH_VAR).map(PathBuf::from));

    let config = match file {
        Some(file) => load_config_file(&file, env).await?,
        None => VoxscribeConfig::default(),
    };
    Ok(apply_env_overrides(config, env))
}

/// Load and validate the config. Warnings are logged; any error aborts.
pub async fn load_and_validate(
    path: Option<&Path>,
    env: &HashMap<String, String>,
) -> Result<VoxscribeConfig, ConfigError> {
    ensure_valid(load_with_env(path, env).await?)
}

/// Validate an already loaded config. Warnings are logged; any error aborts.
pub fn ensure_valid(config: VoxscribeConfig) -> Result<VoxscribeConfig, ConfigError> {
    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        return Err(ConfigError::Invalid(report.errors));
    }
    Ok(config)
}
