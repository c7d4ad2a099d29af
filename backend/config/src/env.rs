//! Environment handling: `${VAR}` substitution in config files and
//! well-known environment overrides.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are substituted. `$${VAR}` is an
//! escape and yields a literal `${VAR}`.

use std::collections::HashMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::{Secret, VoxscribeConfig};

/// Matches `${VAR}` and its escaped form `$${VAR}`.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid regex"));

pub const TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const WHISPER_MODEL: &str = "WHISPER_MODEL";
pub const FFMPEG_PATH: &str = "FFMPEG_PATH";
pub const SCRATCH_DIR: &str = "VOXSCRIBE_SCRATCH_DIR";
pub const LOG_DIR: &str = "VOXSCRIBE_LOG_DIR";
pub const LOG_LEVEL: &str = "RUST_LOG";

#[derive(Debug, thiserror::Error)]
#[error("missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in every string leaf of `value`.
pub fn resolve_env_vars_with(
    value: &Value,
    env: &HashMap<String, String>,
) -> Result<Value, MissingEnvVarError> {
    substitute_value(value, env, "")
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => substitute_string(s, env, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let out = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(v) if !v.is_empty() => v.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(out.into_owned()),
    }
}

/// Apply well-known environment variables on top of file/default values.
/// Empty variables are ignored.
pub fn apply_env_overrides(mut config: VoxscribeConfig, env: &HashMap<String, String>) -> VoxscribeConfig {
    let get = |name: &str| env.get(name).filter(|v| !v.trim().is_empty()).cloned();

    if let Some(token) = get(TELEGRAM_TOKEN) {
        config.telegram.bot_token = Secret::new(token);
    }
    if let Some(key) = get(OPENAI_API_KEY) {
        config.transcription.api_key = Secret::new(key);
    }
    if let Some(url) = get(OPENAI_BASE_URL) {
        config.transcription.base_url = url;
    }
    if let Some(model) = get(WHISPER_MODEL) {
        config.transcription.model = model;
    }
    if let Some(path) = get(FFMPEG_PATH) {
        config.extraction.ffmpeg_path = path;
    }
    if let Some(dir) = get(SCRATCH_DIR) {
        config.pipeline.scratch_dir = PathBuf::from(dir);
    }
    if let Some(dir) = get(LOG_DIR) {
        config.logging.dir = Some(PathBuf::from(dir));
    }
    if let Some(level) = get(LOG_LEVEL) {
        config.logging.level = level;
    }
    config
}
