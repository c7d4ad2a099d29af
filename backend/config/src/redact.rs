//! Safe-to-print config snapshots.

use serde_json::Value;

use crate::schema::VoxscribeConfig;

static SENSITIVE_KEYS: &[&str] = &["botToken", "apiKey", "token", "secret", "password"];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Serialize the config with every credential masked.
///
/// Non-empty secrets keep their first four characters as a hint.
pub fn redact(config: &VoxscribeConfig) -> Value {
    match serde_json::to_value(config) {
        Ok(value) => redact_value(&value, ""),
        Err(_) => Value::Null,
    }
}

pub fn redact_value(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) => {
            if s.is_empty() {
                Value::String(String::new())
            } else {
                let hint: String = s.chars().take(4).collect();
                Value::String(format!("{hint}***"))
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_value(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_value(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}
