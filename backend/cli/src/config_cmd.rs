//! `voxscribe config`: the effective configuration, secrets masked.

use anyhow::Result;
use voxscribe_config::{redact, VoxscribeConfig};

pub fn print(config: &VoxscribeConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&redact(config))?);
    Ok(())
}
