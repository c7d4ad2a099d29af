//! CLI Doctor Command
//!
//! `voxscribe check`: validates the configuration and probes the external
//! pieces the bot depends on.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use voxscribe_config::{load_with_env, validate, VoxscribeConfig};
use voxscribe_core::JobId;
use voxscribe_media::{FfmpegExtractor, ScratchSpace};

/// Executes the full diagnosis. Returns whether every required check passed.
pub async fn run(config_path: Option<&Path>, env: &HashMap<String, String>) -> Result<bool> {
    println!("\n🔍 Running voxscribe checks...\n");

    let config = match load_with_env(config_path, env).await {
        Ok(config) => config,
        Err(e) => {
            println!("  🔴 Could not load configuration: {e}");
            return Ok(false);
        }
    };

    let is_ok = check_config(&config) & check_ffmpeg(&config).await & check_scratch(&config).await;

    println!();
    if is_ok {
        println!("✅ All checks passed! voxscribe is ready.");
    } else {
        println!("❌ Some checks failed! Please fix the errors above.");
    }
    Ok(is_ok)
}

fn check_config(config: &VoxscribeConfig) -> bool {
    println!("Checking Configuration:");
    let report = validate(config);
    for error in &report.errors {
        println!("  🔴 {error}");
    }
    for warning in &report.warnings {
        println!("  🟡 {warning}");
    }
    if report.is_valid() {
        println!("  🟢 Configuration is valid");
    }
    report.is_valid()
}

async fn check_ffmpeg(config: &VoxscribeConfig) -> bool {
    println!("Checking ffmpeg:");
    match FfmpegExtractor::new(&config.extraction.ffmpeg_path).probe().await {
        Ok(version) => {
            println!("  🟢 {version}");
            true
        }
        Err(e) => {
            println!("  🔴 {e} (videos and video notes cannot be transcribed)");
            false
        }
    }
}

async fn check_scratch(config: &VoxscribeConfig) -> bool {
    println!("Checking Scratch Directory:");
    let scratch = ScratchSpace::new(&config.pipeline.scratch_dir);
    match scratch.acquire(JobId::new()).await {
        Ok(dir) => {
            dir.release().await;
            println!("  🟢 {} is writable", scratch.root().display());
            true
        }
        Err(e) => {
            println!("  🔴 {} is not writable: {e}", scratch.root().display());
            false
        }
    }
}
