mod config_cmd;
mod doctor_cmd;
mod run_cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use voxscribe_config::{ensure_valid, load_with_env, process_env};
use voxscribe_logging::init_logger;

#[derive(Parser)]
#[command(name = "voxscribe")]
#[command(about = "voxscribe: Telegram bot that transcribes voice messages and videos")]
#[command(version)]
struct Cli {
    /// YAML config file (defaults to $VOXSCRIBE_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,
    /// Validate the configuration and probe ffmpeg and the scratch directory
    #[command(alias = "doctor")]
    Check,
    /// Print the effective configuration with secrets masked
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env = process_env();
    let config_path = cli.config.as_deref();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = load_with_env(config_path, &env)
                .await
                .context("loading configuration")?;
            init_logger(&config.logging.level, config.logging.dir.as_deref());
            let config = ensure_valid(config)?;
            run_cmd::run(config).await?;
        }
        Commands::Check => {
            if !doctor_cmd::run(config_path, &env).await? {
                std::process::exit(1);
            }
        }
        Commands::Config => {
            let config = load_with_env(config_path, &env)
                .await
                .context("loading configuration")?;
            config_cmd::print(&config)?;
        }
    }

    Ok(())
}
