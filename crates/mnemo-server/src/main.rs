use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mnemo_infrastructure::ConfigStorage;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

mod bootstrap;
mod logging;
mod transport;

#[derive(Parser)]
#[command(name = "mnemo")]
#[command(about = "mnemo - capture chat messages and insights into a git-backed knowledge base", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the chat bot and the insight endpoint
    Run {
        /// Path to config.toml (defaults to MNEMO_CONFIG or the user config dir)
        #[arg(long, env = "MNEMO_CONFIG")]
        config: Option<PathBuf>,
        /// Force debug-level logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Load and validate the configuration, then print a summary
    CheckConfig {
        #[arg(long, env = "MNEMO_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn config_storage(path: Option<PathBuf>) -> Result<ConfigStorage> {
    match path {
        Some(path) => Ok(ConfigStorage::with_path(path)),
        None => ConfigStorage::new().context("Failed to locate the config file"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, verbose } => {
            let _log_guard = logging::init_logging(verbose);
            let storage = config_storage(config)?;
            let config = storage
                .load()
                .with_context(|| format!("Invalid configuration ({})", storage.path().display()))?;

            let shutdown = CancellationToken::new();
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("[Bootstrap] Ctrl-C received, shutting down");
                }
                signal.cancel();
            });

            bootstrap::run(config, shutdown).await
        }
        Commands::CheckConfig { config } => {
            let storage = config_storage(config)?;
            let config = storage
                .load()
                .with_context(|| format!("Invalid configuration ({})", storage.path().display()))?;
            println!("{}", bootstrap::describe(&config, storage.path()));
            Ok(())
        }
    }
}
