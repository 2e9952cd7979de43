use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

mod cli;
mod commands;
mod error;
mod output;

use cli::{CliArgs, Commands};
use commands::CommandExecutor;
use error::{AppError, Result};
use reskin_engine::{
    AssetSession, CacheStore, EngineConfig, FileStore, NullInstaller, StateStore,
};

fn main() {
    if let Err(e) = bootstrap() {
        error!(error = ?e, "Application failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<()> {
    let args = CliArgs::parse();

    init_logging(args.verbose)?;

    let config = EngineConfig::builder()
        .with_endpoint(args.endpoint.clone())
        .build();

    let store = CacheStore::new(Arc::new(FileStore::new(args.cache_root.clone())));
    let state = StateStore::new(args.state_file.clone());

    // Headless sessions have no interception layer to register scripts
    // against.
    let session = AssetSession::bootstrap(config, store, Arc::new(NullInstaller), state).await?;
    let mut executor = CommandExecutor::new(session);

    match args.command {
        Commands::Profile { action } => executor.profile(action).await,
        Commands::Asset { action } => executor.asset(action).await,
        Commands::Export { profile, output } => executor.export(profile, output).await,
        Commands::Fetch { url } => executor.fetch(url).await,
        Commands::Seed { dir, base_path } => executor.seed(dir, base_path).await,
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))
}
