//! Task Thread Sync
//!
//! Keeps one forum thread per project in step with a project/task sheet.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use task_thread_sync::cli::import::{ImportArgs, read_grid};
use task_thread_sync::cli::sync::SyncArgs;
use task_thread_sync::cli::{Cli, Command, ServeArgs};
use task_thread_sync::config::{CONFIG_PATH_ENV, Config, ConfigLoader, ConfigPaths, SourceBackend};
use task_thread_sync::db::Database;
use task_thread_sync::logging::{self, LogTarget};
use task_thread_sync::server::{TriggerServer, start_server};
use task_thread_sync::sync::orchestrator_from_config;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // An explicit --config wins over the environment variable
    let explicit_config = cli.config.clone();
    let loader = ConfigLoader::load_with(ConfigPaths::discover(), |key| {
        if key == CONFIG_PATH_ENV
            && let Some(path) = &explicit_config
        {
            return Some(path.to_string_lossy().to_string());
        }
        std::env::var(key).ok()
    })?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Using config file");
    }

    let mut config = loader.into_config();
    if let Some(db_path) = &cli.database {
        config.source.db_path = db_path.clone();
        config.source.backend = SourceBackend::Local;
    }
    if config.source.backend == SourceBackend::Local {
        config.ensure_db_dir()?;
    }

    match cli.command {
        Some(Command::Sync(args)) => run_sync(&config, args).await?,
        Some(Command::Import(args)) => run_import(&config, args)?,
        Some(Command::Serve(args)) => run_server(config, args).await?,
        None => run_server(config, ServeArgs::default()).await?,
    }

    Ok(())
}

async fn run_sync(config: &Config, args: SyncArgs) -> Result<()> {
    let orchestrator = orchestrator_from_config(config)?.with_page(args.page());
    let result = orchestrator.run().await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn run_import(config: &Config, args: ImportArgs) -> Result<()> {
    let grid = read_grid(&args.file)?;
    info!(file = %args.file.display(), mode = args.import_mode(), rows = grid.rows.len(), "Importing sheet grid");

    if args.dry_run {
        println!("Dry run results:");
        println!("  Header columns: {}", grid.header.len());
        println!("  Would replace with {} data rows", grid.rows.len());
        return Ok(());
    }

    let db = Database::open(&config.source.db_path)?;
    let imported = db.replace_grid(&grid)?;
    println!(
        "Imported {} rows into {}",
        imported,
        config.source.db_path.display()
    );
    Ok(())
}

async fn run_server(config: Config, args: ServeArgs) -> Result<()> {
    let port = args.port.unwrap_or(config.server.port);
    let state = TriggerServer::from_config(&config)?;

    let (shutdown_tx, addr) = start_server(state, SocketAddr::from(([0, 0, 0, 0], port))).await?;
    info!(%addr, "Waiting for sync triggers, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    Ok(())
}
