//! Capstan - A deployment reconciliation monitor
//!
//! This is the CLI entry point for Capstan.

use capstan::config::Config;
use capstan::error::Result;
use capstan::monitor::{MonitorHandle, RolloutMonitor};
use capstan::registry::StoreSlaveRegistry;
use capstan::status::StoreEnvStatusManager;
use capstan::store::MemoryStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Capstan - deployment reconciliation monitor
#[derive(Parser)]
#[command(name = "capstan")]
#[command(version)]
#[command(about = "Reconciles deployments and scaling operations against their clusters", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation worker until interrupted
    Serve,
    /// Run a single reconciliation cycle and print its report
    Cycle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load_or_default(cli.config.as_deref())?;
    let monitor = build_monitor(&config).await?;

    match cli.command {
        Commands::Serve => {
            let handle = MonitorHandle::start(monitor, &config.monitor);
            tokio::signal::ctrl_c().await?;
            if !handle.stop().await {
                tracing::warn!("Worker aborted before the in-flight cycle finished");
            }
        }

        Commands::Cycle => {
            let mut monitor = monitor;
            let report = monitor.run_cycle().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

/// Wire the monitor over an in-memory store seeded from configuration
async fn build_monitor(config: &Config) -> Result<RolloutMonitor> {
    let store = Arc::new(MemoryStore::new());
    config.fixtures.seed(&store)?;

    let instance = gethostname::gethostname().to_string_lossy().into_owned();
    let registry = Arc::new(
        StoreSlaveRegistry::register(
            store.clone(),
            &instance,
            config.owned_environment_ids(),
            chrono::Duration::seconds(config.monitor.keepalive_window_secs),
        )
        .await?,
    );
    let env_status = Arc::new(StoreEnvStatusManager::new(store.clone()));

    Ok(RolloutMonitor::new(
        store.clone(),
        store.clone(),
        store.clone(),
        store,
        registry,
        env_status,
    ))
}
