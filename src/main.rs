use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use offline_sync::application::ports::KeyValueStore;
use offline_sync::infrastructure::network::HttpConnectivityProbe;
use offline_sync::infrastructure::notification::TracingNotifier;
use offline_sync::infrastructure::storage::FileKeyValueStore;
use offline_sync::shared::logging;
use offline_sync::{AppConfig, ConnectivityMonitor, PendingActionStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "offline-sync")]
#[command(about = "Inspect the offline pending action queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the persisted queue
    #[arg(long, env = "OFFLINE_SYNC_DATA_DIR")]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the persisted pending actions
    Queue {
        /// Print the raw JSON records instead of one line per action
        #[arg(long)]
        json: bool,
    },
    /// Remove the persisted queue
    Clear,
    /// Probe a liveness URL once and grade the connection
    Probe {
        #[arg(long)]
        url: String,
        /// Timeout in seconds
        #[arg(long, default_value_t = 5)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Some(cli.log_level.as_str()), cli.json_logs);

    let mut config = AppConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.storage.data_dir = dir;
    }

    match cli.command {
        Commands::Queue { json } => print_queue(&config, json).await?,
        Commands::Clear => clear_queue(&config).await?,
        Commands::Probe { url, timeout } => probe_once(&config, url, timeout).await?,
    }

    Ok(())
}

fn open_storage(config: &AppConfig) -> Arc<FileKeyValueStore> {
    Arc::new(FileKeyValueStore::new(&config.storage.data_dir))
}

async fn print_queue(config: &AppConfig, json: bool) -> Result<()> {
    let store = PendingActionStore::new(
        open_storage(config),
        Arc::new(TracingNotifier),
        config.storage.queue_key.clone(),
        config.sync.max_retries,
    );
    store.load_persisted().await;
    let actions = store.list().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
        return Ok(());
    }

    if actions.is_empty() {
        println!("No pending actions in {}", config.storage.data_dir);
        return Ok(());
    }
    for action in &actions {
        println!(
            "{}  {}  retries {}/{}  queued {}",
            action.id,
            action.describe(),
            action.retry_count,
            action.max_retries,
            action.created_at.to_rfc3339()
        );
    }
    println!("{} pending action(s)", actions.len());
    Ok(())
}

async fn clear_queue(config: &AppConfig) -> Result<()> {
    let storage = open_storage(config);
    storage
        .remove(&config.storage.queue_key)
        .await
        .with_context(|| format!("failed to clear queue in {}", config.storage.data_dir))?;
    info!(key = %config.storage.queue_key, "cleared persisted queue");
    println!("Cleared pending actions in {}", config.storage.data_dir);
    Ok(())
}

async fn probe_once(config: &AppConfig, url: String, timeout: u64) -> Result<()> {
    let timeout = timeout.max(1);
    let probe = HttpConnectivityProbe::new(url.clone(), Duration::from_secs(timeout))?;

    let mut connectivity = config.connectivity.clone();
    connectivity.probe_timeout = timeout;
    connectivity.start_online = true;
    let monitor = ConnectivityMonitor::new(
        &connectivity,
        Some(Arc::new(probe)),
        Arc::new(TracingNotifier),
    );

    let started = Instant::now();
    let quality = monitor.probe_now().await;
    println!(
        "{url}: {quality} ({} ms)",
        started.elapsed().as_millis()
    );
    Ok(())
}
