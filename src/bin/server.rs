//! ArborKV Server Binary
//!
//! Opens a store and serves it over TCP.

use std::path::PathBuf;
use std::sync::Arc;

use arborkv::network::Server;
use arborkv::{Config, Engine};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// ArborKV Server
#[derive(Parser, Debug)]
#[command(name = "arborkv-server")]
#[command(about = "Bucket-tree key-value store server")]
#[command(version)]
struct Args {
    /// Data directory (takes precedence over --data-dir)
    #[arg(value_name = "DATA_DIR")]
    path: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, env = "ARBORKV_DATA_DIR", default_value = "./arborkv_data")]
    data_dir: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, env = "ARBORKV_LISTEN", default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(long, default_value = "1024")]
    max_connections: usize,

    /// How long to wait for another process to release the data directory
    #[arg(long, default_value = "2000")]
    lock_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,arborkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let data_dir = args.path.unwrap_or(args.data_dir);

    tracing::info!("ArborKV Server v{}", arborkv::VERSION);
    tracing::info!("Data directory: {}", data_dir.display());
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .lock_timeout_ms(args.lock_timeout_ms)
        .build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        buckets = engine.store().bucket_count(),
        "Store opened"
    );

    // Runs until the process is terminated
    let mut server = Server::new(config, engine);
    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
