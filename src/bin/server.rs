//! RingKV Storage Node Binary
//!
//! Starts a storage node and serves it over TCP.

use std::fs::OpenOptions;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ringkv::network::Server;
use ringkv::{Config, DurabilityConfig, StorageNode};
use tracing_subscriber::{fmt, EnvFilter};

/// RingKV storage node
#[derive(Parser, Debug)]
#[command(name = "ringkv-server")]
#[command(about = "Sharded key-value storage node with WAL and checkpoints")]
#[command(version)]
struct Args {
    /// Identifier of this node on the ring
    #[arg(long, default_value = "node-1")]
    node_id: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Number of table shards
    #[arg(short, long, default_value_t = ringkv::config::DEFAULT_SHARD_COUNT)]
    shards: usize,

    /// Data directory holding wal.log and checkpoint.log; omit to run in memory
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// WAL file (overrides the data directory default)
    #[arg(long, requires = "data_dir")]
    wal: Option<PathBuf>,

    /// Checkpoint file (overrides the data directory default)
    #[arg(long, requires = "data_dir")]
    checkpoint: Option<PathBuf>,

    /// Checkpoint to load at startup (defaults to the node's own checkpoint)
    #[arg(long)]
    recover_checkpoint: Option<PathBuf>,

    /// WAL to replay at startup (defaults to the node's own WAL)
    #[arg(long)]
    recover_wal: Option<PathBuf>,

    /// WAL flush interval in milliseconds
    #[arg(long, default_value = "1000")]
    flush_interval_ms: u64,

    /// Checkpoint interval in seconds
    #[arg(long, default_value = "60")]
    checkpoint_interval_secs: u64,

    /// Keep serving in memory if the WAL cannot be opened
    #[arg(long)]
    best_effort: bool,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = init_logging(args.log_file.as_ref()) {
        eprintln!("Cannot open log file: {}", e);
        std::process::exit(1);
    }

    tracing::info!("RingKV Server v{}", ringkv::VERSION);
    tracing::info!("Node id: {}", args.node_id);
    tracing::info!("Listen address: {}", args.listen);

    let config = build_config(&args);

    let node = match StorageNode::open(config.clone()) {
        Ok(node) => Arc::new(node),
        Err(e) => {
            tracing::error!("Failed to open node: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, Arc::clone(&node)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("{}", e);
            let _ = node.shutdown();
            std::process::exit(1);
        }
    };

    // Typing "shutdown" on stdin stops the node cleanly; EOF leaves it running.
    let handle = server.shutdown_handle();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if matches!(line.trim(), "shutdown" | "quit") => {
                    tracing::info!("Shutdown requested");
                    handle.shutdown();
                    return;
                }
                Ok(_) => {}
                Err(_) => return,
            }
        }
    });

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
    }

    if let Err(e) = node.shutdown() {
        tracing::error!("Shutdown error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn init_logging(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,ringkv=debug"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
    }
    Ok(())
}

fn build_config(args: &Args) -> Config {
    let mut builder = Config::builder()
        .node_id(&args.node_id)
        .listen_addr(&args.listen)
        .shard_count(args.shards)
        .max_connections(args.max_connections);

    if let Some(dir) = &args.data_dir {
        let mut durability = DurabilityConfig::in_dir(dir);
        if let Some(wal) = &args.wal {
            durability.wal_path = wal.clone();
        }
        if let Some(checkpoint) = &args.checkpoint {
            durability.checkpoint_path = checkpoint.clone();
        }
        durability.flush_interval = Duration::from_millis(args.flush_interval_ms.max(1));
        durability.checkpoint_interval = Duration::from_secs(args.checkpoint_interval_secs.max(1));
        durability.required = !args.best_effort;

        builder = builder
            .recover_checkpoint(durability.checkpoint_path.clone())
            .recover_wal(durability.wal_path.clone())
            .durability(durability);
    }

    if let Some(path) = &args.recover_checkpoint {
        builder = builder.recover_checkpoint(path);
    }
    if let Some(path) = &args.recover_wal {
        builder = builder.recover_wal(path);
    }

    builder.build()
}
