//! RingKV Coordinator CLI
//!
//! Connects to a set of storage nodes and routes shell commands across them
//! with the consistent hash ring.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ringkv::coordinator::{run_shell, Coordinator, CoordinatorConfig};
use ringkv::{KvError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// RingKV coordinator shell
#[derive(Parser, Debug)]
#[command(name = "ringkv-cli")]
#[command(about = "Interactive coordinator for RingKV storage nodes")]
#[command(version)]
struct Args {
    /// Storage node as id=host:port (repeatable)
    #[arg(short, long = "node", value_parser = parse_node)]
    nodes: Vec<(String, String)>,

    /// JSON file listing nodes and virtual node count
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra ring positions per node
    #[arg(long, default_value_t = ringkv::config::DEFAULT_VIRTUAL_NODES)]
    virtual_nodes: usize,

    /// Connect timeout in seconds
    #[arg(long, default_value = "5")]
    connect_timeout_secs: u64,
}

fn parse_node(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((id, addr)) if !id.is_empty() && !addr.is_empty() => {
            Ok((id.to_string(), addr.to_string()))
        }
        _ => Err(format!("expected id=host:port, got {:?}", raw)),
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut coordinator = match connect(&args) {
        Ok(coordinator) => coordinator,
        Err(e) => {
            eprintln!("Cannot start coordinator: {}", e);
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    if let Err(e) = run_shell(&mut coordinator, stdin.lock(), std::io::stdout()) {
        eprintln!("Shell error: {}", e);
        std::process::exit(1);
    }
}

fn connect(args: &Args) -> Result<Coordinator> {
    let mut config = match &args.config {
        Some(path) => CoordinatorConfig::from_file(path)?,
        None => CoordinatorConfig {
            nodes: Default::default(),
            virtual_nodes: args.virtual_nodes,
        },
    };
    config.nodes.extend(args.nodes.iter().cloned());

    if config.nodes.is_empty() {
        return Err(KvError::Config(
            "no storage nodes given; use --node or --config".to_string(),
        ));
    }

    let mut coordinator = Coordinator::new(config.virtual_nodes);
    coordinator.set_connect_timeout(Duration::from_secs(args.connect_timeout_secs));
    for (id, addr) in &config.nodes {
        coordinator.add_node(id, addr)?;
    }
    Ok(coordinator)
}
