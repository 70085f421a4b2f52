//! Configuration for RingKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of shards when none (or zero) is configured
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// Default number of extra ring positions per physical node
pub const DEFAULT_VIRTUAL_NODES: usize = 21;

/// Main configuration for a storage node
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------
    /// Identifier of this node on the coordinator's ring
    pub node_id: String,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Number of shards, fixed for the lifetime of the table
    pub shard_count: usize,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// WAL + checkpoint settings; `None` runs the node purely in memory
    pub durability: Option<DurabilityConfig>,

    /// Checkpoint file to load at startup, if any
    pub recover_checkpoint: Option<PathBuf>,

    /// WAL file to replay at startup, if any
    pub recover_wal: Option<PathBuf>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

/// Settings for the WAL writer and checkpoint task
#[derive(Debug, Clone)]
pub struct DurabilityConfig {
    /// Append-only log of mutations since the last checkpoint
    pub wal_path: PathBuf,

    /// Full-state snapshot file
    pub checkpoint_path: PathBuf,

    /// How often buffered WAL bytes are flushed and synced
    pub flush_interval: Duration,

    /// How often a checkpoint is taken
    pub checkpoint_interval: Duration,

    /// Refuse to start when the WAL cannot be opened.
    /// When false the node logs a warning and serves without durability.
    pub required: bool,
}

impl DurabilityConfig {
    /// Durability rooted in a directory, using `wal.log` and `checkpoint.log`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            wal_path: dir.join("wal.log"),
            checkpoint_path: dir.join("checkpoint.log"),
            ..Self::default()
        }
    }
}

impl Default for DurabilityConfig {
    fn default() -> Self {
        Self {
            wal_path: PathBuf::from("./ringkv_data/wal.log"),
            checkpoint_path: PathBuf::from("./ringkv_data/checkpoint.log"),
            flush_interval: Duration::from_secs(1),
            checkpoint_interval: Duration::from_secs(60),
            required: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: "node-1".to_string(),
            shard_count: DEFAULT_SHARD_COUNT,
            durability: None,
            recover_checkpoint: None,
            recover_wal: None,
            listen_addr: "127.0.0.1:7070".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the node identifier
    pub fn node_id(mut self, id: impl Into<String>) -> Self {
        self.config.node_id = id.into();
        self
    }

    /// Set the shard count (0 falls back to the default)
    pub fn shard_count(mut self, count: usize) -> Self {
        self.config.shard_count = count;
        self
    }

    /// Enable durability with the given settings
    pub fn durability(mut self, durability: DurabilityConfig) -> Self {
        self.config.durability = Some(durability);
        self
    }

    /// Enable durability and recover from the same files on startup
    pub fn durable_in(mut self, dir: impl Into<PathBuf>) -> Self {
        let durability = DurabilityConfig::in_dir(dir);
        self.config.recover_checkpoint = Some(durability.checkpoint_path.clone());
        self.config.recover_wal = Some(durability.wal_path.clone());
        self.config.durability = Some(durability);
        self
    }

    /// Set the checkpoint file loaded at startup
    pub fn recover_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.recover_checkpoint = Some(path.into());
        self
    }

    /// Set the WAL file replayed at startup
    pub fn recover_wal(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.recover_wal = Some(path.into());
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
