//! Storage Node
//!
//! One storage node: a sharded table plus its durability subsystem.
//!
//! ## Responsibilities
//! - Build the table with the configured shard count
//! - Recover from checkpoint + WAL before serving
//! - Start the WAL writer and checkpoint threads
//! - Execute protocol commands against the table
//! - Two-phase shutdown: refuse mutations, then drain durability

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::Config;
use crate::durability::{wal_channel, Durability};
use crate::error::{KvError, Result};
use crate::protocol::{Command, Response};
use crate::table::Table;
use crate::wal::{recover, RecoveryStats, WalWriter};

/// A storage node serving Get/Put/Update/Delete
///
/// ## Lifecycle
/// 1. `open`: table → WAL opened → recovery (unlogged) → threads started
/// 2. requests: `get`/`put`/`update`/`delete` or `execute`
/// 3. `shutdown`: mutations rejected, WAL flushed, threads joined
pub struct StorageNode {
    config: Config,
    table: Arc<Table>,
    durability: Mutex<Option<Durability>>,
    accepting: AtomicBool,
    recovery: RecoveryStats,
}

impl StorageNode {
    /// Open a node with the given config
    ///
    /// Failing to open the WAL is fatal when durability is required;
    /// otherwise the node logs a warning and runs in memory.
    pub fn open(config: Config) -> Result<Self> {
        let mut pending = None;
        let table = match &config.durability {
            None => Table::new(config.shard_count),
            Some(durability) => match WalWriter::open(&durability.wal_path) {
                Ok(writer) => {
                    let (wal, queue) = wal_channel();
                    let table = Table::with_wal(config.shard_count, wal.clone());
                    pending = Some((writer, wal, queue, durability.clone()));
                    table
                }
                Err(e) if durability.required => {
                    tracing::error!(
                        "Cannot open WAL {}: {}",
                        durability.wal_path.display(),
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "Cannot open WAL {} ({}); serving without durability",
                        durability.wal_path.display(),
                        e
                    );
                    Table::new(config.shard_count)
                }
            },
        };
        let table = Arc::new(table);

        let recovery = recover(
            &table,
            config.recover_checkpoint.as_deref(),
            config.recover_wal.as_deref(),
        )?;

        let durability = match pending {
            Some((writer, wal, queue, settings)) => Some(Durability::spawn(
                writer,
                wal,
                queue,
                Arc::clone(&table),
                &settings,
            )?),
            None => None,
        };

        tracing::info!(
            "Node {} ready: {} shards, {} keys, durable={}",
            config.node_id,
            table.shard_count(),
            table.len(),
            durability.is_some()
        );

        Ok(Self {
            config,
            table,
            durability: Mutex::new(durability),
            accepting: AtomicBool::new(true),
            recovery,
        })
    }

    /// Execute a command
    ///
    /// Routes commands to the table and maps results onto responses
    pub fn execute(&self, command: Command) -> Result<Response> {
        match command {
            Command::Get { key } => Ok(match self.get(&key) {
                Some(value) => Response::ok(Some(value)),
                None => Response::not_found(),
            }),
            Command::Put { key, value } => self.put(&key, &value).map(Response::flag),
            Command::Update { key, value } => self.update(&key, &value).map(Response::flag),
            Command::Delete { key } => self.delete(&key).map(Response::flag),
            Command::Ping => Ok(Response::ok(Some(b"PONG".to_vec()))),
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        tracing::debug!("Get key={:?}", key);
        self.table.get(key)
    }

    /// Insert or overwrite a key; returns whether it was created
    pub fn put(&self, key: &str, value: &[u8]) -> Result<bool> {
        self.ensure_accepting()?;
        tracing::debug!("Put key={:?} len={}", key, value.len());
        self.table.put(key, value)
    }

    /// Overwrite an existing key; returns whether it existed
    pub fn update(&self, key: &str, value: &[u8]) -> Result<bool> {
        self.ensure_accepting()?;
        tracing::debug!("Update key={:?} len={}", key, value.len());
        self.table.update(key, value)
    }

    /// Delete a key; returns whether it existed
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.ensure_accepting()?;
        tracing::debug!("Delete key={:?}", key);
        self.table.delete(key)
    }

    /// Take a checkpoint now
    ///
    /// Returns the number of entries written, or `None` without durability.
    pub fn checkpoint(&self) -> Result<Option<usize>> {
        match self.durability.lock().as_ref() {
            Some(durability) => durability.checkpoint().map(Some),
            None => Ok(None),
        }
    }

    /// Stop accepting mutations and drain the durability subsystem
    ///
    /// Reads keep working afterwards. Safe to call more than once.
    pub fn shutdown(&self) -> Result<()> {
        if self.accepting.swap(false, Ordering::SeqCst) {
            tracing::info!("Node {} shutting down", self.config.node_id);
        }
        match self.durability.lock().as_mut() {
            Some(durability) => durability.shutdown(),
            None => Ok(()),
        }
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.accepting.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(KvError::ShuttingDown)
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub fn is_durable(&self) -> bool {
        self.durability.lock().is_some()
    }

    /// What startup recovery loaded
    pub fn recovery_stats(&self) -> &RecoveryStats {
        &self.recovery
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
