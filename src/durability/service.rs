//! Durability service
//!
//! Owns the WAL writer and checkpoint threads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};
use crossbeam::select;

use crate::config::DurabilityConfig;
use crate::error::{KvError, Result};
use crate::table::Table;
use crate::wal::WalWriter;

use super::{take_checkpoint, WalControl, WalHandle, WalQueue};

/// Running durability subsystem for one table
pub struct Durability {
    table: Arc<Table>,
    wal: WalHandle,
    checkpoint_path: PathBuf,
    checkpoint_stop: Sender<()>,
    wal_thread: Option<JoinHandle<()>>,
    checkpoint_thread: Option<JoinHandle<()>>,
}

impl Durability {
    /// Start the WAL writer and checkpoint threads
    ///
    /// `writer` must already be open; failing to open the WAL is the
    /// caller's startup error. `wal` and `queue` are the two ends created
    /// by [`wal_channel`](super::wal_channel), and `table` must log through
    /// that same `wal`.
    pub fn spawn(
        writer: WalWriter,
        wal: WalHandle,
        queue: WalQueue,
        table: Arc<Table>,
        config: &DurabilityConfig,
    ) -> Result<Self> {
        let flush_interval = config.flush_interval;
        let wal_thread = thread::Builder::new()
            .name("ringkv-wal-writer".to_string())
            .spawn(move || run_wal_writer(writer, queue, flush_interval))?;

        let (checkpoint_stop, stop_rx) = channel::bounded(1);
        let checkpointer = Checkpointer {
            table: Arc::clone(&table),
            wal: wal.clone(),
            path: config.checkpoint_path.clone(),
            interval: config.checkpoint_interval,
        };
        let checkpoint_thread = thread::Builder::new()
            .name("ringkv-checkpoint".to_string())
            .spawn(move || checkpointer.run(stop_rx))?;

        tracing::info!(
            "Durability started: wal={} checkpoint={} flush={:?} interval={:?}",
            config.wal_path.display(),
            config.checkpoint_path.display(),
            config.flush_interval,
            config.checkpoint_interval
        );

        Ok(Self {
            table,
            wal,
            checkpoint_path: config.checkpoint_path.clone(),
            checkpoint_stop,
            wal_thread: Some(wal_thread),
            checkpoint_thread: Some(checkpoint_thread),
        })
    }

    /// Take a checkpoint now instead of waiting for the next interval
    pub fn checkpoint(&self) -> Result<usize> {
        take_checkpoint(&self.table, &self.wal, &self.checkpoint_path)
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// Flush the WAL and stop both threads
    ///
    /// Callers must have stopped issuing mutations first. Safe to call more
    /// than once.
    pub fn shutdown(&mut self) -> Result<()> {
        let mut panicked = Vec::new();

        if let Some(handle) = self.wal_thread.take() {
            if !self.wal.shutdown() {
                tracing::warn!("WAL writer had already stopped");
            }
            if handle.join().is_err() {
                panicked.push("WAL writer");
            }
        }

        if let Some(handle) = self.checkpoint_thread.take() {
            let _ = self.checkpoint_stop.send(());
            if handle.join().is_err() {
                panicked.push("checkpoint");
            }
        }

        if panicked.is_empty() {
            tracing::info!("Durability stopped");
            Ok(())
        } else {
            Err(KvError::Checkpoint(format!(
                "{} thread panicked",
                panicked.join(" and ")
            )))
        }
    }
}

impl Drop for Durability {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("Durability shutdown failed: {}", e);
        }
    }
}

/// WAL writer loop
///
/// Waits on the record channel, the flush ticker and the control channel.
/// Returns after a final flush.
fn run_wal_writer(mut writer: WalWriter, queue: WalQueue, flush_interval: Duration) {
    tracing::info!("WAL writer started: {}", writer.path().display());
    let ticker = channel::tick(flush_interval);

    loop {
        select! {
            recv(queue.records) -> msg => match msg {
                Ok(record) => {
                    if let Err(e) = writer.append(&record) {
                        tracing::warn!("Skipping WAL record for key {:?}: {}", record.key, e);
                    }
                }
                Err(_) => break,
            },
            recv(ticker) -> _ => {
                if let Err(e) = writer.flush() {
                    tracing::error!("WAL flush failed: {}", e);
                }
            }
            recv(queue.control) -> msg => match msg {
                Ok(WalControl::Truncate { ack }) => {
                    let result = writer.truncate();
                    match &result {
                        Ok(()) => tracing::debug!("WAL truncated"),
                        Err(e) => tracing::error!("WAL truncate failed: {}", e),
                    }
                    let _ = ack.send(result);
                }
                Ok(WalControl::Shutdown) | Err(_) => break,
            },
        }
    }

    if let Err(e) = writer.flush() {
        tracing::error!("Final WAL flush failed: {}", e);
    }
    tracing::info!("WAL writer stopped after {} records", writer.record_count());
}

struct Checkpointer {
    table: Arc<Table>,
    wal: WalHandle,
    path: PathBuf,
    interval: Duration,
}

impl Checkpointer {
    fn run(self, stop: Receiver<()>) {
        let ticker = channel::tick(self.interval);

        loop {
            select! {
                recv(ticker) -> _ => {
                    match take_checkpoint(&self.table, &self.wal, &self.path) {
                        Ok(count) => tracing::info!("Checkpoint complete: {} entries", count),
                        Err(KvError::DurabilityUnavailable) => {
                            tracing::warn!("WAL writer gone, stopping checkpoints");
                            break;
                        }
                        Err(e) => tracing::error!("Checkpoint failed: {}", e),
                    }
                }
                recv(stop) -> _ => break,
            }
        }
        tracing::debug!("Checkpoint thread stopped");
    }
}
