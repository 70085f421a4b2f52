//! Durability Module
//!
//! Background tasks that make the table durable.
//!
//! ## Responsibilities
//! - WAL writer thread: accepts records over a rendezvous channel, buffers
//!   them, flushes on a fixed interval and on shutdown, truncates on request
//! - Checkpoint thread: periodically snapshots the table and truncates the WAL
//! - Two-phase shutdown: WAL writer flushes and exits, then the checkpoint
//!   thread exits
//!
//! ## Checkpoint transaction
//! ```text
//!   checkpoint thread              table lock           WAL writer
//!   ─────────────────              ──────────           ──────────
//!   acquire shared lock  ───────►  writers blocked
//!   snapshot + write file
//!   Truncate ───────────────────────────────────────►  clear buffer, set_len(0)
//!   wait for ack         ◄───────────────────────────  ack
//!   release lock         ───────►  writers resume
//! ```
//! Writers emit records only under the exclusive lock, so while the shared
//! lock is held every record the writer has accepted is reflected in the
//! snapshot and no new record can arrive. Truncation therefore never drops
//! a record that the checkpoint does not hold.

mod checkpoint;
mod service;

pub use checkpoint::{take_checkpoint, write_snapshot};
pub use service::Durability;

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::{KvError, Result};
use crate::wal::WalRecord;

/// Control messages for the WAL writer
pub(crate) enum WalControl {
    /// Drop buffered records and empty the file, then acknowledge
    Truncate { ack: Sender<Result<()>> },

    /// Flush and exit
    Shutdown,
}

/// Request-path side of the WAL writer
///
/// Cloned into the table (records) and the checkpoint thread (truncation).
#[derive(Clone)]
pub struct WalHandle {
    records: Sender<WalRecord>,
    control: Sender<WalControl>,
}

/// Writer-thread side of the WAL channels
pub struct WalQueue {
    pub(crate) records: Receiver<WalRecord>,
    pub(crate) control: Receiver<WalControl>,
}

/// Create the channels linking a table to its WAL writer
///
/// Both channels are unbuffered: a send completes only once the writer
/// thread has taken the message.
pub fn wal_channel() -> (WalHandle, WalQueue) {
    let (records_tx, records_rx) = channel::bounded(0);
    let (control_tx, control_rx) = channel::bounded(0);
    (
        WalHandle {
            records: records_tx,
            control: control_tx,
        },
        WalQueue {
            records: records_rx,
            control: control_rx,
        },
    )
}

impl WalHandle {
    /// Hand a record to the writer, blocking until it is accepted
    pub fn append(&self, record: WalRecord) -> Result<()> {
        self.records
            .send(record)
            .map_err(|_| KvError::DurabilityUnavailable)
    }

    /// Ask the writer to truncate the WAL and wait for the result
    pub fn truncate(&self) -> Result<()> {
        let (ack, done) = channel::bounded(1);
        self.control
            .send(WalControl::Truncate { ack })
            .map_err(|_| KvError::DurabilityUnavailable)?;
        done.recv().map_err(|_| KvError::DurabilityUnavailable)?
    }

    /// Ask the writer to flush and exit
    ///
    /// Returns `false` if it had already stopped.
    pub(crate) fn shutdown(&self) -> bool {
        self.control.send(WalControl::Shutdown).is_ok()
    }
}

impl std::fmt::Debug for WalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalHandle").finish_non_exhaustive()
    }
}
