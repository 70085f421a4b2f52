//! Write-Ahead Log (WAL) Module
//!
//! Provides durability through append-only logging and full-state
//! checkpoints.
//!
//! ## Responsibilities
//! - Encode one record per accepted mutation, in application order
//! - Buffer and flush records to an append-only file
//! - Read WAL and checkpoint files back line by line
//! - Rebuild a table from checkpoint + WAL at startup
//!
//! ## File Format
//! Both files are newline-delimited JSON; byte values are standard base64.
//! ```text
//! wal.log
//! {"operation":"PUT","key":"foo","value":"YmFy"}
//! {"operation":"UPDATE","key":"foo","value":"YmF6"}
//! {"operation":"DELETE","key":"foo"}
//!
//! checkpoint.log
//! {"key":"foo","value":"YmF6"}
//! ```

mod record;
mod writer;
mod reader;
mod recovery;

pub use record::{CheckpointRecord, Operation, WalRecord};
pub use writer::{TailRepair, WalWriter};
pub use reader::{RecordReader, RecordIter};
pub use recovery::{recover, RecoveryStats};
