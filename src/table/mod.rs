//! Table Module
//!
//! The sharded in-memory table every request goes through.
//!
//! ## Responsibilities
//! - Route each key to a fixed shard by FNV-1a hash
//! - Serialize mutations behind one table-wide reader/writer lock
//! - Emit the WAL record for a mutation inside the same critical section
//!   that applies it, so log order equals application order
//! - Apply recovered records without logging them again
//!
//! ## Concurrency
//! One `parking_lot::RwLock` covers all shards. Reads share it, writes and
//! WAL emission are exclusive. The lock never leaves this module: callers
//! that need a stable view (the checkpoint task) go through
//! [`Table::read_locked`].

mod hash;
mod sharded;

pub use hash::{fnv1a_64, shard_index};
pub use sharded::{Snapshot, Table};
