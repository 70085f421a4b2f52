//! Sharded table implementation
//!
//! Fixed array of red-black trees behind a single RwLock.

use parking_lot::RwLock;

use crate::config::DEFAULT_SHARD_COUNT;
use crate::durability::WalHandle;
use crate::error::Result;
use crate::tree::RbTree;
use crate::wal::{Operation, WalRecord};

use super::shard_index;

/// Sharded ordered hash table
///
/// ## Concurrency:
/// - `get` takes the shared lock
/// - `put`/`update`/`delete` take the exclusive lock, hand the WAL record to
///   the writer (blocking until it is accepted), then mutate the shard
/// - A stalled WAL writer therefore stalls all writers; that is the
///   backpressure that bounds write throughput to log speed
pub struct Table {
    shards: RwLock<Vec<RbTree>>,
    shard_count: usize,
    wal: Option<WalHandle>,
}

impl Table {
    /// Create an in-memory table (no WAL emission)
    ///
    /// A shard count of zero falls back to the default.
    pub fn new(shard_count: usize) -> Self {
        let shard_count = if shard_count == 0 {
            DEFAULT_SHARD_COUNT
        } else {
            shard_count
        };
        let shards = (0..shard_count).map(|_| RbTree::new()).collect();
        Self {
            shards: RwLock::new(shards),
            shard_count,
            wal: None,
        }
    }

    /// Create a table whose mutations are logged through `wal`
    pub fn with_wal(shard_count: usize, wal: WalHandle) -> Self {
        Self {
            wal: Some(wal),
            ..Self::new(shard_count)
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Whether mutations are written to a WAL
    pub fn is_durable(&self) -> bool {
        self.wal.is_some()
    }

    /// Get a copy of the value stored under `key`
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let shard = self.shard_for(key);
        let shards = self.shards.read();
        shards[shard].get(key).map(<[u8]>::to_vec)
    }

    /// Insert or overwrite `key`
    ///
    /// Returns `true` if the key was created, `false` if it was overwritten.
    pub fn put(&self, key: &str, value: &[u8]) -> Result<bool> {
        let shard = self.shard_for(key);
        let mut shards = self.shards.write();

        self.log(|| WalRecord::put(key, value))?;
        Ok(shards[shard].insert(key.to_string(), value.to_vec()))
    }

    /// Overwrite `key` only if it exists
    ///
    /// Returns whether the key existed. An absent key is left absent and
    /// nothing is logged.
    pub fn update(&self, key: &str, value: &[u8]) -> Result<bool> {
        let shard = self.shard_for(key);
        let mut shards = self.shards.write();

        match shards[shard].get_mut(key) {
            Some(slot) => {
                self.log(|| WalRecord::update(key, value))?;
                *slot = value.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove `key`, returning whether it existed
    pub fn delete(&self, key: &str) -> Result<bool> {
        let shard = self.shard_for(key);
        let mut shards = self.shards.write();

        if !shards[shard].contains_key(key) {
            return Ok(false);
        }
        self.log(|| WalRecord::delete(key))?;
        Ok(shards[shard].delete(key))
    }

    /// Apply a recovered WAL record without logging it
    ///
    /// Returns what the original call returned: created for PUT, existed
    /// for UPDATE and DELETE.
    pub fn apply(&self, record: WalRecord) -> bool {
        let shard = self.shard_for(&record.key);
        let mut shards = self.shards.write();
        let tree = &mut shards[shard];

        match record.operation {
            Operation::Put => tree.insert(record.key, record.value.unwrap_or_default()),
            Operation::Update => match tree.get_mut(&record.key) {
                Some(slot) => {
                    *slot = record.value.unwrap_or_default();
                    true
                }
                None => false,
            },
            Operation::Delete => tree.delete(&record.key),
        }
    }

    /// Insert a checkpointed entry without logging it
    pub fn restore(&self, key: String, value: Vec<u8>) {
        let shard = self.shard_for(&key);
        self.shards.write()[shard].insert(key, value);
    }

    /// Number of live entries across all shards
    pub fn len(&self) -> usize {
        self.shards.read().iter().map(RbTree::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` with the shared lock held
    ///
    /// No mutation (and so no WAL emission) can happen until `f` returns.
    pub fn read_locked<R>(&self, f: impl FnOnce(Snapshot<'_>) -> R) -> R {
        let shards = self.shards.read();
        f(Snapshot { shards: &shards })
    }

    fn shard_for(&self, key: &str) -> usize {
        shard_index(key, self.shard_count)
    }

    /// Hand a record to the WAL writer; a no-op for in-memory tables
    fn log(&self, record: impl FnOnce() -> WalRecord) -> Result<()> {
        match &self.wal {
            Some(wal) => wal.append(record()),
            None => Ok(()),
        }
    }
}

/// Read-only view of every shard while the table lock is held
#[derive(Clone, Copy)]
pub struct Snapshot<'a> {
    shards: &'a [RbTree],
}

impl<'a> Snapshot<'a> {
    /// All live entries, shard by shard, each shard in key order
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a [u8])> + 'a {
        self.shards.iter().flat_map(RbTree::iter)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(RbTree::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-shard entry counts
    pub fn shard_sizes(&self) -> Vec<usize> {
        self.shards.iter().map(RbTree::len).collect()
    }

    /// Check the red-black invariants of every shard
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (idx, tree) in self.shards.iter().enumerate() {
            tree.check_invariants()
                .map_err(|e| format!("shard {}: {}", idx, e))?;
        }
        Ok(())
    }
}
