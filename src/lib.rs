//! # RingKV
//!
//! A sharded in-memory key-value store with:
//! - Red-black tree shards routed by FNV-1a
//! - Write-Ahead Logging (WAL) plus periodic checkpoints for durability
//! - Crash recovery that tolerates a torn final WAL line
//! - Consistent-hash ring for placing keys across storage nodes
//! - TCP-based client protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Coordinator (ring + client per node)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  TCP
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Storage Node                               │
//! │            (TCP server, one thread per client)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │         Table (RwLock over N red-black tree shards)          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ records (rendezvous channel)
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │ WAL writer  │◄─────────│ Checkpointer │
//!   │  (thread)   │ truncate │   (thread)   │
//!   └─────────────┘          └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod tree;
pub mod table;
pub mod wal;
pub mod durability;
pub mod ring;
pub mod node;
pub mod protocol;
pub mod network;
pub mod coordinator;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::{Config, DurabilityConfig};
pub use coordinator::Coordinator;
pub use node::StorageNode;
pub use ring::HashRing;
pub use table::Table;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RingKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
