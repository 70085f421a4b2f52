//! Error types for RingKV
//!
//! Provides a unified error type for all operations. Absent keys are not
//! errors: lookups return `None` and mutations return `false`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for RingKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Durability Errors
    // -------------------------------------------------------------------------
    #[error("corrupt record in {path}:{line}: {reason}")]
    CorruptRecord {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("durability subsystem unavailable: WAL writer has stopped")]
    DurabilityUnavailable,

    #[error("Checkpoint failed: {0}")]
    Checkpoint(String),

    #[error("node is shutting down")]
    ShuttingDown,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Routing Errors
    // -------------------------------------------------------------------------
    #[error("consistent hash ring is empty")]
    EmptyRing,

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Remote error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
