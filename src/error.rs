//! Error types for FlatStore
//!
//! Provides a unified error type for all operations. Errors never cross the
//! public operation boundary: the engine folds them into an `Envelope`.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for FlatStore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] csv::Error),

    // -------------------------------------------------------------------------
    // Lock Errors
    // -------------------------------------------------------------------------
    #[error("System busy: table lock {} is held by another caller", .path.display())]
    LockBusy { path: PathBuf },

    #[error("Timed out after {waited_ms} ms waiting for table lock {}", .path.display())]
    LockTimeout { path: PathBuf, waited_ms: u64 },

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("No primary key left after {0}")]
    KeysExhausted(i64),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// True for the "could not acquire" outcomes (busy or timed out)
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, StoreError::LockBusy { .. } | StoreError::LockTimeout { .. })
    }
}
