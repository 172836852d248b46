//! # FlatStore
//!
//! A single-file flat-file record store with:
//! - CRUD and keyword search over a comma-delimited table file
//! - Process-safe readers/writer locking on a sentinel file
//! - Atomic full-table rewrites (temp file + rename)
//! - Sanitizing of caller input against spreadsheet formula injection
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Front end (CLI, HTTP, ...)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Command → Envelope
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                               │
//! │        select / search / insert / update / delete           │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//! ┌─────────────┐      ┌─────────────────┐      ┌─────────────┐
//! │  Sanitizer  │      │ LockCoordinator │      │ RecordStore │
//! │  (inputs)   │      │ ({table}.lock)  │      │  ({table})  │
//! └─────────────┘      └─────────────────┘      └──────┬──────┘
//!                                                      │
//!                                                      ▼
//!                                               ┌─────────────┐
//!                                               │    Codec    │
//!                                               │ (BOM + CSV) │
//!                                               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod table;
pub mod sanitize;
pub mod lock;
pub mod storage;
pub mod protocol;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::{Config, LockPolicy};
pub use engine::Engine;
pub use protocol::{Command, Envelope, Filters, Payload};
pub use table::{Row, Table, PRIMARY_KEY};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlatStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
