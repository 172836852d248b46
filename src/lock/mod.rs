//! Lock Module
//!
//! Advisory locking on a per-table sentinel file.
//!
//! ## Responsibilities
//! - Shared locks for readers (any number at once)
//! - Exclusive locks for writers (one at a time, no readers)
//! - Release on every exit path via `ScopedLock`'s `Drop`
//!
//! ## Sentinel File
//! ```text
//! {table_path}.lock   ← OS lock target, never read or written
//! ```
//!
//! The data file itself is never locked: writers replace it by rename,
//! which would orphan any lock held on the old inode.

mod coordinator;

pub use coordinator::{LockCoordinator, LockMode, ScopedLock, LOCK_SUFFIX};
