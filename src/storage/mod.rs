//! Storage Module
//!
//! Persistent storage layer: one flat table file per store.
//!
//! ## Responsibilities
//! - Full-table scan on read, with corruption tolerance
//! - Full-table rewrite via temp file + rename
//! - Create the table (header only) on first use
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ EF BB BF            (UTF-8 marker)     │
//! ├────────────────────────────────────────┤
//! │ system_id,name,status    (header)      │
//! ├────────────────────────────────────────┤
//! │ 1,Allen,active                         │
//! │ 2,"Smith, J",closed                    │
//! │ ... one comma-delimited row per line   │
//! └────────────────────────────────────────┘
//! ```

pub mod codec;
mod record_store;

use std::path::Path;

pub use record_store::RecordStore;

/// Best-effort chmod so the files stay usable across process identities.
/// Failure (e.g. the file belongs to another user) is logged, not fatal.
pub(crate) fn apply_file_mode(path: &Path, mode: u32) {
    #[cfg(unix)]
    {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
            tracing::warn!(
                "Could not set mode {:o} on {}: {}",
                mode,
                path.display(),
                e
            );
        }
    }

    #[cfg(not(unix))]
    {
        let _ = (path, mode);
    }
}
