//! Configuration for FlatStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for a FlatStore table
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the table file. Companion files live next to it:
    ///   {table_path}          (BOM + header + rows)
    ///   {table_path}.lock     (advisory lock sentinel, never parsed)
    pub table_path: PathBuf,

    /// Column names in canonical order. `system_id` is injected at position 0
    /// when missing.
    pub columns: Vec<String>,

    /// Unix permission bits applied to the table and lock files after creation
    /// and after every rewrite
    pub file_mode: u32,

    // -------------------------------------------------------------------------
    // Lock Configuration
    // -------------------------------------------------------------------------
    /// What to do when the table lock is held incompatibly
    pub lock_policy: LockPolicy,
}

/// Behaviour under lock contention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPolicy {
    /// Fail immediately with `LockBusy`
    FailFast,

    /// Retry with backoff until the timeout elapses, then fail with `LockTimeout`
    Wait { timeout: Duration },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from("./flatstore_data/table.csv"),
            columns: Vec::new(),
            file_mode: 0o666,
            lock_policy: LockPolicy::FailFast,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the table file path
    pub fn table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.table_path = path.into();
        self
    }

    /// Set the column list (canonical order)
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the permission bits for the table and lock files
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.config.file_mode = mode;
        self
    }

    /// Set the lock contention policy
    pub fn lock_policy(mut self, policy: LockPolicy) -> Self {
        self.config.lock_policy = policy;
        self
    }

    /// Wait up to `ms` milliseconds for a contended lock (0 means fail fast)
    pub fn lock_wait_ms(mut self, ms: u64) -> Self {
        self.config.lock_policy = if ms == 0 {
            LockPolicy::FailFast
        } else {
            LockPolicy::Wait {
                timeout: Duration::from_millis(ms),
            }
        };
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
