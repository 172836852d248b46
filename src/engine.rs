//! Engine Module
//!
//! The operation layer that coordinates locking, storage and sanitizing.
//!
//! ## Responsibilities
//! - Create the table and lock sentinel on first use
//! - Run select/search under a shared lock
//! - Run insert/update/delete as lock → read → mutate → rewrite → unlock
//! - Fold every outcome, including failures, into an `Envelope`

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::lock::LockCoordinator;
use crate::protocol::{Command, Envelope, Filters};
use crate::sanitize;
use crate::storage::RecordStore;
use crate::table::{normalize_columns, Row, Table, PRIMARY_KEY};

/// The table engine
///
/// ## Concurrency Model: OS-level Readers/Writer Lock
///
/// - **Reads** (select/search): shared lock on the sentinel
///   - Any number of readers, across threads and processes
///
/// - **Writes** (insert/update/delete): exclusive lock on the sentinel
///   - Read-modify-write sequences never interleave
///   - The rewrite is a rename, so readers see the old or new file, never a mix
///
/// The engine keeps no cached rows: every call re-reads the file, so several
/// engines (or processes) on the same path always agree.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Table file access
    store: RecordStore,

    /// Sentinel lock access
    locks: LockCoordinator,
}

impl Engine {
    /// Open or create a table with the given config
    ///
    /// On startup:
    /// 1. Validate the path and normalize the column list
    /// 2. Create the parent directory if needed
    /// 3. Write a header-only table if the file is missing or empty, unless
    ///    another caller holds the lock (it is creating the table)
    pub fn open(config: Config) -> Result<Self> {
        if config.table_path.as_os_str().is_empty() {
            return Err(StoreError::Config("table path must not be empty".to_string()));
        }

        if let Some(parent) = config.table_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let columns = normalize_columns(&config.columns);
        let store = RecordStore::new(&config.table_path, columns, config.file_mode);
        let locks = LockCoordinator::new(&config.table_path, config.lock_policy, config.file_mode);

        if !store.is_initialized() {
            // Exclusive so two first openers don't both write the header
            match locks.acquire_exclusive() {
                Ok(_guard) => {
                    store.create_if_missing()?;
                }
                Err(e) if e.is_lock_contention() => {
                    // Another caller holds the lock and is creating the table;
                    // later operations lock for themselves.
                    tracing::debug!(
                        "Skipping header write for {}: {}",
                        config.table_path.display(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            config,
            store,
            locks,
        })
    }

    /// Open with a path and columns (convenience method)
    ///
    /// Uses the default config otherwise
    pub fn open_path<S: Into<String>>(
        path: &Path,
        columns: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        Self::open(Config::builder().table_path(path).columns(columns).build())
    }

    /// Execute a command
    ///
    /// Routes commands to the matching operation
    pub fn execute(&self, command: Command) -> Envelope {
        tracing::trace!("Executing {:?} on {}", command.command_type(), self.table_path().display());

        match command {
            Command::Select { filters } => self.select(&filters),
            Command::Search { keyword } => self.search(&keyword),
            Command::Insert { data } => self.insert(&data),
            Command::Update { id, data } => self.update(&id, &data),
            Command::Delete { id } => self.delete(&id),
        }
    }

    // =========================================================================
    // Read Operations (shared lock)
    // =========================================================================

    /// Rows matching every filter exactly, in file order
    ///
    /// Empty filters return the whole table.
    pub fn select(&self, filters: &Filters) -> Envelope {
        let result = self.read_shared().map(|table| {
            table
                .rows
                .into_iter()
                .filter(|row| {
                    filters
                        .iter()
                        .all(|(column, expected)| row.get(column) == Some(expected))
                })
                .collect::<Vec<Row>>()
        });

        match result {
            Ok(rows) => Envelope::ok(format!("Found {} record(s)", rows.len())).with_rows(rows),
            Err(e) => self.fail("select", &e),
        }
    }

    /// Rows where any field contains `keyword`, ignoring case
    ///
    /// An empty keyword returns the whole table.
    pub fn search(&self, keyword: &str) -> Envelope {
        let needle = keyword.to_lowercase();

        let result = self.read_shared().map(|table| {
            table
                .rows
                .into_iter()
                .filter(|row| {
                    needle.is_empty()
                        || row.values().any(|value| value.to_lowercase().contains(&needle))
                })
                .collect::<Vec<Row>>()
        });

        match result {
            Ok(rows) => Envelope::ok(format!("Found {} record(s)", rows.len())).with_rows(rows),
            Err(e) => self.fail("search", &e),
        }
    }

    // =========================================================================
    // Write Operations (exclusive lock)
    // =========================================================================

    /// Insert a record with the next primary key
    ///
    /// Steps:
    /// 1. Sanitize the caller's fields
    /// 2. Under the exclusive lock, read the table and compute `max + 1`
    /// 3. Build a row with every configured column ("" when unset); any
    ///    caller-supplied `system_id` is ignored
    /// 4. Append and rewrite
    pub fn insert(&self, data: &Value) -> Envelope {
        let result = sanitize::clean(data).and_then(|fields| {
            let columns = self.store.columns();

            self.mutate(|table| {
                let id = table.next_id()?.to_string();

                let row: Row = columns
                    .iter()
                    .map(|column| {
                        let value = if column == PRIMARY_KEY {
                            id.clone()
                        } else {
                            fields.get(column).cloned().unwrap_or_default()
                        };
                        (column.clone(), value)
                    })
                    .collect();

                table.rows.push(row.clone());
                Ok((id, row))
            })
        });

        match result {
            Ok((id, row)) => {
                tracing::debug!("Inserted record {} into {}", id, self.table_path().display());
                Envelope::ok("Record inserted").with_id(id).with_row(row)
            }
            Err(e) => self.fail("insert", &e),
        }
    }

    /// Overwrite fields of the first row whose key matches `id`
    ///
    /// Only columns in the schema are written; `system_id` never changes.
    /// A missing row fails with "not found" and leaves the file untouched.
    pub fn update(&self, id: &str, data: &Value) -> Envelope {
        let result = sanitize::clean(data).and_then(|fields| {
            let columns = self.store.columns();

            self.mutate(|table| {
                let index = table
                    .position_of(id)
                    .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                let row = &mut table.rows[index];

                for (column, value) in fields {
                    if column != PRIMARY_KEY && columns.contains(&column) {
                        row.insert(column, value);
                    }
                }

                Ok(row.get(PRIMARY_KEY).cloned().unwrap_or_else(|| id.to_string()))
            })
        });

        match result {
            Ok(key) => {
                tracing::debug!("Updated record {} in {}", key, self.table_path().display());
                Envelope::ok("Record updated").with_id(key)
            }
            Err(e) => self.fail("update", &e).with_id(id),
        }
    }

    /// Remove every row whose key matches `id`
    ///
    /// Fails with "not found" (and no rewrite) when nothing matched.
    pub fn delete(&self, id: &str) -> Envelope {
        let result = self.mutate(|table| match table.remove_all(id) {
            0 => Err(StoreError::NotFound(id.to_string())),
            removed => Ok(removed),
        });

        match result {
            Ok(removed) => {
                tracing::debug!(
                    "Deleted {} row(s) with id {} from {}",
                    removed,
                    id,
                    self.table_path().display()
                );
                Envelope::ok("Record deleted").with_id(id)
            }
            Err(e) => self.fail("delete", &e).with_id(id),
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the table file path
    pub fn table_path(&self) -> &Path {
        self.store.path()
    }

    /// Get the lock sentinel path
    pub fn lock_path(&self) -> PathBuf {
        self.locks.path().to_path_buf()
    }

    /// Get the canonical column order (primary key first)
    pub fn columns(&self) -> &[String] {
        self.store.columns()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Read the table under a shared lock
    fn read_shared(&self) -> Result<Table> {
        let _guard = self.locks.acquire_shared()?;
        self.store.read_all()
    }

    /// Lock → read → mutate → rewrite → unlock
    ///
    /// If `mutation` fails the table is not rewritten. The guard drops on
    /// every path.
    fn mutate<T, F>(&self, mutation: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T>,
    {
        let _guard = self.locks.acquire_exclusive()?;

        let mut table = self.store.read_all()?;
        let outcome = mutation(&mut table)?;
        self.store.write_all(&table)?;

        Ok(outcome)
    }

    /// Log a failed operation and turn it into an envelope
    fn fail(&self, operation: &str, error: &StoreError) -> Envelope {
        let path = self.table_path().display();
        match error {
            StoreError::NotFound(_) | StoreError::InvalidRecord(_) => {
                tracing::debug!("{} on {} rejected: {}", operation, path, error);
            }
            e if e.is_lock_contention() => {
                tracing::warn!("{} on {} aborted: {}", operation, path, error);
            }
            _ => {
                tracing::error!("{} on {} failed: {}", operation, path, error);
            }
        }
        Envelope::from_error(error)
    }
}
