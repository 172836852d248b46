//! Record Store
//!
//! Owns the table file: full scans on read, atomic full rewrites on write.
//! No file handle outlives a single call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::table::{Row, Table};

use super::{apply_file_mode, codec};

/// Prefix for rewrite temp files (same directory as the table)
const TEMP_PREFIX: &str = ".flatstore-";
const TEMP_SUFFIX: &str = ".tmp";

/// Raw read/write access to one table file
///
/// Callers are expected to hold the table lock: shared for `read_all`,
/// exclusive for `write_all` and `create_if_missing`.
#[derive(Debug, Clone)]
pub struct RecordStore {
    /// Table file path
    path: PathBuf,

    /// Canonical column order (primary key first)
    columns: Vec<String>,

    /// Permission bits applied after every rewrite
    file_mode: u32,
}

impl RecordStore {
    /// Create a store for `path` with already-normalized `columns`
    pub fn new(path: impl Into<PathBuf>, columns: Vec<String>, file_mode: u32) -> Self {
        Self {
            path: path.into(),
            columns,
            file_mode,
        }
    }

    /// Read the whole table
    ///
    /// - A missing or header-less file yields an empty table with the
    ///   configured columns
    /// - Rows whose width differs from the on-disk header are dropped
    /// - Configured columns missing from the on-disk header read as ""
    pub fn read_all(&self) -> Result<Table> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("Table {} does not exist yet", self.path.display());
                return Ok(Table::new(self.columns.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let decoded = codec::decode(&bytes)?;
        let header = match decoded.header {
            Some(header) if header.iter().any(|name| !name.is_empty()) => header,
            _ => return Ok(Table::new(self.columns.clone())),
        };

        let mut rows = Vec::with_capacity(decoded.records.len());
        let mut dropped = 0usize;

        for record in decoded.records {
            if record.len() != header.len() {
                dropped += 1;
                continue;
            }

            let mut row: Row = header.iter().cloned().zip(record).collect();
            for column in &self.columns {
                row.entry(column.clone()).or_default();
            }
            rows.push(row);
        }

        if dropped > 0 {
            tracing::warn!(
                "Dropped {} malformed row(s) from {}",
                dropped,
                self.path.display()
            );
        }
        tracing::debug!("Read {} row(s) from {}", rows.len(), self.path.display());

        Ok(Table {
            columns: header,
            rows,
        })
    }

    /// Rewrite the whole table atomically
    ///
    /// Steps:
    /// 1. Encode into a fresh temp file in the table's directory
    /// 2. fsync the temp file
    /// 3. Rename it over the table (copy + delete temp if rename fails)
    ///
    /// The header always uses the configured column order, not `table.columns`.
    pub fn write_all(&self, table: &Table) -> Result<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(self.dir())?;

        codec::encode(temp.as_file_mut(), &self.columns, &table.rows)?;
        temp.as_file().sync_all()?;
        apply_file_mode(temp.path(), self.file_mode);

        if let Err(err) = temp.persist(&self.path) {
            tracing::warn!(
                "Rename onto {} failed ({}), falling back to copy",
                self.path.display(),
                err.error
            );
            let temp = err.file;
            fs::copy(temp.path(), &self.path)?;
            temp.close()?;
        }

        apply_file_mode(&self.path, self.file_mode);
        tracing::debug!(
            "Wrote {} row(s) to {}",
            table.rows.len(),
            self.path.display()
        );

        Ok(())
    }

    /// Write a header-only table if the file is missing or empty
    ///
    /// Returns true when the file was created.
    pub fn create_if_missing(&self) -> Result<bool> {
        if self.is_initialized() {
            return Ok(false);
        }

        self.write_all(&Table::new(self.columns.clone()))?;
        tracing::info!(
            "Created table {} with columns {:?}",
            self.path.display(),
            self.columns
        );
        Ok(true)
    }

    /// Whether the table file exists and is non-empty (header written)
    pub fn is_initialized(&self) -> bool {
        fs::metadata(&self.path)
            .map(|meta| meta.len() > 0)
            .unwrap_or(false)
    }

    /// Get the table file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the configured column order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Directory that holds the table (and its temp files)
    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}
