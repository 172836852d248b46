//! Table Module
//!
//! In-memory form of one table file: a canonical column list plus rows.
//!
//! ## Invariants
//! - `columns[0]` is always `PRIMARY_KEY`
//! - Persisted keys are unique positive integers, assigned as `max + 1`
//! - Every value is text; keys are compared numerically only when both
//!   sides parse as integers

use std::collections::{BTreeMap, HashSet};

use crate::error::{Result, StoreError};

/// Reserved name of the synthetic primary-key column
pub const PRIMARY_KEY: &str = "system_id";

/// A single row: column name → text value
pub type Row = BTreeMap<String, String>;

/// A full table snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names in canonical order (primary key first)
    pub columns: Vec<String>,

    /// Rows in on-disk order
    pub rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Next primary key: highest positive key + 1, or 1 for an empty table.
    ///
    /// Keys are read with the same `i64` rule `keys_equal` uses; anything
    /// else (text, zero, negatives, out of range) is ignored. Fails once the
    /// highest key is `i64::MAX`.
    pub fn next_id(&self) -> Result<i64> {
        let max = self
            .rows
            .iter()
            .filter_map(|row| row.get(PRIMARY_KEY))
            .filter_map(|key| parse_key(key))
            .max();

        match max {
            Some(max) => max.checked_add(1).ok_or(StoreError::KeysExhausted(max)),
            None => Ok(1),
        }
    }

    /// Index of the first row whose primary key matches `id`
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get(PRIMARY_KEY).is_some_and(|key| keys_equal(key, id)))
    }

    /// Remove every row whose primary key matches `id`, returning how many went
    pub fn remove_all(&mut self, id: &str) -> usize {
        let before = self.rows.len();
        self.rows
            .retain(|row| !row.get(PRIMARY_KEY).is_some_and(|key| keys_equal(key, id)));
        before - self.rows.len()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Primary-key equality.
///
/// Both sides are compared as integers when both parse (so `"007"` equals
/// `"7"`); otherwise the comparison is exact string equality.
pub fn keys_equal(a: &str, b: &str) -> bool {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}

/// A key counts toward id generation only when it is a positive `i64`
fn parse_key(key: &str) -> Option<i64> {
    key.trim().parse::<i64>().ok().filter(|&id| id > 0)
}

/// Canonicalize a configured column list.
///
/// Names are trimmed, blanks and duplicates dropped, and `PRIMARY_KEY` is
/// placed first whether or not the caller listed it.
pub fn normalize_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    seen.insert(PRIMARY_KEY.to_string());

    let mut normalized = vec![PRIMARY_KEY.to_string()];
    for column in columns {
        let name = column.as_ref().trim();
        if name.is_empty() || !seen.insert(name.to_string()) {
            continue;
        }
        normalized.push(name.to_string());
    }
    normalized
}
