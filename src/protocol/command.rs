//! Command definitions
//!
//! Represents operations requested by a front end.

use std::collections::BTreeMap;

use serde_json::Value;

/// Exact-match filters: column → expected value
pub type Filters = BTreeMap<String, String>;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Select,
    Search,
    Insert,
    Update,
    Delete,
}

/// A parsed command
#[derive(Debug, Clone)]
pub enum Command {
    /// Rows matching all filters (empty filters match everything)
    Select { filters: Filters },

    /// Rows with any field containing the keyword
    Search { keyword: String },

    /// Insert a record (JSON object)
    Insert { data: Value },

    /// Update the record with the given id
    Update { id: String, data: Value },

    /// Delete every record with the given id
    Delete { id: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Select { .. } => CommandType::Select,
            Command::Search { .. } => CommandType::Search,
            Command::Insert { .. } => CommandType::Insert,
            Command::Update { .. } => CommandType::Update,
            Command::Delete { .. } => CommandType::Delete,
        }
    }
}
