//! Envelope definitions
//!
//! The uniform result every operation returns.

use serde::Serialize;

use crate::error::StoreError;
use crate::table::Row;

/// Row payload carried by an envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// The row created by an insert
    Row(Row),

    /// Rows returned by select/search
    Rows(Vec<Row>),
}

/// Result of a store operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Whether the operation succeeded
    pub success: bool,

    /// Human-readable outcome
    pub message: String,

    /// Affected key (insert/update/delete)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Returned rows (select/search) or created row (insert)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Payload>,
}

impl Envelope {
    /// Create a success envelope with no id or data
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
            data: None,
        }
    }

    /// Create a failure envelope
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
            data: None,
        }
    }

    /// Create a failure envelope from an error
    pub fn from_error(error: &StoreError) -> Self {
        let message = match error {
            StoreError::LockBusy { .. } => "System busy, please try again".to_string(),
            StoreError::NotFound(_) => "Record not found".to_string(),
            other => other.to_string(),
        };
        Self::failure(message)
    }

    /// Attach an id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a single row
    pub fn with_row(mut self, row: Row) -> Self {
        self.data = Some(Payload::Row(row));
        self
    }

    /// Attach a row list
    pub fn with_rows(mut self, rows: Vec<Row>) -> Self {
        self.data = Some(Payload::Rows(rows));
        self
    }

    /// Rows carried by this envelope (a single row counts as one)
    pub fn rows(&self) -> &[Row] {
        match &self.data {
            Some(Payload::Rows(rows)) => rows,
            Some(Payload::Row(row)) => std::slice::from_ref(row),
            None => &[],
        }
    }

    /// Single row carried by this envelope, if any
    pub fn row(&self) -> Option<&Row> {
        match &self.data {
            Some(Payload::Row(row)) => Some(row),
            _ => None,
        }
    }
}
