//! Protocol Module
//!
//! The operation surface shared by every front end.
//!
//! ### Commands
//! - SELECT: rows matching all `column = value` filters
//! - SEARCH: rows where any field contains a keyword (case-insensitive)
//! - INSERT: new row with a system-assigned `system_id`
//! - UPDATE: overwrite fields of the row with a given id
//! - DELETE: remove every row with a given id
//!
//! ### Envelope
//! Every command answers with the same shape:
//! ```text
//! { success: bool, message: text, id?: key, data?: row | [row] }
//! ```

mod command;
mod response;

pub use command::{Command, CommandType, Filters};
pub use response::{Envelope, Payload};
