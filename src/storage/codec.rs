//! Table codec
//!
//! Encoding and decoding between raw file bytes and header/rows, on top of
//! the `csv` crate.
//!
//! ## Layout
//! ```text
//! [BOM (3)] [header record] [data record]*
//! ```
//!
//! Decoding is lenient: the marker is optional, blank lines are skipped,
//! invalid UTF-8 is replaced, and records of any width are returned as-is
//! (the record store decides what to drop).

use std::io::Write;

use crate::error::Result;
use crate::table::Row;

/// UTF-8 byte order mark written at the start of every table file
pub const BOM: &[u8; 3] = b"\xEF\xBB\xBF";

/// Decoded file contents
#[derive(Debug, Default)]
pub struct Decoded {
    /// First record, if the file has one
    pub header: Option<Vec<String>>,

    /// Remaining records, any width
    pub records: Vec<Vec<String>>,
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a whole table file
pub fn decode(bytes: &[u8]) -> Result<Decoded> {
    let body = bytes.strip_prefix(BOM.as_slice()).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body);

    let mut decoded = Decoded::default();
    for record in reader.byte_records() {
        let record = record?;
        let fields: Vec<String> = record
            .iter()
            .map(|field| clean_field(&String::from_utf8_lossy(field)))
            .collect();

        if decoded.header.is_none() {
            decoded.header = Some(fields);
        } else {
            decoded.records.push(fields);
        }
    }

    Ok(decoded)
}

/// Trim whitespace, stray CR/LF and stray BOM characters from a field
pub fn clean_field(field: &str) -> String {
    field
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_string()
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a table: marker, header, then each row projected onto `columns`.
/// Fields a row lacks are written as empty strings.
pub fn encode<W: Write>(mut out: W, columns: &[String], rows: &[Row]) -> Result<()> {
    out.write_all(BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);

    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or("")),
        )?;
    }

    writer.flush()?;
    Ok(())
}
