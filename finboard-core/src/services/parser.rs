//! Delimited-text parser - file bytes to headers plus rows

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{QuoteMode, RawRow, RawTable, Separator};

/// Largest file accepted for import (5 MiB)
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// File extensions accepted for import
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["csv", "txt"];

/// Outcome of the pre-parse file check
///
/// A rejection is a message for the user, not an error: nothing failed, the
/// file is simply not offered to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum FileCheck {
    Accepted,
    Rejected(String),
}

impl FileCheck {
    pub fn is_accepted(&self) -> bool {
        matches!(self, FileCheck::Accepted)
    }
}

/// Check extension and size before reading a file
pub fn check_file(path: &Path, size: u64) -> FileCheck {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return FileCheck::Rejected(
                "Please select a CSV or TXT file (.csv or .txt)".to_string(),
            )
        }
    }

    if size > MAX_FILE_SIZE {
        return FileCheck::Rejected(format!(
            "File is too large ({:.1} MB). The maximum size is 5 MB.",
            size as f64 / (1024.0 * 1024.0)
        ));
    }

    FileCheck::Accepted
}

/// Separator and quoting used to split lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub separator: Separator,
    pub quote_mode: QuoteMode,
}

impl ParseOptions {
    pub fn new(separator: Separator) -> Self {
        Self {
            separator,
            quote_mode: QuoteMode::None,
        }
    }
}

/// Decode file bytes as UTF-8 text, dropping a leading byte order mark
pub fn decode(bytes: &[u8]) -> Result<String> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::UnreadableFile(format!("not valid UTF-8 text ({})", e)))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
}

/// Parse delimited text into a [`RawTable`]
///
/// Blank lines are skipped wherever they appear. The first remaining line is
/// the header row. Every header and value is trimmed.
pub fn parse(text: &str, options: &ParseOptions) -> Result<RawTable> {
    let mut records = match options.quote_mode {
        QuoteMode::None => split_plain(text, options.separator),
        QuoteMode::Rfc4180 => split_rfc4180(text, options.separator)?,
    }
    .into_iter();

    let headers = records.next().ok_or(Error::EmptyFile)?;
    let rows: Vec<RawRow> = records
        .map(|values| RawRow::from_values(&headers, &values))
        .collect();

    debug!(
        columns = headers.len(),
        rows = rows.len(),
        separator = %options.separator,
        "parsed delimited file"
    );

    Ok(RawTable::new(headers, rows))
}

/// Read, check and parse a file from disk
pub fn read_file(path: &Path, options: &ParseOptions) -> Result<RawTable> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::UnreadableFile(format!("{}: {}", path.display(), e)))?;

    let mut table = parse(&decode(&bytes)?, options)?;
    table.checksum = Some(checksum(&bytes));
    Ok(table)
}

/// SHA-256 of the file bytes as hex
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Split lines on the separator with no quoting
fn split_plain(text: &str, separator: Separator) -> Vec<Vec<String>> {
    let sep = separator.as_char();
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(sep).map(|v| v.trim().to_string()).collect())
        .collect()
}

/// Split with RFC 4180 quoting via the csv crate
fn split_rfc4180(text: &str, separator: Separator) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(separator.as_byte())
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let values: Vec<String> = record.iter().map(|v| v.to_string()).collect();
        // A whitespace-only line reads as one empty field; `;;` is a row of empty values
        if values.len() == 1 && values[0].is_empty() {
            continue;
        }
        records.push(values);
    }
    Ok(records)
}
