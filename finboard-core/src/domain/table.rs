//! Parsed delimited file

use std::collections::HashMap;

use serde::Serialize;

/// One data line, keyed by header name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRow {
    values: HashMap<String, String>,
}

impl RawRow {
    /// Zip positional values against headers
    ///
    /// Missing trailing values become empty strings, extra values are dropped.
    /// When a header name repeats, the later column wins.
    pub fn from_values(headers: &[String], values: &[String]) -> Self {
        let mut map = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).cloned().unwrap_or_default();
            map.insert(header.clone(), value);
        }
        Self { values: map }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(String::as_str)
    }
}

/// Headers plus rows of one uploaded file
///
/// Row order matches the file, so row `i` is reported as `Row i+1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// SHA-256 of the file bytes, when read from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            headers,
            rows,
            checksum: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
