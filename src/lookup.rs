// 🔎 Single-BIN lookup against the original reference table
//
// Looks at the normalized reference table, never at the merged or filtered
// views.

use crate::normalize::{normalize_bin, ReferenceTable};
use crate::table::Table;
use serde::Serialize;
use tracing::{info, warn};

pub const FOUND_MESSAGE: &str = "BIN Found:";
pub const NOT_FOUND_MESSAGE: &str = "BIN not found in database.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupResult {
    Found { query: String, rows: Table },
    NotFound { query: String },
}

impl LookupResult {
    pub fn query(&self) -> &str {
        match self {
            LookupResult::Found { query, .. } | LookupResult::NotFound { query } => query,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, LookupResult::Found { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            LookupResult::Found { .. } => FOUND_MESSAGE,
            LookupResult::NotFound { .. } => NOT_FOUND_MESSAGE,
        }
    }

    /// Matching rows, or `None` when the BIN was not found
    pub fn rows(&self) -> Option<&Table> {
        match self {
            LookupResult::Found { rows, .. } => Some(rows),
            LookupResult::NotFound { .. } => None,
        }
    }
}

/// Returns `None` for an empty input (no lookup requested)
pub fn lookup_bin(reference: &ReferenceTable, input: &str) -> Option<LookupResult> {
    if input.is_empty() {
        return None;
    }

    let query = normalize_bin(input);
    let rows: Vec<_> = reference.rows_matching(&query).cloned().collect();

    if rows.is_empty() {
        warn!(bin = %query, "BIN not found in reference table");
        Some(LookupResult::NotFound { query })
    } else {
        info!(bin = %query, matches = rows.len(), "BIN found in reference table");
        let table = Table::with_rows(reference.table().headers.clone(), rows);
        Some(LookupResult::Found { query, rows: table })
    }
}
