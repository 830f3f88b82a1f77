// 📂 Ingestion - uploaded CSV → in-memory Table
//
// No schema checks here. Column requirements belong to the normalizer.

use crate::error::{BinCheckError, Result};
use crate::table::{Cell, Table};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a CSV with a header row into a Table.
///
/// Empty fields become nulls. Rows shorter than the header are padded with
/// nulls; rows longer than the header are rejected.
pub fn read_table<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
    let width = headers.len();
    let mut table = Table::new(headers);

    for result in rdr.records() {
        let record = result?;

        // A line holding only whitespace is a blank line, not a row
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }

        if record.len() > width {
            return Err(BinCheckError::RowShape {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                found: record.len(),
                expected: width,
            });
        }

        let mut row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
        row.resize(width, None);

        table.rows.push(row);
    }

    Ok(table)
}

/// Read an uploaded file body
pub fn read_table_from_bytes(bytes: &[u8]) -> Result<Table> {
    let table = read_table(bytes)?;
    debug!(
        bytes = bytes.len(),
        rows = table.len(),
        columns = table.column_count(),
        "Ingested upload"
    );
    Ok(table)
}

/// Read a CSV from disk (terminal surfaces)
pub fn read_table_from_path(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let table = read_table(file)?;
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.column_count(),
        "Ingested file"
    );
    Ok(table)
}
