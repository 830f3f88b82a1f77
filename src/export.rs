// 📥 CSV export of the filtered table

use crate::error::Result;
use crate::table::Table;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub const EXPORT_FILE_NAME: &str = "filtered_bins.csv";
pub const EXPORT_MIME: &str = "text/csv";

/// Write header + rows as UTF-8 CSV. No index column; nulls are empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<W> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }

    let inner = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(inner)
}

pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    write_csv(table, Vec::new())
}

pub fn export_to_path(table: &Table, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, file)?;
    info!(path = %path.display(), rows = table.len(), "Exported filtered BINs");
    Ok(())
}
