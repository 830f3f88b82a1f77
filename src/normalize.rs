// 🧹 Normalizer - header trimming, BIN truncation, check-list column rename
//
// A BIN is compared on its first 6 characters as a string. No numeric
// coercion, so leading zeros survive.

use crate::error::{BinCheckError, Result};
use crate::filter::FilterColumn;
use crate::table::{Cell, Table};
use tracing::debug;

/// Header name of the join key in both tables
pub const BIN_COLUMN: &str = "BIN";

/// Significant prefix length of a BIN
pub const BIN_LENGTH: usize = 6;

/// Strip surrounding whitespace and keep the first 6 characters
pub fn normalize_bin(raw: &str) -> String {
    raw.trim().chars().take(BIN_LENGTH).collect()
}

/// Reference table after normalization. The BIN column holds normalized
/// values; every other column is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTable {
    table: Table,
    bin_col: usize,
}

impl ReferenceTable {
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn bin_column(&self) -> usize {
        self.bin_col
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Normalized BIN of a row; `None` when the uploaded cell was null
    pub fn bin_of<'a>(&self, row: &'a [Cell]) -> Option<&'a str> {
        row.get(self.bin_col).and_then(|c| c.as_deref())
    }

    /// Rows whose normalized BIN equals `bin`, in table order
    pub fn rows_matching<'a>(&'a self, bin: &'a str) -> impl Iterator<Item = &'a Vec<Cell>> + 'a {
        self.table
            .rows
            .iter()
            .filter(move |row| self.bin_of(row) == Some(bin))
    }
}

/// Check list after normalization: one BIN per uploaded row, in upload order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckList {
    pub bins: Vec<String>,
}

impl CheckList {
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

/// Trim header names, require BIN + the four filter columns, normalize BINs.
/// A null BIN stays null and never matches a lookup or a check-list BIN.
pub fn normalize_reference(mut table: Table) -> Result<ReferenceTable> {
    for header in table.headers.iter_mut() {
        *header = header.trim().to_string();
    }

    let bin_col = table
        .column_index(BIN_COLUMN)
        .ok_or_else(|| BinCheckError::MissingColumn {
            column: BIN_COLUMN.to_string(),
        })?;

    for column in FilterColumn::ALL {
        if table.column_index(column.header()).is_none() {
            return Err(BinCheckError::MissingColumn {
                column: column.header().to_string(),
            });
        }
    }

    for row in table.rows.iter_mut() {
        row[bin_col] = row[bin_col].as_deref().map(normalize_bin);
    }

    debug!(rows = table.len(), columns = table.column_count(), "Normalized reference table");

    Ok(ReferenceTable { table, bin_col })
}

/// Force the single check-list column to BIN and normalize its values.
pub fn normalize_check_list(table: Table) -> Result<CheckList> {
    if table.column_count() != 1 {
        return Err(BinCheckError::CheckListShape {
            found: table.column_count(),
        });
    }

    let bins: Vec<String> = table
        .rows
        .iter()
        .map(|row| normalize_bin(row[0].as_deref().unwrap_or("")))
        .collect();

    debug!(bins = bins.len(), "Normalized check list");

    Ok(CheckList { bins })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Cell {
        Some(v.to_string())
    }

    fn reference_headers() -> Vec<String> {
        ["BIN", "Issuer", "Brand", "Type", "CountryName", "Level"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    #[test]
    fn test_normalize_bin_truncates_and_trims() {
        assert_eq!(normalize_bin("41111199"), "411111");
        assert_eq!(normalize_bin("  411111  "), "411111");
        assert_eq!(normalize_bin("4111"), "4111");
        assert_eq!(normalize_bin("004512998"), "004512");
        assert_eq!(normalize_bin(""), "");
    }

    #[test]
    fn test_normalize_bin_counts_characters_not_bytes() {
        assert_eq!(normalize_bin("ÅÅÅÅÅÅÅ"), "ÅÅÅÅÅÅ");
    }

    #[test]
    fn test_reference_bins_equal_trimmed_prefix() {
        let raw = vec![" 41111199 ", "5222", "004512001", "  37828224631000"];
        let rows = raw
            .iter()
            .map(|b| vec![s(b), s("Bank"), s("Visa"), s("Credit"), s("US"), None])
            .collect();
        let reference = normalize_reference(Table::with_rows(reference_headers(), rows)).unwrap();

        for (row, original) in reference.table().rows.iter().zip(raw.iter()) {
            let expected: String = original.trim().chars().take(6).collect();
            assert_eq!(reference.bin_of(row), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_reference_headers_are_trimmed() {
        let headers = vec![" BIN ", "Issuer ", " Brand", "Type", " CountryName "]
            .into_iter()
            .map(String::from)
            .collect();
        let reference = normalize_reference(Table::new(headers)).unwrap();

        assert_eq!(
            reference.table().headers,
            vec!["BIN", "Issuer", "Brand", "Type", "CountryName"]
        );
    }

    #[test]
    fn test_reference_keeps_other_columns_verbatim() {
        let rows = vec![vec![s("411111"), s(" BankA "), s("Visa"), s("Credit"), s("US"), s("Gold")]];
        let reference = normalize_reference(Table::with_rows(reference_headers(), rows)).unwrap();

        assert_eq!(reference.table().value(0, 1), Some(" BankA "));
        assert_eq!(reference.table().value(0, 5), Some("Gold"));
    }

    #[test]
    fn test_reference_null_bin_stays_null() {
        let rows = vec![
            vec![None, s("BankA"), s("Visa"), s("Credit"), s("US"), None],
            vec![s("   "), s("BankB"), s("Visa"), s("Credit"), s("US"), None],
        ];
        let reference = normalize_reference(Table::with_rows(reference_headers(), rows)).unwrap();

        assert_eq!(reference.bin_of(&reference.table().rows[0]), None);
        assert_eq!(reference.bin_of(&reference.table().rows[1]), Some(""));
        assert_eq!(reference.rows_matching("").count(), 1);
    }

    #[test]
    fn test_reference_missing_bin_column() {
        let headers = vec!["Issuer", "Brand", "Type", "CountryName"]
            .into_iter()
            .map(String::from)
            .collect();
        let err = normalize_reference(Table::new(headers)).unwrap_err();

        match err {
            BinCheckError::MissingColumn { column } => assert_eq!(column, "BIN"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reference_missing_filter_column() {
        let headers = vec!["BIN", "Issuer", "Brand", "Type"]
            .into_iter()
            .map(String::from)
            .collect();
        let err = normalize_reference(Table::new(headers)).unwrap_err();

        match err {
            BinCheckError::MissingColumn { column } => assert_eq!(column, "CountryName"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rows_matching_keeps_duplicates() {
        let rows = vec![
            vec![s("411111"), s("BankA"), s("Visa"), s("Credit"), s("US"), None],
            vec![s("522222"), s("BankB"), s("Mastercard"), s("Debit"), s("CA"), None],
            vec![s("41111100"), s("BankC"), s("Visa"), s("Debit"), s("GB"), None],
        ];
        let reference = normalize_reference(Table::with_rows(reference_headers(), rows)).unwrap();

        let issuers: Vec<_> = reference
            .rows_matching("411111")
            .map(|r| r[1].clone().unwrap())
            .collect();
        assert_eq!(issuers, vec!["BankA", "BankC"]);
    }

    #[test]
    fn test_check_list_renames_any_single_column() {
        let table = Table::with_rows(
            vec!["card_number".to_string()],
            vec![vec![s("41111199")], vec![s(" 004512 ")], vec![None]],
        );
        let list = normalize_check_list(table).unwrap();

        assert_eq!(list.bins, vec!["411111", "004512", ""]);
    }

    #[test]
    fn test_check_list_wrong_column_count() {
        let two = Table::new(vec!["BIN".to_string(), "Note".to_string()]);
        assert!(matches!(
            normalize_check_list(two),
            Err(BinCheckError::CheckListShape { found: 2 })
        ));

        let none = Table::new(Vec::new());
        assert!(matches!(
            normalize_check_list(none),
            Err(BinCheckError::CheckListShape { found: 0 })
        ));
    }
}
