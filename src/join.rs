// 🔗 Joiner - left join of the check list onto the reference table
//
// Check list is the left side. Every check-list BIN yields at least one
// merged row; duplicate reference BINs fan out in reference order.

use crate::normalize::{CheckList, ReferenceTable, BIN_COLUMN};
use crate::table::{Cell, Table};
use std::collections::HashMap;
use tracing::debug;

/// Merged header order: BIN, then every other reference column in order
pub fn merged_headers(reference: &ReferenceTable) -> Vec<String> {
    let bin_col = reference.bin_column();
    std::iter::once(BIN_COLUMN.to_string())
        .chain(
            reference
                .table()
                .headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != bin_col)
                .map(|(_, h)| h.clone()),
        )
        .collect()
}

pub fn left_join(check_list: &CheckList, reference: &ReferenceTable) -> Table {
    let bin_col = reference.bin_column();
    let headers = merged_headers(reference);
    let width = headers.len();

    // BIN → reference row indices, in table order
    let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, row) in reference.table().rows.iter().enumerate() {
        if let Some(bin) = reference.bin_of(row) {
            index.entry(bin).or_default().push(i);
        }
    }

    let mut merged = Table::new(headers);
    let mut unmatched = 0usize;

    for bin in &check_list.bins {
        match index.get(bin.as_str()) {
            Some(matches) => {
                for &i in matches {
                    let ref_row = &reference.table().rows[i];
                    let mut row: Vec<Cell> = Vec::with_capacity(width);
                    row.push(Some(bin.clone()));
                    row.extend(
                        ref_row
                            .iter()
                            .enumerate()
                            .filter(|(c, _)| *c != bin_col)
                            .map(|(_, cell)| cell.clone()),
                    );
                    merged.rows.push(row);
                }
            }
            None => {
                unmatched += 1;
                let mut row: Vec<Cell> = vec![None; width];
                row[0] = Some(bin.clone());
                merged.rows.push(row);
            }
        }
    }

    debug!(
        check_list = check_list.len(),
        merged = merged.len(),
        unmatched,
        "Joined check list onto reference table"
    );

    merged
}
