// 🔧 Filter Engine - equality-in-set filters over four merged columns
//
// Empty selection = no restriction. Filters compose with AND and never
// mutate the merged table.

use crate::error::{BinCheckError, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterColumn {
    Issuer,
    Brand,
    Type,
    CountryName,
}

impl FilterColumn {
    pub const ALL: [FilterColumn; 4] = [
        FilterColumn::Issuer,
        FilterColumn::Brand,
        FilterColumn::Type,
        FilterColumn::CountryName,
    ];

    /// Column header in the reference and merged tables
    pub fn header(&self) -> &'static str {
        match self {
            FilterColumn::Issuer => "Issuer",
            FilterColumn::Brand => "Brand",
            FilterColumn::Type => "Type",
            FilterColumn::CountryName => "CountryName",
        }
    }

    /// Human-readable name for display
    pub fn label(&self) -> &'static str {
        match self {
            FilterColumn::Issuer => "Issuer / Bank",
            FilterColumn::Brand => "Brand",
            FilterColumn::Type => "Type",
            FilterColumn::CountryName => "Country",
        }
    }

    /// Form field name used by the HTTP surface
    pub fn field_name(&self) -> &'static str {
        match self {
            FilterColumn::Issuer => "issuer",
            FilterColumn::Brand => "brand",
            FilterColumn::Type => "type",
            FilterColumn::CountryName => "country",
        }
    }

    pub fn from_field_name(name: &str) -> Option<FilterColumn> {
        FilterColumn::ALL.into_iter().find(|c| c.field_name() == name)
    }

    pub fn next(&self) -> Self {
        match self {
            FilterColumn::Issuer => FilterColumn::Brand,
            FilterColumn::Brand => FilterColumn::Type,
            FilterColumn::Type => FilterColumn::CountryName,
            FilterColumn::CountryName => FilterColumn::Issuer,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            FilterColumn::Issuer => FilterColumn::CountryName,
            FilterColumn::Brand => FilterColumn::Issuer,
            FilterColumn::Type => FilterColumn::Brand,
            FilterColumn::CountryName => FilterColumn::Type,
        }
    }
}

/// Sorted distinct non-null values per filter column
pub type FilterOptions = BTreeMap<FilterColumn, Vec<String>>;

/// Values chosen by the user, per column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    selected: BTreeMap<FilterColumn, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add a value to a column's selection
    pub fn with(mut self, column: FilterColumn, value: impl Into<String>) -> Self {
        self.select(column, value);
        self
    }

    pub fn select(&mut self, column: FilterColumn, value: impl Into<String>) {
        self.selected.entry(column).or_default().insert(value.into());
    }

    /// Flip a value in or out of a column's selection
    pub fn toggle(&mut self, column: FilterColumn, value: &str) {
        let set = self.selected.entry(column).or_default();
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        if set.is_empty() {
            self.selected.remove(&column);
        }
    }

    pub fn is_selected(&self, column: FilterColumn, value: &str) -> bool {
        self.selected
            .get(&column)
            .map(|set| set.contains(value))
            .unwrap_or(false)
    }

    pub fn values(&self, column: FilterColumn) -> Option<&BTreeSet<String>> {
        self.selected.get(&column).filter(|set| !set.is_empty())
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// True when no column restricts rows
    pub fn is_empty(&self) -> bool {
        self.selected.values().all(|set| set.is_empty())
    }
}

fn required_index(table: &Table, column: FilterColumn) -> Result<usize> {
    table
        .column_index(column.header())
        .ok_or_else(|| BinCheckError::MissingColumn {
            column: column.header().to_string(),
        })
}

pub fn filter_options(merged: &Table) -> Result<FilterOptions> {
    let mut options = FilterOptions::new();

    for column in FilterColumn::ALL {
        let idx = required_index(merged, column)?;
        let distinct: BTreeSet<&str> = merged
            .rows
            .iter()
            .filter_map(|row| row.get(idx).and_then(|c| c.as_deref()))
            .collect();
        options.insert(column, distinct.into_iter().map(String::from).collect());
    }

    Ok(options)
}

/// Copy of `merged` keeping rows that satisfy every non-empty selection.
/// A null cell never matches a non-empty selection.
pub fn apply_filters(merged: &Table, selection: &FilterSelection) -> Result<Table> {
    let mut active: Vec<(usize, &BTreeSet<String>)> = Vec::new();
    for column in FilterColumn::ALL {
        if let Some(values) = selection.values(column) {
            active.push((required_index(merged, column)?, values));
        }
    }

    if active.is_empty() {
        return Ok(merged.clone());
    }

    let filtered = merged.retain_rows(|row| {
        active.iter().all(|(idx, values)| {
            row.get(*idx)
                .and_then(|c| c.as_deref())
                .map(|v| values.contains(v))
                .unwrap_or(false)
        })
    });

    debug!(
        active_filters = active.len(),
        merged = merged.len(),
        filtered = filtered.len(),
        "Applied filters"
    );

    Ok(filtered)
}
