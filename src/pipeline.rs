// 🚀 Pipeline - ingest → normalize → join → filter → present
//
// Pure and synchronous. Every interaction builds a CheckRequest and re-runs
// the whole thing; nothing is cached between calls.

use crate::error::Result;
use crate::filter::{apply_filters, filter_options, FilterOptions, FilterSelection};
use crate::ingest::{read_table_from_bytes, read_table_from_path};
use crate::join::left_join;
use crate::lookup::{lookup_bin, LookupResult};
use crate::normalize::{normalize_check_list, normalize_reference, ReferenceTable};
use crate::table::Table;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub const AWAITING_UPLOADS_MESSAGE: &str =
    "Please upload both BIN database and BIN list to begin.";

/// Where an uploaded table comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    /// Request body of an HTTP upload
    Bytes(Vec<u8>),
    /// File on disk (terminal surfaces)
    Path(PathBuf),
}

impl UploadSource {
    pub fn load(&self) -> Result<Table> {
        match self {
            UploadSource::Bytes(bytes) => read_table_from_bytes(bytes),
            UploadSource::Path(path) => read_table_from_path(path),
        }
    }
}

/// Everything one interaction needs: two uploads, filter choices, lookup text
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub reference: Option<UploadSource>,
    pub check_list: Option<UploadSource>,
    pub filters: FilterSelection,
    pub lookup: Option<String>,
}

impl CheckRequest {
    pub fn new(reference: Option<UploadSource>, check_list: Option<UploadSource>) -> Self {
        CheckRequest {
            reference,
            check_list,
            ..Default::default()
        }
    }

    /// Builder pattern: set filter selections
    pub fn with_filters(mut self, filters: FilterSelection) -> Self {
        self.filters = filters;
        self
    }

    /// Builder pattern: set lookup input
    pub fn with_lookup(mut self, lookup: impl Into<String>) -> Self {
        self.lookup = Some(lookup.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub merged_count: usize,
    pub filtered_count: usize,
    pub summary: String,
    pub filtered: Table,
    pub options: FilterOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupResult>,
    /// Unfiltered merge, kept for the "out of N" count
    #[serde(skip)]
    pub merged: Table,
    #[serde(skip)]
    pub reference: ReferenceTable,
}

#[derive(Debug, Clone)]
pub enum CheckOutcome {
    /// One or both uploads missing; processing withheld
    AwaitingUploads,
    Ready(Box<CheckReport>),
}

impl CheckOutcome {
    pub fn report(&self) -> Option<&CheckReport> {
        match self {
            CheckOutcome::AwaitingUploads => None,
            CheckOutcome::Ready(report) => Some(report.as_ref()),
        }
    }
}

pub fn summary_line(filtered: usize, merged: usize) -> String {
    format!("Showing {} out of {} BINs", filtered, merged)
}

pub fn run(request: &CheckRequest) -> Result<CheckOutcome> {
    let (reference_src, check_list_src) = match (&request.reference, &request.check_list) {
        (Some(r), Some(c)) => (r, c),
        _ => {
            info!("Waiting for both uploads");
            return Ok(CheckOutcome::AwaitingUploads);
        }
    };

    let reference = normalize_reference(reference_src.load()?)?;
    let check_list = normalize_check_list(check_list_src.load()?)?;

    let merged = left_join(&check_list, &reference);
    let options = filter_options(&merged)?;
    let filtered = apply_filters(&merged, &request.filters)?;

    let lookup = request
        .lookup
        .as_deref()
        .and_then(|input| lookup_bin(&reference, input));

    info!(
        reference_rows = reference.len(),
        check_list = check_list.len(),
        merged = merged.len(),
        filtered = filtered.len(),
        "Pipeline complete"
    );

    Ok(CheckOutcome::Ready(Box::new(CheckReport {
        merged_count: merged.len(),
        filtered_count: filtered.len(),
        summary: summary_line(filtered.len(), merged.len()),
        filtered,
        options,
        lookup,
        merged,
        reference,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BinCheckError;
    use crate::filter::FilterColumn;

    const REFERENCE: &str = "BIN ,Issuer,Brand,Type,CountryName\n411111,BankA,Visa,Credit,US\n";
    const CHECK_LIST: &str = "BIN\n41111199\n";

    fn bytes(s: &str) -> Option<UploadSource> {
        Some(UploadSource::Bytes(s.as_bytes().to_vec()))
    }

    fn ready(request: &CheckRequest) -> CheckReport {
        match run(request).unwrap() {
            CheckOutcome::Ready(report) => *report,
            CheckOutcome::AwaitingUploads => panic!("expected a report"),
        }
    }

    #[test]
    fn test_missing_uploads_withhold_processing() {
        let none = CheckRequest::default();
        assert!(matches!(run(&none).unwrap(), CheckOutcome::AwaitingUploads));

        let only_reference = CheckRequest::new(bytes(REFERENCE), None);
        assert!(matches!(run(&only_reference).unwrap(), CheckOutcome::AwaitingUploads));

        let only_list = CheckRequest::new(None, bytes(CHECK_LIST));
        assert!(run(&only_list).unwrap().report().is_none());
    }

    #[test]
    fn test_end_to_end_example() {
        let report = ready(&CheckRequest::new(bytes(REFERENCE), bytes(CHECK_LIST)));

        assert_eq!(report.merged_count, 1);
        assert_eq!(report.filtered.value(0, 0), Some("411111"));
        assert_eq!(report.filtered.value(0, 1), Some("BankA"));
        assert_eq!(report.summary, "Showing 1 out of 1 BINs");
    }

    #[test]
    fn test_filter_by_other_issuer_yields_zero_of_one() {
        let request = CheckRequest::new(bytes(REFERENCE), bytes(CHECK_LIST))
            .with_filters(FilterSelection::new().with(FilterColumn::Issuer, "BankB"));
        let report = ready(&request);

        assert_eq!(report.filtered_count, 0);
        assert_eq!(report.merged_count, 1);
        assert_eq!(report.summary, "Showing 0 out of 1 BINs");
    }

    #[test]
    fn test_whitespace_lines_in_check_list_are_not_bins() {
        let report = ready(&CheckRequest::new(bytes(REFERENCE), bytes("BIN\n41111199\n   \n")));

        assert_eq!(report.merged_count, 1);
        assert_eq!(report.summary, "Showing 1 out of 1 BINs");
    }

    #[test]
    fn test_counts_are_bounded() {
        let reference = "BIN,Issuer,Brand,Type,CountryName\n\
                         411111,BankA,Visa,Credit,US\n\
                         411111,BankB,Visa,Debit,US\n\
                         522222,BankC,Mastercard,Credit,CA\n";
        let list = "BIN\n411111\n522222\n000000\n";
        let request = CheckRequest::new(bytes(reference), bytes(list))
            .with_filters(FilterSelection::new().with(FilterColumn::Brand, "Visa"));
        let report = ready(&request);

        assert!(report.filtered_count <= report.merged_count);
        assert!(report.merged_count <= 3 * 2);
        assert_eq!(report.merged_count, 4);
        assert_eq!(report.filtered_count, 2);
    }

    #[test]
    fn test_options_come_from_merged_not_reference() {
        let reference = "BIN,Issuer,Brand,Type,CountryName\n\
                         411111,BankA,Visa,Credit,US\n\
                         522222,BankC,Mastercard,Credit,CA\n";
        let report = ready(&CheckRequest::new(bytes(reference), bytes(CHECK_LIST)));

        assert_eq!(report.options[&FilterColumn::Issuer], vec!["BankA"]);
    }

    #[test]
    fn test_lookup_uses_reference_not_filtered_view() {
        let reference = "BIN,Issuer,Brand,Type,CountryName\n\
                         411111,BankA,Visa,Credit,US\n\
                         522222,BankC,Mastercard,Credit,CA\n";
        let request = CheckRequest::new(bytes(reference), bytes(CHECK_LIST))
            .with_filters(FilterSelection::new().with(FilterColumn::Issuer, "Nobody"))
            .with_lookup("52222299");
        let report = ready(&request);

        let lookup = report.lookup.unwrap();
        assert!(lookup.is_found());
        assert_eq!(lookup.rows().unwrap().value(0, 1), Some("BankC"));
    }

    #[test]
    fn test_lookup_absent_and_empty() {
        let absent = ready(
            &CheckRequest::new(bytes(REFERENCE), bytes(CHECK_LIST)).with_lookup("123456"),
        );
        assert!(!absent.lookup.unwrap().is_found());

        let empty = ready(&CheckRequest::new(bytes(REFERENCE), bytes(CHECK_LIST)).with_lookup(""));
        assert!(empty.lookup.is_none());
    }

    #[test]
    fn test_malformed_check_list_is_schema_error() {
        let request = CheckRequest::new(bytes(REFERENCE), bytes("BIN,Note\n411111,x\n"));
        let err = run(&request).unwrap_err();
        assert!(matches!(err, BinCheckError::CheckListShape { found: 2 }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_reference_without_filter_column_is_schema_error() {
        let request = CheckRequest::new(bytes("BIN,Issuer\n411111,BankA\n"), bytes(CHECK_LIST));
        assert!(matches!(
            run(&request).unwrap_err(),
            BinCheckError::MissingColumn { .. }
        ));
    }

    #[test]
    fn test_report_json_shape() {
        let report = ready(&CheckRequest::new(bytes(REFERENCE), bytes(CHECK_LIST)));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["summary"], "Showing 1 out of 1 BINs");
        assert_eq!(json["filtered"]["headers"][0], "BIN");
        assert_eq!(json["options"]["Issuer"][0], "BankA");
        assert!(json.get("merged").is_none());
        assert!(json.get("lookup").is_none());
    }
}
