// BIN Checker - Core Library
// Exposes the pipeline for use in the CLI, the TUI, the API server, and tests

pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod join;
pub mod logging;
pub mod lookup;
pub mod normalize;
pub mod pipeline;
pub mod table;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{BinCheckError, Result};
pub use export::{export_to_path, to_csv_bytes, EXPORT_FILE_NAME, EXPORT_MIME};
pub use filter::{apply_filters, filter_options, FilterColumn, FilterOptions, FilterSelection};
pub use ingest::{read_table, read_table_from_bytes, read_table_from_path};
pub use join::left_join;
pub use lookup::{lookup_bin, LookupResult};
pub use normalize::{normalize_bin, normalize_check_list, normalize_reference, CheckList, ReferenceTable};
pub use pipeline::{run, CheckOutcome, CheckReport, CheckRequest, UploadSource, AWAITING_UPLOADS_MESSAGE};
pub use table::{Cell, Table};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
