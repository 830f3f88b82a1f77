// Error types for the BIN checking pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BinCheckError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reference table is missing required column '{column}'")]
    MissingColumn { column: String },

    /// The check list must carry exactly one column, which gets renamed to BIN
    #[error("Check list must have exactly one column, found {found}")]
    CheckListShape { found: usize },

    #[error("Row {line} has {found} fields but the header has {expected}")]
    RowShape {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl BinCheckError {
    /// Schema and shape errors come from the uploaded files, not from the host
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BinCheckError::Csv(_)
                | BinCheckError::MissingColumn { .. }
                | BinCheckError::CheckListShape { .. }
                | BinCheckError::RowShape { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BinCheckError>;
