use thiserror::Error;

/// Errors produced while loading or analysing a sales dataset.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A required column is missing from the header row.
    #[error("missing required column `{0}`")]
    MissingColumn(&'static str),

    /// A row carries a value that cannot be interpreted.
    #[error("row {row}: invalid {field}: {message}")]
    Schema {
        row: usize,
        field: String,
        message: String,
    },

    /// Failed to read or deserialize CSV data
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),

    /// The filtered view has no rows to reduce.
    #[error("no records match the current filter")]
    EmptyView,
}

impl DashboardError {
    /// True for load-time failures that abort a dataset load.
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            DashboardError::MissingColumn(_) | DashboardError::Schema { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
