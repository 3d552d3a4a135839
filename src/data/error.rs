use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy for the data layer
// ---------------------------------------------------------------------------

/// Fatal at load time: the dataset cannot be used at all.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("no rows to load")]
    Empty,

    #[error("row {row}: missing '{column}' column")]
    MissingColumn { row: usize, column: String },

    #[error("row {row}: '{input}' does not match DD/MM/YYYY HH:MM:SS")]
    InvalidTimestamp {
        row: usize,
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("row {row}, column '{column}': '{value}' is not a number")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: columns differ from the first row")]
    InconsistentFields { row: usize },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("parquet column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),
}

/// A bound could not be turned into absolute timestamps.
///
/// Never crosses the filter boundary as a failure; the filter converts it
/// into [`Filtered::Fallback`](super::filter::Filtered::Fallback).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterParseError {
    #[error("invalid start '{input}': expected YYYY-MM-DD HH:MM")]
    Start { input: String },

    #[error("invalid end '{input}': expected YYYY-MM-DD HH:MM")]
    End { input: String },
}

/// A chart asked for a channel the dataset does not have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chart '{chart}' requests field '{field}' which is not in the dataset")]
pub struct MissingFieldError {
    pub chart: String,
    pub field: String,
}
