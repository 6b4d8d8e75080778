//! Error types for the analytics engine
//!
//! Only malformed input and I/O are errors. Undefined numeric results (zero
//! denominators, single-sample dispersion) are reported as `None` in the
//! derived tables instead.

use thiserror::Error;

/// Errors raised while loading measurements or exporting derived tables.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Malformed input: required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("Malformed input: unparseable timestamp '{value}' on line {line}")]
    UnparseableTimestamp { line: u64, value: String },

    #[error("Malformed input: invalid number '{value}' in column '{column}' on line {line}")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// True for errors caused by the content of the measurement table itself.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            AnalyticsError::MissingColumn { .. }
                | AnalyticsError::UnparseableTimestamp { .. }
                | AnalyticsError::InvalidNumber { .. }
        )
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
