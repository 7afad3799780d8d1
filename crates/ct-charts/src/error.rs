//! Chart lookup errors.

use thiserror::Error;

/// Result type for chart operations.
pub type ChartResult<T> = Result<T, ChartError>;

/// Errors that can occur constructing or querying a compressor chart.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    /// Chart data fails validation (empty, unsorted, non-monotonic head).
    #[error("Invalid chart: {what}")]
    InvalidChart { what: &'static str },

    /// Query outside the representable range.
    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },
}
