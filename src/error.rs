//! Error types shared by every stage of the correlation pipeline.

use chrono::TimeDelta;
use thiserror::Error;

use crate::lag::format_lag;

/// Errors raised while preparing tables or searching for lags.
///
/// Per-column numeric degeneracy (too few overlapping samples, constant
/// series) is not an error: it shows up as `NaN` in the results.
#[derive(Debug, Error)]
pub enum CorrelationError {
    /// A gap in the input is not an integer multiple of the target interval.
    #[error(
        "unaligned sampling: gap of {} before row {position} is not a multiple of {}",
        format_lag(*gap),
        format_lag(*interval)
    )]
    UnalignedSampling {
        position: usize,
        gap: TimeDelta,
        interval: TimeDelta,
    },

    /// The table handed to the lag search is not evenly spaced.
    #[error(
        "uneven sampling: gap of {} before row {position} differs from {}; resample first",
        format_lag(*gap),
        format_lag(*expected)
    )]
    UnevenSampling {
        position: usize,
        gap: TimeDelta,
        expected: TimeDelta,
    },

    /// Missing values are still present when the lag search starts.
    #[error("column '{column}' has {count} missing values; interpolate first")]
    UnfilledMissingData { column: String, count: usize },

    /// A requested column name or position does not exist.
    #[error("invalid column selection: {0}")]
    InvalidColumnSelection(String),

    /// The table violates its shape or ordering invariants.
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// A parameter is outside of its accepted domain.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough rows to run the computation.
    #[error("insufficient data: need {needed} rows, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Malformed tabular input.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CorrelationError {
    /// Build a `Parse` error for a 1-based line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CorrelationError>;
