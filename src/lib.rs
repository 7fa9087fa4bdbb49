//! lagscan - lagged cross-correlation search for sensor and process data
//!
//! Given a table of time series and one reference column, lagscan finds for
//! every column the time offset at which it correlates most strongly with
//! the reference, and ranks the columns by that correlation.
//!
//! ## Module Structure
//!
//! - [`table`] - Timestamp-indexed column table and label-aligned series
//! - [`lag`] - Lag sets, duration parsing and formatting
//! - [`analysis`] - Resampling, correlation, lag sweep and ranking
//! - [`source`] - CSV file and directory data sources
//! - [`plot`] - Correlation-vs-lag PNG charts
//! - [`settings`] - Persisted defaults for the command line
//! - [`error`] - Error type shared by all modules

pub mod analysis;
pub mod error;
pub mod lag;
pub mod plot;
pub mod settings;
pub mod source;
pub mod table;

pub use analysis::{
    correlate_at_lag, fill_missing, rank, resample, search_best_lag, CrossCorrelationMatrix,
    InterpolationMethod, LagSearchOutcome, RankRecord, RankingReport,
};
pub use error::{CorrelationError, Result};
pub use lag::LagSet;
pub use table::{Column, ColumnSelector, Series, TimeSeriesTable};
