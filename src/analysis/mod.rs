//! Lag search and alignment engine.
//!
//! The pipeline runs leaf to root:
//! - [`resample`] puts an unevenly sampled table onto a fixed grid
//! - [`correlate`] computes Pearson correlations against a shifted reference
//! - [`search`] sweeps the lag set and assembles the [`CrossCorrelationMatrix`]
//! - [`rank`] reduces the matrix to one best-lag record per column

pub mod correlate;
pub mod matrix;
pub mod rank;
pub mod resample;
pub mod search;

use std::time::Instant;

pub use correlate::{correlate_at_lag, pearson_masked, Correlations};
pub use matrix::CrossCorrelationMatrix;
pub use rank::{rank, reported_lag, RankRecord, RankingReport};
pub use resample::{fill_missing, resample, InterpolationMethod};
pub use search::{search_best_lag, LagSearchOutcome, SearchMetadata};

/// Helper function to measure analysis execution time
pub fn timed_analyze<F, T>(f: F) -> (T, u64)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed().as_millis() as u64;
    (result, elapsed)
}
