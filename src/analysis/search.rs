//! Lag sweep over an evenly spaced, gap-free table.

use rayon::prelude::*;
use serde::Serialize;

use super::correlate::correlate_columns;
use super::matrix::CrossCorrelationMatrix;
use super::rank::{rank, RankingReport};
use super::timed_analyze;
use crate::error::{CorrelationError, Result};
use crate::lag::{format_lag, offset_to_lag, LagSet};
use crate::table::{ColumnSelector, TimeSeriesTable};

/// Details about how a search was run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchMetadata {
    /// Sampling interval in milliseconds
    pub interval_ms: i64,
    /// Distinct sample offsets evaluated, ascending
    pub offsets: Vec<i64>,
    pub computation_time_ms: u64,
    pub warnings: Vec<String>,
}

/// Result of [`search_best_lag`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LagSearchOutcome {
    pub report: RankingReport,
    /// Full grid with columns in report order, when requested
    pub matrix: Option<CrossCorrelationMatrix>,
    pub metadata: SearchMetadata,
}

/// Find, for every column, the lag at which it best correlates with the
/// reference column.
///
/// The table must be evenly spaced and free of missing values; resample and
/// fill it first otherwise. Each lag is rounded to the nearest whole number
/// of samples and duplicates are evaluated once.
///
/// Sign convention: a reported lag of `+d` means the column follows the
/// reference by `d` (the reference leads). Matrix rows are keyed by the
/// shift applied to the reference, which is the opposite sign.
pub fn search_best_lag(
    table: &TimeSeriesTable,
    reference: &ColumnSelector,
    lags: &LagSet,
    return_matrix: bool,
) -> Result<LagSearchOutcome> {
    if lags.is_empty() {
        return Err(CorrelationError::InvalidParameter(
            "lag set is empty".to_string(),
        ));
    }

    let interval = table.uniform_interval()?;
    table.ensure_no_missing()?;
    let reference = table.series(reference)?;

    let offsets = lags.sample_offsets(interval);
    for &offset in &offsets {
        offset_to_lag(offset, interval)?;
    }
    tracing::debug!(
        "Sweeping {} offsets ({} to {}) against '{}' at {}",
        offsets.len(),
        offsets[0],
        offsets[offsets.len() - 1],
        reference.name,
        format_lag(interval)
    );

    let (rows, computation_time_ms) = timed_analyze(|| {
        offsets
            .par_iter()
            .map(|&offset| {
                let shifted = reference.shift(offset.saturating_neg());
                correlate_columns(table, &shifted.values)
                    .into_iter()
                    .map(|(_, r)| r)
                    .collect::<Vec<f64>>()
            })
            .collect::<Vec<_>>()
    });

    let columns = table.column_names().iter().map(|c| c.to_string()).collect();
    let matrix = CrossCorrelationMatrix::new(offsets.clone(), interval, columns, rows)?;
    let report = rank(&matrix);

    let warnings = report
        .iter()
        .filter(|r| r.correlation.is_nan())
        .map(|r| format!("No defined correlation for '{}' at any lag", r.column))
        .collect();

    tracing::info!(
        "Evaluated {} lags x {} columns in {} ms",
        offsets.len(),
        table.width(),
        computation_time_ms
    );

    let matrix = if return_matrix {
        Some(matrix.reorder_columns(&report.column_order())?)
    } else {
        None
    };

    Ok(LagSearchOutcome {
        report,
        matrix,
        metadata: SearchMetadata {
            interval_ms: interval.num_milliseconds(),
            offsets,
            computation_time_ms,
            warnings,
        },
    })
}
