//! Pearson correlation of every column against a shifted reference.

use serde::Serialize;

use crate::table::{Series, TimeSeriesTable};

/// Correlation of each table column against the reference at one offset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Correlations {
    /// Sample offset the reference was shifted by
    pub offset: i64,
    /// `(column, r)` in table column order; `NaN` when undefined
    pub values: Vec<(String, f64)>,
}

impl Correlations {
    /// Look up a column by name
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|&(_, r)| r)
    }
}

/// Correlate every column with `reference[t + offset]`.
///
/// The reference is shifted along its own index and then aligned to the
/// table by timestamp, so a reference with a different index compares by
/// label rather than by position. Each pair is computed over the positions
/// where both sides are present.
pub fn correlate_at_lag(table: &TimeSeriesTable, reference: &Series, offset: i64) -> Correlations {
    let shifted = reference.shift(offset.saturating_neg()).align_to(table.index());
    let values = correlate_columns(table, &shifted);
    Correlations { offset, values }
}

/// Same as [`correlate_at_lag`] without labels, for the sweep hot loop.
pub(crate) fn correlate_columns(table: &TimeSeriesTable, reference: &[f64]) -> Vec<(String, f64)> {
    table
        .columns()
        .iter()
        .map(|column| (column.name.clone(), pearson_masked(&column.values, reference)))
        .collect()
}

/// Pearson correlation over the pairs where neither side is `NaN`.
///
/// Returns `NaN` for fewer than two pairs or when either side is constant
/// over the overlap.
pub fn pearson_masked(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(&a, &b)| (a, b))
        .collect();

    if pairs.len() < 2 {
        return f64::NAN;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for &(a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom > 0.0 {
        (cov / denom).clamp(-1.0, 1.0)
    } else {
        f64::NAN
    }
}
