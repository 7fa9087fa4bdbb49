//! Best-lag selection and ranking.

use std::cmp::Ordering;

use chrono::TimeDelta;
use serde::Serialize;

use super::matrix::CrossCorrelationMatrix;
use crate::lag::millis;

/// Best lag found for one column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankRecord {
    pub column: String,
    /// Signed correlation at the best lag, `NaN` if never defined
    pub correlation: f64,
    /// Positive when the column responds after the reference.
    ///
    /// This is the negation of the reference shift stored in the matrix
    /// rows. `None` when the correlation was undefined at every lag.
    #[serde(serialize_with = "millis::serialize_opt")]
    pub lag: Option<TimeDelta>,
}

/// One record per column, strongest absolute correlation first.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RankingReport {
    pub records: Vec<RankRecord>,
}

impl RankingReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankRecord> {
        self.records.iter()
    }

    pub fn get(&self, column: &str) -> Option<&RankRecord> {
        self.records.iter().find(|r| r.column == column)
    }

    /// Column names in rank order
    pub fn column_order(&self) -> Vec<String> {
        self.records.iter().map(|r| r.column.clone()).collect()
    }
}

/// Lag as it appears in the report for a matrix row lag.
pub fn reported_lag(row_lag: TimeDelta) -> TimeDelta {
    -row_lag
}

/// Row of the largest `|r|` in column `j`, skipping `NaN`; earliest row wins ties.
pub fn best_row(matrix: &CrossCorrelationMatrix, j: usize) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, row) in matrix.values.iter().enumerate() {
        let magnitude = row[j].abs();
        if magnitude.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if magnitude <= current => {}
            _ => best = Some((i, magnitude)),
        }
    }
    best.map(|(i, _)| i)
}

/// Reduce the matrix to one best-lag record per column, sorted by
/// descending `|r|`. Columns without any defined value sort last; equal
/// magnitudes keep column order.
pub fn rank(matrix: &CrossCorrelationMatrix) -> RankingReport {
    let mut records: Vec<RankRecord> = matrix
        .columns
        .iter()
        .enumerate()
        .map(|(j, column)| match best_row(matrix, j) {
            Some(i) => RankRecord {
                column: column.clone(),
                correlation: matrix.values[i][j],
                lag: Some(reported_lag(matrix.lags[i])),
            },
            None => {
                tracing::warn!("Correlation undefined at every lag for column '{}'", column);
                RankRecord {
                    column: column.clone(),
                    correlation: f64::NAN,
                    lag: None,
                }
            }
        })
        .collect();

    records.sort_by(|a, b| compare_strength(a.correlation, b.correlation));
    RankingReport { records }
}

fn compare_strength(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.abs().partial_cmp(&a.abs()).unwrap_or(Ordering::Equal),
    }
}
