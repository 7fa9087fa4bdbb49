//! Lag x column grid of correlation values.

use chrono::TimeDelta;
use serde::Serialize;

use crate::error::{CorrelationError, Result};
use crate::lag::{millis, offset_to_lag};

/// Correlations for every evaluated lag (rows) and column (columns).
///
/// Rows are in ascending offset order with one row per distinct offset.
/// Row lags are `offset * interval`, i.e. the shift applied to the
/// reference, not the sign-flipped lag reported by the ranking.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CrossCorrelationMatrix {
    #[serde(serialize_with = "millis::serialize_vec")]
    pub lags: Vec<TimeDelta>,
    pub offsets: Vec<i64>,
    pub columns: Vec<String>,
    /// Row-major values, `values[row][column]`
    pub values: Vec<Vec<f64>>,
}

impl CrossCorrelationMatrix {
    pub fn new(
        offsets: Vec<i64>,
        interval: TimeDelta,
        columns: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if values.len() != offsets.len() {
            return Err(CorrelationError::InvalidTable(format!(
                "{} rows for {} lags",
                values.len(),
                offsets.len()
            )));
        }
        if let Some(row) = values.iter().position(|r| r.len() != columns.len()) {
            return Err(CorrelationError::InvalidTable(format!(
                "row {} has {} values for {} columns",
                row,
                values[row].len(),
                columns.len()
            )));
        }

        let lags = offsets
            .iter()
            .map(|&o| offset_to_lag(o, interval))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            lags,
            offsets,
            columns,
            values,
        })
    }

    pub fn num_lags(&self) -> usize {
        self.lags.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// One column's correlation curve in row order
    pub fn column_values(&self, column: &str) -> Option<Vec<f64>> {
        let j = self.column_position(column)?;
        Some(self.values.iter().map(|row| row[j]).collect())
    }

    /// Value at a row lag and column
    pub fn value(&self, lag: TimeDelta, column: &str) -> Option<f64> {
        let i = self.lags.iter().position(|&l| l == lag)?;
        let j = self.column_position(column)?;
        Some(self.values[i][j])
    }

    /// Copy with columns rearranged into `order`.
    pub fn reorder_columns(&self, order: &[String]) -> Result<Self> {
        let positions = order
            .iter()
            .map(|name| {
                self.column_position(name).ok_or_else(|| {
                    CorrelationError::InvalidColumnSelection(format!("unknown column '{}'", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let values = self
            .values
            .iter()
            .map(|row| positions.iter().map(|&j| row[j]).collect())
            .collect();

        Ok(Self {
            lags: self.lags.clone(),
            offsets: self.offsets.clone(),
            columns: order.to_vec(),
            values,
        })
    }
}
