//! Resampling onto an even time grid.
//!
//! Every gap in the input must be a whole multiple of the target interval.
//! The table is reindexed onto the full grid between its first and last
//! timestamp and the holes are filled by interpolation. Values are never
//! extrapolated past the first or last known sample of a column.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{CorrelationError, Result};
use crate::table::{Column, TimeSeriesTable};

/// How missing samples are filled
#[derive(
    AsRefStr, Clone, Copy, Debug, Default, Display, EnumString, PartialEq, Eq, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Straight line between the neighbouring known samples
    #[default]
    Linear,
    /// Monotone piecewise cubic Hermite (Fritsch-Carlson slopes)
    Pchip,
    /// Hold the previous known sample
    Previous,
}

/// Resample `table` to exactly `interval` spacing.
pub fn resample(
    table: &TimeSeriesTable,
    interval: TimeDelta,
    method: InterpolationMethod,
) -> Result<TimeSeriesTable> {
    let step = interval.num_milliseconds();
    if step <= 0 {
        return Err(CorrelationError::InvalidParameter(format!(
            "resampling interval must be positive, got {} ms",
            step
        )));
    }
    if table.len() < 2 {
        return Ok(table.clone());
    }

    for (position, gap) in table.gaps() {
        if gap <= 0 || gap % step != 0 {
            return Err(CorrelationError::UnalignedSampling {
                position,
                gap: TimeDelta::milliseconds(gap),
                interval,
            });
        }
    }

    if table.gaps().all(|(_, gap)| gap == step) {
        tracing::debug!("Table already evenly spaced at {} ms", step);
        return Ok(table.clone());
    }

    let first = table.index()[0];
    let last = table.index()[table.len() - 1];
    let slots = ((last - first) / step + 1) as usize;
    let grid: Vec<i64> = (0..slots as i64).map(|i| first + i * step).collect();
    let slot_of: Vec<usize> = table
        .index()
        .iter()
        .map(|t| ((t - first) / step) as usize)
        .collect();

    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let mut values = vec![f64::NAN; slots];
            for (&slot, &value) in slot_of.iter().zip(&column.values) {
                values[slot] = value;
            }
            fill_gaps(&mut values, &grid, method);
            Column::new(column.name.clone(), values)
        })
        .collect();

    tracing::debug!(
        "Resampled {} rows onto {} slots ({} ms, {})",
        table.len(),
        slots,
        step,
        method
    );

    TimeSeriesTable::new(grid, columns)
}

/// Interpolate interior missing values on the table's own index.
pub fn fill_missing(table: &TimeSeriesTable, method: InterpolationMethod) -> Result<TimeSeriesTable> {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let mut values = column.values.clone();
            fill_gaps(&mut values, table.index(), method);
            Column::new(column.name.clone(), values)
        })
        .collect();
    TimeSeriesTable::new(table.index().to_vec(), columns)
}

/// Fill every `NaN` run that has a known sample on both sides.
fn fill_gaps(values: &mut [f64], index: &[i64], method: InterpolationMethod) {
    let known: Vec<usize> = (0..values.len()).filter(|&i| !values[i].is_nan()).collect();
    if known.len() < 2 || known.len() == values.len() {
        return;
    }

    let slopes = match method {
        InterpolationMethod::Pchip => {
            let xs: Vec<f64> = known.iter().map(|&i| index[i] as f64).collect();
            let ys: Vec<f64> = known.iter().map(|&i| values[i]).collect();
            pchip_slopes(&xs, &ys)
        }
        _ => Vec::new(),
    };

    for (k, pair) in known.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        if b == a + 1 {
            continue;
        }

        let (xa, xb) = (index[a] as f64, index[b] as f64);
        let (ya, yb) = (values[a], values[b]);
        let h = xb - xa;

        for i in a + 1..b {
            let t = (index[i] as f64 - xa) / h;
            values[i] = match method {
                InterpolationMethod::Linear => ya + (yb - ya) * t,
                InterpolationMethod::Previous => ya,
                InterpolationMethod::Pchip => hermite(t, h, ya, yb, slopes[k], slopes[k + 1]),
            };
        }
    }
}

/// Cubic Hermite basis evaluated at normalized position `t` in `[0, 1]`.
fn hermite(t: f64, h: f64, y0: f64, y1: f64, d0: f64, d1: f64) -> f64 {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    h00 * y0 + h10 * h * d0 + h01 * y1 + h11 * h * d1
}

/// Knot derivatives for a shape-preserving piecewise cubic.
///
/// Interior slopes use the weighted harmonic mean of the neighbouring secants
/// and are zero at local extrema. End slopes use the one-sided three-point
/// estimate, clipped so the curve cannot overshoot.
fn pchip_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / h[k]).collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        if delta[k - 1] * delta[k] > 0.0 {
            let w1 = 2.0 * h[k] + h[k - 1];
            let w2 = h[k] + 2.0 * h[k - 1];
            d[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
        }
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn end_slope(h0: f64, h1: f64, m0: f64, m1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * m0 - h0 * m1) / (h0 + h1);
    if d.signum() != m0.signum() || m0 == 0.0 {
        0.0
    } else if m0.signum() != m1.signum() && d.abs() > 3.0 * m0.abs() {
        3.0 * m0
    } else {
        d
    }
}
