//! Lag sets, duration parsing and lag formatting.
//!
//! Lags are signed `TimeDelta` values (or raw sample offsets). Before a sweep
//! they are discretized against the table's sampling interval: each lag is
//! rounded to the nearest whole number of samples (ties away from zero),
//! then the offsets are sorted and de-duplicated.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;

use crate::error::{CorrelationError, Result};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;
const MS_PER_WEEK: i64 = 7 * MS_PER_DAY;

/// The lags to evaluate in a search.
#[derive(Clone, Debug, PartialEq)]
pub enum LagSet {
    /// Signed time offsets, rounded to the sampling interval before use.
    Durations(Vec<TimeDelta>),
    /// Signed offsets already expressed in samples.
    Samples(Vec<i64>),
}

impl LagSet {
    /// `periods` evenly spaced lags from `start` to `end`, both inclusive.
    pub fn linspace(start: TimeDelta, end: TimeDelta, periods: usize) -> Result<Self> {
        if periods == 0 {
            return Err(CorrelationError::InvalidParameter(
                "lag range needs at least one period".to_string(),
            ));
        }
        let start_ms = start.num_milliseconds();
        if periods == 1 {
            return Ok(Self::Durations(vec![start]));
        }

        let span = (end.num_milliseconds() - start_ms) as f64;
        let last = (periods - 1) as f64;
        let lags = (0..periods)
            .map(|i| {
                let ms = start_ms + (span * i as f64 / last).round() as i64;
                TimeDelta::milliseconds(ms)
            })
            .collect();
        Ok(Self::Durations(lags))
    }

    /// Lags from `start` to `end` (inclusive when reachable) every `step`.
    pub fn stepped(start: TimeDelta, end: TimeDelta, step: TimeDelta) -> Result<Self> {
        if step <= TimeDelta::zero() {
            return Err(CorrelationError::InvalidParameter(format!(
                "lag step must be positive, got {}",
                format_lag(step)
            )));
        }
        if end < start {
            return Err(CorrelationError::InvalidParameter(format!(
                "lag range end {} is before start {}",
                format_lag(end),
                format_lag(start)
            )));
        }

        let mut lags = Vec::new();
        let mut lag = start;
        while lag <= end {
            lags.push(lag);
            lag = lag + step;
        }
        Ok(Self::Durations(lags))
    }

    /// Every sample offset in `range`.
    pub fn samples(range: RangeInclusive<i64>) -> Self {
        Self::Samples(range.collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Durations(lags) => lags.len(),
            Self::Samples(offsets) => offsets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discretize against `interval`: sorted, distinct sample offsets.
    pub fn sample_offsets(&self, interval: TimeDelta) -> Vec<i64> {
        let mut offsets: Vec<i64> = match self {
            Self::Durations(lags) => lags
                .iter()
                .map(|&lag| sample_offset(lag, interval))
                .collect(),
            Self::Samples(offsets) => offsets.clone(),
        };
        offsets.sort_unstable();
        offsets.dedup();
        offsets
    }
}

/// Number of whole `interval` steps nearest to `lag` (ties away from zero).
///
/// `interval` must be positive.
pub fn sample_offset(lag: TimeDelta, interval: TimeDelta) -> i64 {
    let lag_ms = lag.num_milliseconds();
    let step = interval.num_milliseconds();
    let quotient = lag_ms / step;
    let remainder = lag_ms % step;
    if 2 * remainder.abs() >= step {
        quotient + lag_ms.signum()
    } else {
        quotient
    }
}

/// Multiply an interval by a sample offset.
///
/// Fails when the product does not fit in a `TimeDelta`.
pub fn offset_to_lag(offset: i64, interval: TimeDelta) -> Result<TimeDelta> {
    offset
        .checked_mul(interval.num_milliseconds())
        .and_then(TimeDelta::try_milliseconds)
        .ok_or_else(|| {
            CorrelationError::InvalidParameter(format!(
                "lag of {} samples at {} is out of range",
                offset,
                format_lag(interval)
            ))
        })
}

/// Signed number with an optional unit suffix
static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?<sign>[+-]?)\s*(?<value>\d+(?:\.\d+)?)\s*(?<unit>ms|s|m|min|h|d|w)?\s*$")
        .expect("Invalid duration pattern")
});

/// Parse a signed duration such as `-50d`, `30s`, `15m`, `1.5h` or `250ms`.
///
/// A bare `0` is accepted without a unit.
pub fn parse_duration(text: &str) -> Result<TimeDelta> {
    let invalid = || CorrelationError::InvalidParameter(format!("invalid duration '{}'", text));

    let captures = DURATION_REGEX.captures(text).ok_or_else(invalid)?;
    let value: f64 = captures["value"].parse().map_err(|_| invalid())?;
    let unit_ms = match captures.name("unit").map(|m| m.as_str()) {
        Some("ms") => 1,
        Some("s") => MS_PER_SECOND,
        Some("m") | Some("min") => MS_PER_MINUTE,
        Some("h") => MS_PER_HOUR,
        Some("d") => MS_PER_DAY,
        Some("w") => MS_PER_WEEK,
        _ if value == 0.0 => 1,
        _ => return Err(invalid()),
    };

    let mut ms = (value * unit_ms as f64).round();
    if &captures["sign"] == "-" {
        ms = -ms;
    }
    if !ms.is_finite() || ms.abs() > i64::MAX as f64 {
        return Err(invalid());
    }
    TimeDelta::try_milliseconds(ms as i64).ok_or_else(invalid)
}

/// Human-readable lag label: `-1d 02:00:00`, `00:00:30`, `00:00:00.250`.
pub fn format_lag(lag: TimeDelta) -> String {
    let ms = lag.num_milliseconds();
    let sign = if ms < 0 { "-" } else { "" };
    let ms = ms.unsigned_abs();

    let days = ms / MS_PER_DAY as u64;
    let rem = ms % MS_PER_DAY as u64;
    let hours = rem / MS_PER_HOUR as u64;
    let minutes = rem % MS_PER_HOUR as u64 / MS_PER_MINUTE as u64;
    let seconds = rem % MS_PER_MINUTE as u64 / MS_PER_SECOND as u64;
    let millis = rem % MS_PER_SECOND as u64;

    let mut out = String::from(sign);
    if days > 0 {
        out.push_str(&format!("{}d ", days));
    }
    out.push_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds));
    if millis > 0 {
        out.push_str(&format!(".{:03}", millis));
    }
    out
}

/// Serde adapters writing lags as signed milliseconds.
pub(crate) mod millis {
    use chrono::TimeDelta;
    use serde::Serializer;

    pub fn serialize_opt<S>(lag: &Option<TimeDelta>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match lag {
            Some(lag) => serializer.serialize_some(&lag.num_milliseconds()),
            None => serializer.serialize_none(),
        }
    }

    pub fn serialize_vec<S>(lags: &[TimeDelta], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(lags.iter().map(|lag| lag.num_milliseconds()))
    }
}
