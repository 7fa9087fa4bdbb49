//! CSV time series parser.
//!
//! Layout: one header row, the first column is the timestamp and every
//! other column is a numeric series.
//! - Timestamps: integer epoch milliseconds, RFC 3339, or
//!   `YYYY-MM-DD[ T]HH:MM:SS[.fff]` / `YYYY-MM-DD` read as UTC
//! - Empty cells and `NaN`/`NA`/`null` are missing values
//! - Lines starting with `#` are comments

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rayon::prelude::*;

use crate::error::{CorrelationError, Result};
use crate::table::{Column, TimeSeriesTable};

const MISSING_TOKENS: &[&str] = &["", "nan", "na", "null", "none"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parser for timestamp-first CSV tables
pub struct CsvTable;

impl CsvTable {
    /// Parse a timestamp cell into epoch milliseconds.
    pub fn parse_timestamp(text: &str) -> Option<i64> {
        let text = text.trim();
        if let Ok(ms) = text.parse::<i64>() {
            return Some(ms);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.timestamp_millis());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(dt.and_utc().timestamp_millis());
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    }

    /// Parse a value cell; missing tokens become `NaN`.
    pub fn parse_value(text: &str) -> Option<f64> {
        let text = text.trim();
        if MISSING_TOKENS.iter().any(|t| text.eq_ignore_ascii_case(t)) {
            return Some(f64::NAN);
        }
        text.parse::<f64>().ok()
    }

    /// Read only the column names from the header.
    pub fn parse_header(contents: &str) -> Result<Vec<String>> {
        let (line_no, header) = contents
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .find(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .ok_or_else(|| CorrelationError::parse(1, "missing header row"))?;

        let names: Vec<String> = header.split(',').map(|s| s.trim().to_string()).collect();
        if names.len() < 2 {
            return Err(CorrelationError::parse(
                line_no,
                "header needs a timestamp column and at least one series",
            ));
        }
        if let Some(pos) = names.iter().skip(1).position(|n| n.is_empty()) {
            return Err(CorrelationError::parse(
                line_no,
                format!("column {} has an empty name", pos + 2),
            ));
        }
        Ok(names[1..].to_vec())
    }

    /// Parse a full table. Rows are sorted by timestamp.
    pub fn parse(contents: &str) -> Result<TimeSeriesTable> {
        let names = Self::parse_header(contents)?;
        let width = names.len() + 1;

        // Phase 1: collect data lines after the header
        let data_lines: Vec<(usize, &str)> = contents
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
            .skip(1)
            .collect();

        // Phase 2: parse rows in parallel
        let parsed: Vec<Option<(i64, Vec<f64>)>> = data_lines
            .par_iter()
            .map(|&(line_no, line)| -> Result<Option<(i64, Vec<f64>)>> {
                let fields: Vec<&str> = line.split(',').collect();
                if fields.len() != width {
                    tracing::warn!(
                        "Skipping line {}: expected {} fields, found {}",
                        line_no,
                        width,
                        fields.len()
                    );
                    return Ok(None);
                }

                let timestamp = Self::parse_timestamp(fields[0]).ok_or_else(|| {
                    CorrelationError::parse(line_no, format!("invalid timestamp '{}'", fields[0]))
                })?;
                let values = fields[1..]
                    .iter()
                    .map(|field| {
                        Self::parse_value(field).ok_or_else(|| {
                            CorrelationError::parse(line_no, format!("invalid number '{}'", field))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                Ok(Some((timestamp, values)))
            })
            .collect::<Result<Vec<_>>>()?;

        // Phase 3: order by time and transpose into columns
        let mut rows: Vec<(i64, Vec<f64>)> = parsed.into_iter().flatten().collect();
        rows.sort_by_key(|(t, _)| *t);

        let index: Vec<i64> = rows.iter().map(|(t, _)| *t).collect();
        let columns = names
            .into_iter()
            .enumerate()
            .map(|(j, name)| Column::new(name, rows.iter().map(|(_, v)| v[j]).collect()))
            .collect::<Vec<_>>();

        tracing::info!(
            "Parsed CSV table: {} columns, {} rows",
            columns.len(),
            index.len()
        );

        TimeSeriesTable::new(index, columns)
    }
}
