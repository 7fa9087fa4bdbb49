//! Column-oriented time series table.
//!
//! A [`TimeSeriesTable`] holds a non-decreasing timestamp index (epoch
//! milliseconds) and any number of named `f64` columns of the same length.
//! Missing samples are stored as `f64::NAN`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::TimeDelta;
use serde::Serialize;

use crate::error::{CorrelationError, Result};

/// A named numeric column aligned to the table index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of missing (`NaN`) samples
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

/// Selects a column either by name or by position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnSelector {
    Name(String),
    Index(usize),
}

impl ColumnSelector {
    /// Interpret purely numeric text as a position, anything else as a name.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<usize>() {
            Ok(index) => Self::Index(index),
            Err(_) => Self::Name(text.trim().to_string()),
        }
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for ColumnSelector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for ColumnSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSelector::Name(name) => write!(f, "'{}'", name),
            ColumnSelector::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// A single column detached from its table, keeping its own index.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub name: String,
    pub index: Vec<i64>,
    pub values: Vec<f64>,
}

impl Series {
    /// Move values by `periods` positions along the index.
    ///
    /// `result[i] = values[i - periods]`; positions shifted in from outside
    /// the series are `NaN`. A negative `periods` pulls later values earlier.
    pub fn shift(&self, periods: i64) -> Series {
        let n = self.values.len() as i64;
        if periods.unsigned_abs() >= n as u64 {
            return Series {
                name: self.name.clone(),
                index: self.index.clone(),
                values: vec![f64::NAN; self.values.len()],
            };
        }
        let values = (0..n)
            .map(|i| {
                let src = i - periods;
                if (0..n).contains(&src) {
                    self.values[src as usize]
                } else {
                    f64::NAN
                }
            })
            .collect();

        Series {
            name: self.name.clone(),
            index: self.index.clone(),
            values,
        }
    }

    /// Values reindexed onto `index` by timestamp; absent labels become `NaN`.
    pub fn align_to(&self, index: &[i64]) -> Vec<f64> {
        if self.index.as_slice() == index {
            return self.values.clone();
        }

        let mut by_time: HashMap<i64, f64> = HashMap::with_capacity(self.index.len());
        for (&t, &v) in self.index.iter().zip(&self.values) {
            by_time.entry(t).or_insert(v);
        }
        index
            .iter()
            .map(|t| by_time.get(t).copied().unwrap_or(f64::NAN))
            .collect()
    }
}

/// Timestamp-indexed table of numeric columns.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeSeriesTable {
    index: Vec<i64>,
    columns: Vec<Column>,
}

impl TimeSeriesTable {
    /// Build a table, validating lengths, ordering and column names.
    pub fn new(index: Vec<i64>, columns: Vec<Column>) -> Result<Self> {
        if let Some(pos) = index.windows(2).position(|w| w[1] < w[0]) {
            return Err(CorrelationError::InvalidTable(format!(
                "timestamp index decreases at row {}",
                pos + 1
            )));
        }

        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.values.len() != index.len() {
                return Err(CorrelationError::InvalidTable(format!(
                    "column '{}' has {} values but the index has {}",
                    column.name,
                    column.values.len(),
                    index.len()
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(CorrelationError::InvalidTable(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { index, columns })
    }

    /// Convenience constructor from `(name, values)` pairs.
    pub fn from_columns<N, I>(index: Vec<i64>, columns: I) -> Result<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<f64>)>,
    {
        let columns = columns
            .into_iter()
            .map(|(name, values)| Column::new(name, values))
            .collect();
        Self::new(index, columns)
    }

    pub fn index(&self) -> &[i64] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a selector to a column position.
    pub fn position(&self, selector: &ColumnSelector) -> Result<usize> {
        match selector {
            ColumnSelector::Name(name) => self
                .columns
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| {
                    CorrelationError::InvalidColumnSelection(format!("unknown column '{}'", name))
                }),
            ColumnSelector::Index(index) if *index < self.columns.len() => Ok(*index),
            ColumnSelector::Index(index) => Err(CorrelationError::InvalidColumnSelection(format!(
                "column index {} out of range for {} columns",
                index,
                self.columns.len()
            ))),
        }
    }

    /// Copy one column out together with the index.
    pub fn series(&self, selector: &ColumnSelector) -> Result<Series> {
        let column = &self.columns[self.position(selector)?];
        Ok(Series {
            name: column.name.clone(),
            index: self.index.clone(),
            values: column.values.clone(),
        })
    }

    /// Subset of columns, in the order given.
    pub fn select(&self, selectors: &[ColumnSelector]) -> Result<TimeSeriesTable> {
        let columns = selectors
            .iter()
            .map(|s| self.position(s).map(|pos| self.columns[pos].clone()))
            .collect::<Result<Vec<_>>>()?;
        Self::new(self.index.clone(), columns)
    }

    /// Consecutive index differences as `(row, gap_ms)`, where `row` is the
    /// position of the later sample.
    pub fn gaps(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.index
            .windows(2)
            .enumerate()
            .map(|(i, w)| (i + 1, w[1] - w[0]))
    }

    /// The constant sampling interval, or the first gap that breaks it.
    ///
    /// The interval is the first positive gap; a repeated timestamp anywhere
    /// in the index is reported as an uneven gap of zero.
    pub fn uniform_interval(&self) -> Result<TimeDelta> {
        if self.len() < 2 {
            return Err(CorrelationError::InsufficientData {
                needed: 2,
                got: self.len(),
            });
        }
        let Some((_, expected)) = self.gaps().find(|&(_, gap)| gap > 0) else {
            return Err(CorrelationError::InvalidTable(
                "every timestamp in the index is the same".to_string(),
            ));
        };

        if let Some((position, gap)) = self.gaps().find(|&(_, gap)| gap != expected) {
            return Err(CorrelationError::UnevenSampling {
                position,
                gap: TimeDelta::milliseconds(gap),
                expected: TimeDelta::milliseconds(expected),
            });
        }
        Ok(TimeDelta::milliseconds(expected))
    }

    /// Fail on the first column that still contains missing values.
    pub fn ensure_no_missing(&self) -> Result<()> {
        for column in &self.columns {
            let count = column.missing_count();
            if count > 0 {
                return Err(CorrelationError::UnfilledMissingData {
                    column: column.name.clone(),
                    count,
                });
            }
        }
        Ok(())
    }

    /// Union of all indices with every column aligned by timestamp.
    pub fn outer_join(tables: &[TimeSeriesTable]) -> Result<TimeSeriesTable> {
        for table in tables {
            if table.gaps().any(|(_, gap)| gap <= 0) {
                return Err(CorrelationError::InvalidTable(
                    "cannot join tables with repeated timestamps".to_string(),
                ));
            }
        }

        let index: Vec<i64> = tables
            .iter()
            .flat_map(|t| t.index.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = tables
            .iter()
            .flat_map(|table| {
                table.columns.iter().map(|column| {
                    let series = Series {
                        name: column.name.clone(),
                        index: table.index.clone(),
                        values: column.values.clone(),
                    };
                    Column::new(column.name.clone(), series.align_to(&index))
                })
            })
            .collect();

        Self::new(index, columns)
    }
}
