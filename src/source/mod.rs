//! Data sources that materialize series into a [`TimeSeriesTable`].
//!
//! The lag search only needs an in-memory table; sources are the thin
//! layer that discovers series and loads them.

pub mod csv;
pub mod directory;

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::{CorrelationError, Result};
use crate::table::{ColumnSelector, TimeSeriesTable};

pub use self::csv::CsvTable;
pub use directory::CsvDirectorySource;

/// Default number of series returned by [`DataSource::list_series`]
pub const DEFAULT_SERIES_LIMIT: usize = 25;

/// Selects which series to list
#[derive(Clone, Debug)]
pub struct SeriesFilter {
    /// Only series whose id matches this pattern
    pub name_pattern: Option<Regex>,
    pub limit: usize,
}

impl Default for SeriesFilter {
    fn default() -> Self {
        Self {
            name_pattern: None,
            limit: DEFAULT_SERIES_LIMIT,
        }
    }
}

impl SeriesFilter {
    /// Filter by a regular expression over series ids.
    pub fn matching(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            CorrelationError::InvalidParameter(format!("invalid series pattern: {}", e))
        })?;
        Ok(Self {
            name_pattern: Some(regex),
            ..Self::default()
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn matches(&self, id: &str) -> bool {
        self.name_pattern
            .as_ref()
            .map_or(true, |re| re.is_match(id))
    }
}

/// Description of a series available from a source
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SeriesMetadata {
    /// Identifier accepted by [`DataSource::fetch`]
    pub id: String,
    /// Column name inside its file
    pub name: String,
    pub source: PathBuf,
    pub samples: usize,
    pub missing: usize,
}

/// Something that can list and load time series.
pub trait DataSource {
    /// Series matching `filter`, at most `filter.limit` of them.
    fn list_series(&self, filter: &SeriesFilter) -> Result<Vec<SeriesMetadata>>;

    /// Load the given series into one table aligned by timestamp.
    fn fetch(&self, ids: &[String]) -> Result<TimeSeriesTable>;
}

/// A single CSV file; series ids are the bare column names.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every column of the file.
    pub fn load(&self) -> Result<TimeSeriesTable> {
        let contents = std::fs::read_to_string(&self.path)?;
        CsvTable::parse(&contents)
    }
}

impl DataSource for CsvFileSource {
    fn list_series(&self, filter: &SeriesFilter) -> Result<Vec<SeriesMetadata>> {
        let table = self.load()?;
        Ok(table
            .columns()
            .iter()
            .filter(|c| filter.matches(&c.name))
            .take(filter.limit)
            .map(|c| SeriesMetadata {
                id: c.name.clone(),
                name: c.name.clone(),
                source: self.path.clone(),
                samples: table.len(),
                missing: c.missing_count(),
            })
            .collect())
    }

    fn fetch(&self, ids: &[String]) -> Result<TimeSeriesTable> {
        let selectors: Vec<ColumnSelector> = ids.iter().map(|id| id.as_str().into()).collect();
        self.load()?.select(&selectors)
    }
}
