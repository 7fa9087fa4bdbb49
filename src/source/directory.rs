//! Directory of CSV files exposed as one series catalogue.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{CsvTable, DataSource, SeriesFilter, SeriesMetadata};
use crate::error::{CorrelationError, Result};
use crate::table::{Column, TimeSeriesTable};

/// Every column of every `*.csv` file under `root` is a series with id
/// `<file stem>/<column>`. Fetched series are joined on timestamp.
pub struct CsvDirectorySource {
    root: PathBuf,
}

impl CsvDirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// CSV files directly under the root, sorted by path
    pub fn csv_files(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|e| e.to_str())
                        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn stem(path: &Path) -> String {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn load(path: &Path) -> Result<TimeSeriesTable> {
        let contents = std::fs::read_to_string(path)?;
        CsvTable::parse(&contents)
    }
}

impl DataSource for CsvDirectorySource {
    fn list_series(&self, filter: &SeriesFilter) -> Result<Vec<SeriesMetadata>> {
        let mut found = Vec::new();
        for path in self.csv_files()? {
            let table = Self::load(&path)?;
            let stem = Self::stem(&path);
            for column in table.columns() {
                let id = format!("{}/{}", stem, column.name);
                if !filter.matches(&id) {
                    continue;
                }
                found.push(SeriesMetadata {
                    id,
                    name: column.name.clone(),
                    source: path.clone(),
                    samples: table.len(),
                    missing: column.missing_count(),
                });
                if found.len() >= filter.limit {
                    return Ok(found);
                }
            }
        }
        Ok(found)
    }

    fn fetch(&self, ids: &[String]) -> Result<TimeSeriesTable> {
        let files: HashMap<String, PathBuf> = self
            .csv_files()?
            .into_iter()
            .map(|path| (Self::stem(&path), path))
            .collect();

        let mut loaded: HashMap<String, TimeSeriesTable> = HashMap::new();
        let mut parts = Vec::with_capacity(ids.len());

        for id in ids {
            let (stem, name) = id.split_once('/').ok_or_else(|| {
                CorrelationError::InvalidColumnSelection(format!(
                    "series id '{}' is not of the form <file>/<column>",
                    id
                ))
            })?;
            let path = files.get(stem).ok_or_else(|| {
                CorrelationError::InvalidColumnSelection(format!("no file for series '{}'", id))
            })?;

            if !loaded.contains_key(stem) {
                loaded.insert(stem.to_string(), Self::load(path)?);
            }
            let table = &loaded[stem];
            let column = table.column(name).ok_or_else(|| {
                CorrelationError::InvalidColumnSelection(format!("unknown series '{}'", id))
            })?;

            parts.push(TimeSeriesTable::new(
                table.index().to_vec(),
                vec![Column::new(id.clone(), column.values.clone())],
            )?);
        }

        let joined = TimeSeriesTable::outer_join(&parts)?;
        tracing::info!(
            "Fetched {} series from {} files into {} rows",
            ids.len(),
            loaded.len(),
            joined.len()
        );
        Ok(joined)
    }
}
