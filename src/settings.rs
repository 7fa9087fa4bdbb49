//! Analysis settings persistence.
//!
//! Defaults for the command line live in a JSON file under the platform
//! config directory. Flags passed on the command line override them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::analysis::InterpolationMethod;
use crate::plot::PlotOptions;
use crate::source::DEFAULT_SERIES_LIMIT;

/// Settings that persist across runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Settings file version for migration support
    #[serde(default = "default_version")]
    pub version: u32,
    /// Interpolation used when resampling or filling gaps
    #[serde(default)]
    pub interpolation: InterpolationMethod,
    /// Number of lags in a range when no step is given
    #[serde(default = "default_lag_count")]
    pub lag_count: usize,
    /// Maximum number of series listed from a source
    #[serde(default = "default_series_limit")]
    pub series_limit: usize,
    #[serde(default)]
    pub plot: PlotOptions,
}

fn default_version() -> u32 {
    1
}

fn default_lag_count() -> usize {
    101
}

fn default_series_limit() -> usize {
    DEFAULT_SERIES_LIMIT
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            interpolation: InterpolationMethod::default(),
            lag_count: default_lag_count(),
            series_limit: default_series_limit(),
            plot: PlotOptions::default(),
        }
    }
}

impl AnalysisSettings {
    /// Get the config directory path for lagscan
    pub fn get_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lagscan"))
    }

    /// Get the path to the settings JSON file
    pub fn get_settings_path() -> Option<PathBuf> {
        Self::get_config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        match Self::get_settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from a specific file, falling back to defaults
    pub fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable settings {:?}: {}", path, e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read settings {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> Result<(), String> {
        let path = Self::get_settings_path()
            .ok_or_else(|| "Could not determine config directory".to_string())?;
        self.save_to(&path)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }
}
