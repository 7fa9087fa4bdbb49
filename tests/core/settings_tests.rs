//! Tests for analysis settings persistence
//!
//! Tests cover:
//! - Default settings values
//! - Serialization/deserialization
//! - Settings roundtrip through a file
//! - Fallback on missing or corrupt files

use std::str::FromStr;

use lagscan::analysis::InterpolationMethod;
use lagscan::settings::AnalysisSettings;

use crate::common::{temp_dir, write_file};

// ============================================
// Default Settings Tests
// ============================================

#[test]
fn test_settings_defaults() {
    let settings = AnalysisSettings::default();
    assert_eq!(settings.version, 1);
    assert_eq!(settings.interpolation, InterpolationMethod::Linear);
    assert_eq!(settings.lag_count, 101);
    assert_eq!(settings.series_limit, 25);
    assert!(settings.plot.separate);
}

#[test]
fn test_settings_path_ends_with_file_name() {
    if let Some(path) = AnalysisSettings::get_settings_path() {
        assert!(path.ends_with("lagscan/settings.json"));
    }
}

// ============================================
// Serialization Tests
// ============================================

#[test]
fn test_settings_serialize_method_lowercase() {
    let settings = AnalysisSettings {
        interpolation: InterpolationMethod::Pchip,
        ..AnalysisSettings::default()
    };
    let json = serde_json::to_string(&settings).unwrap();
    assert!(json.contains("\"interpolation\":\"pchip\""));
}

#[test]
fn test_settings_partial_json_uses_defaults() {
    let settings: AnalysisSettings = serde_json::from_str(r#"{"lag_count": 41}"#).unwrap();
    assert_eq!(settings.lag_count, 41);
    assert_eq!(settings.version, 1);
    assert_eq!(settings.series_limit, 25);
    assert_eq!(settings.plot.width, 1500);
}

#[test]
fn test_method_names_parse_case_insensitively() {
    assert_eq!(
        InterpolationMethod::from_str("PCHIP").unwrap(),
        InterpolationMethod::Pchip
    );
    assert_eq!(
        InterpolationMethod::from_str("previous").unwrap(),
        InterpolationMethod::Previous
    );
    assert!(InterpolationMethod::from_str("cubic").is_err());
}

// ============================================
// File Roundtrip Tests
// ============================================

#[test]
fn test_settings_roundtrip_through_file() {
    let dir = temp_dir("settings-roundtrip");
    let path = dir.join("nested").join("settings.json");

    let mut settings = AnalysisSettings {
        interpolation: InterpolationMethod::Previous,
        lag_count: 61,
        ..AnalysisSettings::default()
    };
    settings.plot.separate = false;

    settings.save_to(&path).unwrap();
    assert_eq!(AnalysisSettings::load_from(&path), settings);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = temp_dir("settings-missing");
    let loaded = AnalysisSettings::load_from(&dir.join("absent.json"));
    assert_eq!(loaded, AnalysisSettings::default());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_corrupt_file_gives_defaults() {
    let dir = temp_dir("settings-corrupt");
    let path = write_file(&dir, "settings.json", "{ not json");
    assert_eq!(AnalysisSettings::load_from(&path), AnalysisSettings::default());
    let _ = std::fs::remove_dir_all(&dir);
}
