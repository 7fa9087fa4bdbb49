//! Tests for Pearson correlation against a shifted reference
//!
//! Tests cover:
//! - Known values on small fixtures
//! - Missing value masking
//! - Label alignment of a reference with its own index
//! - Offsets past the end of the data

use lagscan::analysis::{correlate_at_lag, pearson_masked};
use lagscan::table::{ColumnSelector, Series};

use crate::common::{no_missing, with_missing};

// ============================================
// Known Values
// ============================================

#[test]
fn test_irregular_column_against_descending_reference() {
    let table = no_missing();
    let y = table.series(&ColumnSelector::from("y")).unwrap();
    let corr = correlate_at_lag(&table, &y, 0);

    let z = corr.get("z").unwrap();
    assert!(
        (z - 0.04169206868197918).abs() < 1e-12,
        "z vs y at lag 0 was {}",
        z
    );
}

#[test]
fn test_small_table_at_lag_one() {
    let table = lagscan::TimeSeriesTable::from_columns(
        vec![0, 1, 2, 3],
        [("x", vec![1.0, 7.0, 3.0, 5.0]), ("y", vec![3.0, 7.0, 6.0, 4.0])],
    )
    .unwrap();
    let x = table.series(&ColumnSelector::from("x")).unwrap();
    let corr = correlate_at_lag(&table, &x, 1);

    assert_eq!(corr.offset, 1);
    assert!((corr.get("x").unwrap() - -0.9819805060619659).abs() < 1e-12);
    assert!((corr.get("y").unwrap() - -0.9607689228305228).abs() < 1e-12);
}

#[test]
fn test_self_correlation_at_zero_is_one() {
    let table = no_missing();
    for name in ["x", "y", "z"] {
        let reference = table.series(&ColumnSelector::from(name)).unwrap();
        let corr = correlate_at_lag(&table, &reference, 0);
        assert_eq!(corr.get(name), Some(1.0), "self correlation of {}", name);
    }
}

#[test]
fn test_values_follow_table_column_order() {
    let table = no_missing();
    let x = table.series(&ColumnSelector::Index(0)).unwrap();
    let corr = correlate_at_lag(&table, &x, 0);
    let names: Vec<&str> = corr.values.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "z"]);
}

#[test]
fn test_correlations_stay_in_unit_interval() {
    let table = no_missing();
    let z = table.series(&ColumnSelector::from("z")).unwrap();
    for offset in -7..=7 {
        for (name, r) in correlate_at_lag(&table, &z, offset).values {
            assert!(
                r.is_nan() || (-1.0..=1.0).contains(&r),
                "{} at offset {} was {}",
                name,
                offset,
                r
            );
        }
    }
}

// ============================================
// Missing Values
// ============================================

#[test]
fn test_missing_values_are_masked_pairwise() {
    let table = with_missing();
    let x = table.series(&ColumnSelector::from("x")).unwrap();

    for offset in [-1, 0, 1] {
        let corr = correlate_at_lag(&table, &x, offset);
        for (name, r) in &corr.values {
            assert!(!r.is_nan(), "{} at offset {} should be defined", name, offset);
        }
    }
}

#[test]
fn test_masked_pair_matches_manual_removal() {
    let table = with_missing();
    let x = table.series(&ColumnSelector::from("x")).unwrap();
    let corr = correlate_at_lag(&table, &x, 0);

    let w = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 1.0, 2.0];
    let xs = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 7.0, 8.0, 9.0];
    let expected = pearson_masked(&w, &xs);
    assert!((corr.get("w").unwrap() - expected).abs() < 1e-12);
}

// ============================================
// Alignment and Range
// ============================================

#[test]
fn test_reference_aligns_by_timestamp() {
    let table = no_missing();
    // Reference known only on the second half of the table
    let reference = Series {
        name: "late".to_string(),
        index: vec![5, 6, 7, 8, 9],
        values: vec![5.0, 6.0, 7.0, 8.0, 9.0],
    };
    let corr = correlate_at_lag(&table, &reference, 0);
    assert!((corr.get("x").unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn test_offset_past_the_data_is_undefined() {
    let table = no_missing();
    let x = table.series(&ColumnSelector::from("x")).unwrap();
    let corr = correlate_at_lag(&table, &x, 9);
    assert!(corr.values.iter().all(|(_, r)| r.is_nan()));

    let corr = correlate_at_lag(&table, &x, -20);
    assert!(corr.values.iter().all(|(_, r)| r.is_nan()));
}

#[test]
fn test_unknown_column_lookup() {
    let table = no_missing();
    let x = table.series(&ColumnSelector::from("x")).unwrap();
    assert_eq!(correlate_at_lag(&table, &x, 0).get("missing"), None);
}
