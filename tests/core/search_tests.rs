//! Tests for the lag search and ranking
//!
//! Tests cover:
//! - Recovering known delays and their sign
//! - Report shape and ordering
//! - Matrix layout and consistency with the report
//! - Rejected inputs

use chrono::TimeDelta;
use lagscan::analysis::{rank, search_best_lag, CrossCorrelationMatrix};
use lagscan::error::CorrelationError;
use lagscan::lag::LagSet;
use lagscan::table::{ColumnSelector, TimeSeriesTable};

use crate::common::{daily_process, delayed_pair, no_missing, with_missing};

fn lag_days(start: i64, end: i64) -> LagSet {
    LagSet::linspace(
        TimeDelta::days(start),
        TimeDelta::days(end),
        (end - start + 1) as usize,
    )
    .unwrap()
}

// ============================================
// Known Delays
// ============================================

#[test]
fn test_delayed_copy_is_found_with_positive_lag() {
    for delay in [1, 4, 9] {
        let table = delayed_pair(200, delay);
        let outcome =
            search_best_lag(&table, &ColumnSelector::from("a"), &LagSet::samples(-12..=12), false)
                .unwrap();
        let b = outcome.report.get("b").unwrap();
        assert_eq!(b.lag, Some(TimeDelta::seconds(delay)), "delay {}", delay);
        assert!((b.correlation - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_leading_column_is_found_with_negative_lag() {
    let table = delayed_pair(200, 5);
    let outcome =
        search_best_lag(&table, &ColumnSelector::from("b"), &LagSet::samples(-12..=12), false)
            .unwrap();
    let a = outcome.report.get("a").unwrap();
    assert_eq!(a.lag, Some(TimeDelta::seconds(-5)));
}

#[test]
fn test_daily_process_lags() {
    let table = daily_process(365);
    let outcome =
        search_best_lag(&table, &ColumnSelector::from("y"), &lag_days(-80, 80), false).unwrap();

    let y = outcome.report.get("y").unwrap();
    assert_eq!(y.correlation, 1.0);
    assert_eq!(y.lag, Some(TimeDelta::zero()));

    let x = outcome.report.get("x").unwrap();
    assert_eq!(x.lag, Some(TimeDelta::days(30)));
    assert!(x.correlation > 0.95);

    let z = outcome.report.get("z").unwrap();
    assert_eq!(z.lag, Some(TimeDelta::days(60)));
    assert!(z.correlation > 0.95);
}

#[test]
fn test_duration_lags_round_to_nearest_sample() {
    let table = delayed_pair(120, 3);
    // 2.6 s and 3.4 s both land on 3 samples
    let lags = LagSet::Durations(vec![
        TimeDelta::milliseconds(-3400),
        TimeDelta::milliseconds(-2600),
        TimeDelta::milliseconds(2600),
        TimeDelta::milliseconds(3400),
    ]);
    let outcome = search_best_lag(&table, &ColumnSelector::from("a"), &lags, true).unwrap();
    assert_eq!(outcome.metadata.offsets, vec![-3, 3]);
    assert_eq!(outcome.metadata.interval_ms, 1000);
    assert_eq!(
        outcome.report.get("b").unwrap().lag,
        Some(TimeDelta::seconds(3))
    );
}

// ============================================
// Report Shape
// ============================================

#[test]
fn test_report_has_one_record_per_column() {
    let table = no_missing();
    let outcome =
        search_best_lag(&table, &ColumnSelector::Index(0), &LagSet::samples(-3..=3), false)
            .unwrap();
    assert_eq!(outcome.report.len(), table.width());

    let mut columns = outcome.report.column_order();
    columns.sort();
    assert_eq!(columns, vec!["x", "y", "z"]);
}

#[test]
fn test_report_is_sorted_by_strength() {
    let table = daily_process(200);
    let outcome =
        search_best_lag(&table, &ColumnSelector::from("x"), &lag_days(-40, 40), false).unwrap();
    let strengths: Vec<f64> = outcome.report.iter().map(|r| r.correlation.abs()).collect();
    for pair in strengths.windows(2) {
        assert!(pair[0] >= pair[1], "report not sorted: {:?}", strengths);
    }
    assert_eq!(outcome.report.records[0].column, "x");
}

#[test]
fn test_best_lag_maximizes_absolute_correlation() {
    let table = no_missing();
    let outcome =
        search_best_lag(&table, &ColumnSelector::from("z"), &LagSet::samples(-4..=4), true)
            .unwrap();
    let matrix = outcome.matrix.unwrap();

    for record in outcome.report.iter() {
        let values = matrix.column_values(&record.column).unwrap();
        let best = values
            .iter()
            .filter(|v| !v.is_nan())
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        assert_eq!(record.correlation.abs(), best, "column {}", record.column);
    }
}

#[test]
fn test_single_lag_reports_negated_shift() {
    let table = no_missing();
    let outcome = search_best_lag(
        &table,
        &ColumnSelector::from("x"),
        &LagSet::Durations(vec![TimeDelta::milliseconds(2)]),
        false,
    )
    .unwrap();
    // Lags shift the reference, so the report carries the opposite sign
    for record in outcome.report.iter() {
        assert_eq!(record.lag, Some(TimeDelta::milliseconds(-2)));
    }
}

// ============================================
// Matrix
// ============================================

#[test]
fn test_matrix_matches_report() {
    let table = daily_process(150);
    let lags = lag_days(-35, 35);
    let with_matrix = search_best_lag(&table, &ColumnSelector::from("y"), &lags, true).unwrap();
    let without = search_best_lag(&table, &ColumnSelector::from("y"), &lags, false).unwrap();

    assert_eq!(with_matrix.report, without.report);

    let matrix = with_matrix.matrix.unwrap();
    assert_eq!(matrix.num_lags(), 71);
    assert_eq!(matrix.columns, with_matrix.report.column_order());
    assert_eq!(matrix.lags.first(), Some(&TimeDelta::days(-35)));
    assert_eq!(matrix.lags.last(), Some(&TimeDelta::days(35)));

    // Reported lag is the negated matrix row lag
    for record in with_matrix.report.iter() {
        let lag = record.lag.unwrap();
        assert_eq!(matrix.value(-lag, &record.column), Some(record.correlation));
    }
}

#[test]
fn test_rank_of_matrix_is_search_report() {
    let table = no_missing();
    let outcome =
        search_best_lag(&table, &ColumnSelector::from("y"), &LagSet::samples(-2..=2), true)
            .unwrap();
    let matrix = outcome.matrix.unwrap();
    assert_eq!(rank(&matrix), outcome.report);
}

#[test]
fn test_all_missing_column_has_no_lag() {
    let matrix = CrossCorrelationMatrix::new(
        vec![-1, 0, 1],
        TimeDelta::seconds(1),
        vec!["ok".into(), "empty".into()],
        vec![
            vec![0.2, f64::NAN],
            vec![0.9, f64::NAN],
            vec![-0.4, f64::NAN],
        ],
    )
    .unwrap();
    let report = rank(&matrix);
    assert_eq!(report.records[0].column, "ok");
    assert_eq!(report.records[0].lag, Some(TimeDelta::zero()));
    assert_eq!(report.records[1].column, "empty");
    assert_eq!(report.records[1].lag, None);
    assert!(report.records[1].correlation.is_nan());
}

#[test]
fn test_outcome_serializes_lags_as_milliseconds() {
    let table = delayed_pair(60, 2);
    let outcome =
        search_best_lag(&table, &ColumnSelector::from("a"), &LagSet::samples(-3..=3), true)
            .unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    let first = &json["report"]["records"][0];
    assert!(first["lag"].is_i64());
    assert_eq!(json["matrix"]["lags"][0], serde_json::json!(-3000));
}

// ============================================
// Rejected Input
// ============================================

#[test]
fn test_missing_values_are_rejected() {
    let result = search_best_lag(
        &with_missing(),
        &ColumnSelector::from("x"),
        &LagSet::samples(-1..=1),
        false,
    );
    match result {
        Err(CorrelationError::UnfilledMissingData { column, count }) => {
            assert_eq!(column, "w");
            assert_eq!(count, 1);
        }
        other => panic!("expected UnfilledMissingData, got {:?}", other),
    }
}

#[test]
fn test_uneven_sampling_is_rejected() {
    let table = TimeSeriesTable::from_columns(
        vec![0, 1000, 3000, 4000],
        [("a", vec![1.0, 2.0, 3.0, 4.0])],
    )
    .unwrap();
    let result = search_best_lag(&table, &ColumnSelector::from("a"), &LagSet::samples(0..=1), false);
    assert!(matches!(
        result,
        Err(CorrelationError::UnevenSampling { position: 2, .. })
    ));
}

#[test]
fn test_repeated_timestamp_is_uneven_sampling() {
    for (index, position) in [(vec![0, 0, 10, 20], 1), (vec![0, 10, 10, 20], 2)] {
        let table =
            TimeSeriesTable::from_columns(index.clone(), [("a", vec![1.0, 2.0, 3.0, 4.0])])
                .unwrap();
        let result =
            search_best_lag(&table, &ColumnSelector::from("a"), &LagSet::samples(0..=1), false);
        match result {
            Err(CorrelationError::UnevenSampling {
                position: found,
                gap,
                expected,
            }) => {
                assert_eq!(found, position, "index {:?}", index);
                assert_eq!(gap, TimeDelta::zero());
                assert_eq!(expected, TimeDelta::milliseconds(10));
            }
            other => panic!("expected UnevenSampling for {:?}, got {:?}", index, other),
        }
    }
}

#[test]
fn test_lag_beyond_time_range_is_rejected() {
    let result = search_best_lag(
        &delayed_pair(20, 1),
        &ColumnSelector::from("a"),
        &LagSet::Samples(vec![-1, 0, i64::MAX / 10]),
        false,
    );
    assert!(matches!(result, Err(CorrelationError::InvalidParameter(_))));
}

#[test]
fn test_lag_beyond_data_gives_undefined_row() {
    let table = delayed_pair(20, 1);
    let far = TimeDelta::milliseconds(i64::MAX / 2);
    let lags = LagSet::Durations(vec![-far, TimeDelta::zero(), far]);
    let outcome = search_best_lag(&table, &ColumnSelector::from("a"), &lags, true).unwrap();

    let matrix = outcome.matrix.unwrap();
    assert_eq!(matrix.num_lags(), 3);
    for row in [0, 2] {
        assert!(matrix.values[row].iter().all(|r| r.is_nan()), "row {}", row);
    }
    assert_eq!(outcome.report.get("a").unwrap().lag, Some(TimeDelta::zero()));
}

#[test]
fn test_out_of_range_reference_is_rejected() {
    let result = search_best_lag(
        &no_missing(),
        &ColumnSelector::Index(3),
        &LagSet::samples(0..=0),
        false,
    );
    assert!(matches!(
        result,
        Err(CorrelationError::InvalidColumnSelection(_))
    ));
}

#[test]
fn test_single_row_table_is_rejected() {
    let table = TimeSeriesTable::from_columns(vec![0], [("a", vec![1.0])]).unwrap();
    let result = search_best_lag(&table, &ColumnSelector::from("a"), &LagSet::samples(0..=0), false);
    assert!(matches!(
        result,
        Err(CorrelationError::InsufficientData { .. })
    ));
}
