//! End-to-end reconciliation scenarios over small in-memory datasets.

use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use dq_common::Scalar;
use dq_validate::{
    AlignOptions, CheckError, ColumnRule, ColumnRules, ComparisonType, FailureReport, Provenance,
    check_column_validity, check_duplicates, check_full_match, check_full_match_with,
    check_row_count,
};

fn visits(facilities: &[&str], dates: &[&str], costs: &[f64]) -> DataFrame {
    DataFrame::new(vec![
        Series::new("facility_type".into(), facilities.to_vec()).into_column(),
        Series::new("visit_date".into(), dates.to_vec()).into_column(),
        Series::new("cost".into(), costs.to_vec()).into_column(),
    ])
    .unwrap()
}

#[test]
fn identical_partition_rows_match() {
    let source = visits(&["Clinic"], &["2024-01"], &[10.0]);
    let target = visits(&["Clinic"], &["2024-01"], &[10.0]);

    let pass = check_full_match(&source, &target, &[]).unwrap();
    assert_eq!(pass.rows_examined, 2);
}

#[test]
fn extra_source_row_is_reported_once() {
    let source = visits(
        &["Clinic", "Lab", "Lab", "Hospital", "Clinic"],
        &["2024-01", "2024-01", "2024-02", "2024-02", "2024-03"],
        &[10.0, 20.0, 30.0, 40.0, 50.0],
    );
    let target = visits(
        &["Clinic", "Lab", "Lab", "Hospital"],
        &["2024-01", "2024-01", "2024-02", "2024-02"],
        &[10.0, 20.0, 30.0, 40.0],
    );

    let err = check_row_count(&source, &target).unwrap_err();
    assert_eq!(err.to_string(), "row count mismatch: 5 != 4");

    let err = check_full_match(&source, &target, &[]).unwrap_err();
    let Some(FailureReport::Mismatch {
        groups,
        source_only,
        target_only,
        ..
    }) = err.report()
    else {
        panic!("expected mismatch, got {err}");
    };
    assert_eq!((*source_only, *target_only), (1, 0));
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].provenance, Provenance::SourceOnly);
    assert_eq!(groups[0].values[0], Scalar::from("Clinic"));
    assert_eq!(groups[0].values[2], Scalar::Float(50.0));
    assert_eq!(groups[0].count, 1);
}

#[test]
fn text_dates_match_date_column() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let source = DataFrame::new(vec![Column::new("visit_date".into(), vec!["2024-01-01"])]).unwrap();
    let target = DataFrame::new(vec![
        Series::new("visit_date".into(), vec![date]).into_column(),
    ])
    .unwrap();

    assert!(check_full_match(&source, &target, &["visit_date"]).is_ok());
}

#[test]
fn integer_and_float_columns_match_numerically() {
    let source = DataFrame::new(vec![Column::new("cost".into(), vec![10i64, 20])]).unwrap();
    let target = DataFrame::new(vec![Column::new("cost".into(), vec![20.0f64, 10.0])]).unwrap();

    assert!(check_full_match(&source, &target, &[]).is_ok());

    let options = AlignOptions::new().with_type("cost", ComparisonType::Text);
    assert!(check_full_match_with(&source, &target, &[], &options).is_err());
}

#[test]
fn subset_comparison_ignores_other_columns() {
    let source = visits(&["Lab"], &["2024-01"], &[1.0]);
    let target = visits(&["Lab"], &["2024-02"], &[1.0]);

    assert!(check_full_match(&source, &target, &["facility_type", "cost"]).is_ok());
    assert!(check_full_match(&source, &target, &[]).is_err());
}

#[test]
fn missing_target_column_is_schema_error() {
    let source = visits(&["Lab"], &["2024-01"], &[1.0]);
    let target = DataFrame::new(vec![Column::new("facility_type".into(), vec!["Lab"])]).unwrap();

    let err = check_full_match(&source, &target, &[]).unwrap_err();
    assert!(!err.is_failure());
    assert_eq!(err.to_string(), "column 'visit_date' not found in target dataset");
}

#[test]
fn duplicate_ids_are_grouped() {
    let df = DataFrame::new(vec![Column::new("id".into(), vec![1i64, 1, 2])]).unwrap();

    let err = check_duplicates(&df, &[]).unwrap_err();
    let Some(FailureReport::Duplicates { groups, full_row, .. }) = err.report() else {
        panic!("expected duplicates, got {err}");
    };
    assert!(*full_row);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].values, vec![Scalar::Int(1)]);
    assert_eq!(groups[0].count, 2);
}

#[test]
fn min_rule_flags_negative_cost() {
    let df = DataFrame::new(vec![Column::new("cost".into(), vec![10i64, -5, 0])]).unwrap();
    let rules = ColumnRules::new().with("cost", ColumnRule::new().min(0));

    let err = check_column_validity(&df, &rules).unwrap_err();
    let Some(FailureReport::InvalidValues { records }) = err.report() else {
        panic!("expected invalid values, got {err}");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, Scalar::Int(-5));
    assert_eq!(records[0].row, 1);
}

#[test]
fn future_visit_dates_fail_condition() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let df = DataFrame::new(vec![Column::new(
        "visit_date".into(),
        vec!["2024-05-01", "2024-07-01"],
    )])
    .unwrap();
    let rules = ColumnRules::new().with(
        "visit_date",
        ColumnRule::new().condition(move |value| {
            value
                .to_datetime()
                .is_some_and(|dt| dt.date() <= today)
        }),
    );

    let err = check_column_validity(&df, &rules).unwrap_err();
    assert!(matches!(
        err.report(),
        Some(FailureReport::InvalidValues { records }) if records.len() == 1 && records[0].row == 1
    ));
}

#[test]
fn empty_dataset_passes_validity() {
    let df = DataFrame::new(vec![Column::new("cost".into(), Vec::<i64>::new())]).unwrap();
    let rules = ColumnRules::new().with("cost", ColumnRule::new().min(0).max(10));
    assert!(check_column_validity(&df, &rules).is_ok());
}

#[test]
fn checks_do_not_modify_inputs() {
    let source = DataFrame::new(vec![Column::new("cost".into(), vec![1i64, 2])]).unwrap();
    let target = DataFrame::new(vec![Column::new("cost".into(), vec!["1", "3"])]).unwrap();
    let before = (source.clone(), target.clone());

    let result = check_full_match(&source, &target, &[]);
    assert!(matches!(result, Err(CheckError::Failed(_))));
    assert!(source.equals_missing(&before.0));
    assert!(target.equals_missing(&before.1));
}
