//! Shape, emptiness, null, and schema checks.

use dq_common::{column_names, column_scalars};
use polars::prelude::DataFrame;

use crate::error::{CheckError, CheckResult, Side};
use crate::report::{CheckKind, FailureReport, NullColumn, Pass};

/// Checks that `df` has at least one row.
pub fn check_not_empty(df: &DataFrame) -> CheckResult {
    if df.height() == 0 {
        return Err(FailureReport::Empty.into());
    }
    Ok(Pass::new(CheckKind::NotEmpty, df.height()))
}

/// Checks that both datasets have the same number of rows.
pub fn check_row_count(source: &DataFrame, target: &DataFrame) -> CheckResult {
    let (source_rows, target_rows) = (source.height(), target.height());
    if source_rows != target_rows {
        return Err(FailureReport::RowCountMismatch {
            source: source_rows,
            target: target_rows,
        }
        .into());
    }
    Ok(Pass::new(CheckKind::RowCount, source_rows + target_rows))
}

/// Checks that `columns` hold no nulls; an empty slice checks every column.
///
/// NaN counts as null. The failure lists every offending column.
pub fn check_not_null(df: &DataFrame, columns: &[&str]) -> CheckResult {
    let names: Vec<String> = if columns.is_empty() {
        column_names(df)
    } else {
        for column in columns {
            if df.column(column).is_err() {
                return Err(CheckError::MissingColumn {
                    column: (*column).to_string(),
                    side: Side::Input,
                });
            }
        }
        columns.iter().map(|c| (*c).to_string()).collect()
    };

    let mut offending = Vec::new();
    for name in names {
        let null_count = column_scalars(df, &name)?
            .iter()
            .filter(|value| value.is_missing())
            .count();
        if null_count > 0 {
            offending.push(NullColumn {
                column: name,
                null_count,
            });
        }
    }

    if offending.is_empty() {
        Ok(Pass::new(CheckKind::NotNull, df.height()))
    } else {
        Err(FailureReport::NullValues { columns: offending }.into())
    }
}

/// Checks that the column names of `df` are exactly `expected`, in any order.
pub fn check_schema(df: &DataFrame, expected: &[&str]) -> CheckResult {
    let actual = column_names(df);
    let missing: Vec<String> = expected
        .iter()
        .filter(|name| !actual.iter().any(|a| a == *name))
        .map(|name| (*name).to_string())
        .collect();
    let unexpected: Vec<String> = actual
        .iter()
        .filter(|name| !expected.contains(&name.as_str()))
        .cloned()
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(Pass::new(CheckKind::Schema, df.height()))
    } else {
        Err(FailureReport::SchemaMismatch {
            missing,
            unexpected,
        }
        .into())
    }
}
