//! Duplicate row detection.

use std::collections::HashMap;

use dq_common::{Scalar, column_names, row_tuples};
use polars::prelude::DataFrame;

use crate::error::{CheckError, CheckResult, Side};
use crate::report::{CheckKind, DuplicateGroup, FailureReport, Pass};

/// Checks that no full row, or no combination of `columns`, repeats.
///
/// An empty `columns` slice checks full rows.
pub fn check_duplicates(df: &DataFrame, columns: &[&str]) -> CheckResult {
    let groups = find_duplicates(df, columns)?;
    if groups.is_empty() {
        return Ok(Pass::new(CheckKind::Duplicates, df.height()));
    }

    let full_row = columns.is_empty();
    let columns = if full_row {
        column_names(df)
    } else {
        columns.iter().map(|c| (*c).to_string()).collect()
    };
    Err(FailureReport::Duplicates {
        columns,
        full_row,
        groups,
    }
    .into())
}

/// Value combinations occurring more than once, most frequent first.
///
/// Nulls compare equal to each other.
pub fn find_duplicates(df: &DataFrame, columns: &[&str]) -> Result<Vec<DuplicateGroup>, CheckError> {
    let all_columns;
    let columns: Vec<&str> = if columns.is_empty() {
        all_columns = column_names(df);
        all_columns.iter().map(String::as_str).collect()
    } else {
        for column in columns {
            if df.column(column).is_err() {
                return Err(CheckError::MissingColumn {
                    column: (*column).to_string(),
                    side: Side::Input,
                });
            }
        }
        columns.to_vec()
    };

    let rows = row_tuples(df, &columns)?;
    let mut index: HashMap<&[Scalar], usize> = HashMap::new();
    let mut counted: Vec<(&[Scalar], usize)> = Vec::new();
    for row in &rows {
        match index.get(row.as_slice()) {
            Some(&pos) => counted[pos].1 += 1,
            None => {
                index.insert(row.as_slice(), counted.len());
                counted.push((row.as_slice(), 1));
            }
        }
    }

    let mut groups: Vec<DuplicateGroup> = counted
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(values, count)| DuplicateGroup {
            values: values.to_vec(),
            count,
        })
        .collect();
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(groups)
}
