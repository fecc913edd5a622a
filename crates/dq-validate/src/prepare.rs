//! Column preparation before a comparison.
//!
//! Every function returns a new frame; the input is left untouched.

use polars::prelude::{Column, DataFrame};

use crate::error::{CheckError, Side};

/// Trims and lowercases every column name.
///
/// Fails when two names collide after normalization.
pub fn normalize_column_names(df: &DataFrame) -> Result<DataFrame, CheckError> {
    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .map(|col| {
            let name = col.name().trim().to_lowercase();
            col.clone().with_name(name.into())
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Renames columns by `(from, to)` pairs.
///
/// Every `from` must name an existing column.
pub fn rename_columns<'a, I>(df: &DataFrame, mapping: I) -> Result<DataFrame, CheckError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut columns: Vec<Column> = df.get_columns().to_vec();
    for (from, to) in mapping {
        let Some(col) = columns.iter_mut().find(|c| c.name().as_str() == from) else {
            return Err(CheckError::MissingColumn {
                column: from.to_string(),
                side: Side::Input,
            });
        };
        *col = col.clone().with_name(to.into());
    }
    Ok(DataFrame::new(columns)?)
}

/// Drops the listed columns when present.
pub fn drop_columns(df: &DataFrame, names: &[&str]) -> Result<DataFrame, CheckError> {
    let columns: Vec<Column> = df
        .get_columns()
        .iter()
        .filter(|col| !names.contains(&col.name().as_str()))
        .cloned()
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dq_common::column_names;
    use polars::prelude::*;

    fn report_table() -> DataFrame {
        DataFrame::new(vec![
            Column::new(" Facility Name ".into(), vec!["Lab"]),
            Column::new("Visit Date".into(), vec!["2024-01-01"]),
            Column::new("partition_date".into(), vec!["2024-01"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_normalize_column_names() {
        let df = normalize_column_names(&report_table()).unwrap();
        assert_eq!(
            column_names(&df),
            vec!["facility name", "visit date", "partition_date"]
        );
    }

    #[test]
    fn test_normalize_collision_is_error() {
        let df = DataFrame::new(vec![
            Column::new("ID".into(), vec![1i64]),
            Column::new("id".into(), vec![2i64]),
        ])
        .unwrap();
        assert!(matches!(
            normalize_column_names(&df),
            Err(CheckError::DataFrame { .. })
        ));
    }

    #[test]
    fn test_rename_after_normalize() {
        let normalized = normalize_column_names(&report_table()).unwrap();
        let renamed = rename_columns(
            &normalized,
            [("facility name", "facility_name"), ("visit date", "visit_date")],
        )
        .unwrap();
        assert_eq!(
            column_names(&renamed),
            vec!["facility_name", "visit_date", "partition_date"]
        );
        assert!(rename_columns(&normalized, [("nope", "x")]).is_err());
    }

    #[test]
    fn test_drop_columns_ignores_absent() {
        let df = drop_columns(&report_table(), &["partition_date", "absent"]).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(report_table().width(), 3);
    }
}
