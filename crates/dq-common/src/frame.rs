//! Frame helpers.
//!
//! This module provides dtype classification, row/column extraction into
//! [`Scalar`] values, and numeric parsing/formatting helpers.

use polars::prelude::*;

use crate::scalar::Scalar;

/// Coarse classification of a column dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Temporal,
    Numeric,
    Boolean,
    Text,
    Other,
}

/// Classifies a Polars dtype.
pub fn value_kind(dtype: &DataType) -> ValueKind {
    match dtype {
        DataType::Date | DataType::Datetime(_, _) => ValueKind::Temporal,
        DataType::Float64
        | DataType::Float32
        | DataType::Int64
        | DataType::Int32
        | DataType::Int16
        | DataType::Int8
        | DataType::UInt64
        | DataType::UInt32
        | DataType::UInt16
        | DataType::UInt8 => ValueKind::Numeric,
        DataType::Boolean => ValueKind::Boolean,
        DataType::String => ValueKind::Text,
        _ => ValueKind::Other,
    }
}

/// Column names of a frame, in order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names_owned()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

/// Reads every value of one column.
pub fn column_scalars(df: &DataFrame, name: &str) -> PolarsResult<Vec<Scalar>> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        values.push(Scalar::from_any(column.get(idx)?));
    }
    Ok(values)
}

/// Reads the frame row by row, projected onto `columns` in the given order.
pub fn row_tuples(df: &DataFrame, columns: &[&str]) -> PolarsResult<Vec<Vec<Scalar>>> {
    let mut rows: Vec<Vec<Scalar>> = (0..df.height())
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for name in columns {
        let values = column_scalars(df, name)?;
        for (row, value) in rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
    Ok(rows)
}

/// Formats a floating-point number as a string without trailing zeros after decimal.
///
/// Only trims trailing zeros if the number contains a decimal point.
/// Integer-valued floats like 40.0 are formatted as "40", not "4".
///
/// # Examples
///
/// ```
/// use dq_common::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(40.0), "40");
/// ```
pub fn format_numeric(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        trimmed.to_string()
    } else {
        s
    }
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| !v.is_nan())
}
