//! Column type alignment between two datasets.
//!
//! Before two datasets can be compared row by row, every compared column has
//! to be read the same way on both sides. The comparison type is picked per
//! column by priority: temporal, then numeric, then text.

use std::collections::BTreeMap;
use std::fmt;

use dq_common::{Scalar, ValueKind, column_names, row_tuples, value_kind};
use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CheckError, Side};

/// How the values of one column are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonType {
    /// Both sides parsed to date-times; dates become midnight.
    Temporal,
    /// Both sides parsed to floats.
    Numeric,
    /// Both sides rendered as text.
    Text,
}

impl ComparisonType {
    /// Picks the comparison type for a column from its dtypes on both sides.
    pub fn infer(source: &DataType, target: &DataType) -> Self {
        let kinds = [value_kind(source), value_kind(target)];
        if kinds.contains(&ValueKind::Temporal) {
            Self::Temporal
        } else if kinds
            .iter()
            .any(|kind| matches!(kind, ValueKind::Numeric | ValueKind::Boolean))
        {
            Self::Numeric
        } else {
            Self::Text
        }
    }

    /// Converts one value to this comparison type.
    ///
    /// Values that cannot be read as the type become `Null`.
    pub fn coerce(&self, value: &Scalar) -> Scalar {
        if value.is_missing() {
            return Scalar::Null;
        }
        match self {
            Self::Temporal => value.to_datetime().map_or(Scalar::Null, Scalar::DateTime),
            Self::Numeric => value.to_f64().map_or(Scalar::Null, Scalar::Float),
            Self::Text => Scalar::Text(value.to_string()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::Numeric => "numeric",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ComparisonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-column overrides of the inferred comparison type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignOptions {
    overrides: BTreeMap<String, ComparisonType>,
}

impl AlignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces `column` to be compared as `comparison`.
    pub fn with_type(mut self, column: impl Into<String>, comparison: ComparisonType) -> Self {
        self.overrides.insert(column.into(), comparison);
        self
    }

    pub fn get(&self, column: &str) -> Option<ComparisonType> {
        self.overrides.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Two datasets projected onto the same columns and coerced identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    pub columns: Vec<String>,
    /// Comparison type per entry of `columns`.
    pub types: Vec<ComparisonType>,
    pub source: Vec<Vec<Scalar>>,
    pub target: Vec<Vec<Scalar>>,
}

/// Aligns `source` and `target` on `columns` using inferred types.
///
/// An empty `columns` slice means every column of `source`.
pub fn align(
    source: &DataFrame,
    target: &DataFrame,
    columns: &[&str],
) -> Result<AlignedPair, CheckError> {
    align_with(source, target, columns, &AlignOptions::default())
}

/// Aligns `source` and `target` on `columns`, honoring type overrides.
pub fn align_with(
    source: &DataFrame,
    target: &DataFrame,
    columns: &[&str],
    options: &AlignOptions,
) -> Result<AlignedPair, CheckError> {
    let columns: Vec<String> = if columns.is_empty() {
        column_names(source)
    } else {
        columns.iter().map(|c| (*c).to_string()).collect()
    };

    let mut types = Vec::with_capacity(columns.len());
    for column in &columns {
        let source_dtype = dtype_of(source, column, Side::Source)?;
        let target_dtype = dtype_of(target, column, Side::Target)?;
        let comparison = options
            .get(column)
            .unwrap_or_else(|| ComparisonType::infer(&source_dtype, &target_dtype));
        debug!(
            column = %column,
            source_dtype = %source_dtype,
            target_dtype = %target_dtype,
            comparison = %comparison,
            "aligned column"
        );
        types.push(comparison);
    }

    let names: Vec<&str> = columns.iter().map(String::as_str).collect();
    let source_rows = coerce_rows(row_tuples(source, &names)?, &names, &types, Side::Source);
    let target_rows = coerce_rows(row_tuples(target, &names)?, &names, &types, Side::Target);

    Ok(AlignedPair {
        columns,
        types,
        source: source_rows,
        target: target_rows,
    })
}

fn dtype_of(df: &DataFrame, column: &str, side: Side) -> Result<DataType, CheckError> {
    df.column(column)
        .map(|c| c.dtype().clone())
        .map_err(|_| CheckError::MissingColumn {
            column: column.to_string(),
            side,
        })
}

fn coerce_rows(
    rows: Vec<Vec<Scalar>>,
    columns: &[&str],
    types: &[ComparisonType],
    side: Side,
) -> Vec<Vec<Scalar>> {
    let mut lost = vec![0usize; columns.len()];
    let rows = rows
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(types)
                .enumerate()
                .map(|(idx, (value, comparison))| {
                    let coerced = comparison.coerce(value);
                    if coerced.is_missing() && !value.is_missing() {
                        lost[idx] += 1;
                    }
                    coerced
                })
                .collect()
        })
        .collect();

    for ((column, comparison), count) in columns.iter().zip(types).zip(lost) {
        if count > 0 {
            warn!(
                column = %column,
                side = %side,
                comparison = %comparison,
                count,
                "values could not be coerced and were set to null"
            );
        }
    }
    rows
}
