//! Dataset reconciliation and data-quality checks.
//!
//! Every check takes one or two Polars `DataFrame`s, never modifies them,
//! and returns a [`CheckResult`]: a [`Pass`] or a [`CheckError`]. Assertion
//! failures carry a [`FailureReport`] with the offending rows and counts;
//! the other error variants mean the check could not run (missing column,
//! bad rule).
//!
//! # Checks
//!
//! - [`check_full_match`]: source and target hold the same row tuples after
//!   per-column type alignment
//! - [`check_row_count`], [`check_not_empty`], [`check_not_null`]
//! - [`check_duplicates`]: repeated full rows or column combinations
//! - [`check_column_validity`]: min/max, allowed values, pattern, and custom
//!   predicate rules per column
//! - [`check_schema`]: exact column set

mod align;
mod diff;
mod duplicates;
mod error;
mod prepare;
mod report;
mod shape;
mod validity;

// === Results ===
pub use error::{CheckError, CheckResult, Side};
pub use report::{
    CheckKind, DiffGroup, DuplicateGroup, Evidence, FailureReport, InvalidRecord,
    MAX_SAMPLE_ROWS, NullColumn, Pass, Provenance, RuleKind,
};

// === Alignment & Diff ===
pub use align::{AlignOptions, AlignedPair, ComparisonType, align, align_with};
pub use diff::{check_full_match, check_full_match_with, diff_rows};

// === Single-Dataset Checks ===
pub use duplicates::{check_duplicates, find_duplicates};
pub use shape::{check_not_empty, check_not_null, check_row_count, check_schema};
pub use validity::{
    ColumnRule, ColumnRules, Predicate, RuleSpec, check_column_validity, find_invalid_values,
};

// === Preparation ===
pub use prepare::{drop_columns, normalize_column_names, rename_columns};
