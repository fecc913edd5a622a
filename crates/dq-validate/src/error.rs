//! Error types for checks.

use std::fmt;

use polars::prelude::PolarsError;
use serde::Serialize;
use thiserror::Error;

use crate::report::{FailureReport, Pass};

/// Which input of a check a column lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// First dataset of a comparison (expected).
    Source,
    /// Second dataset of a comparison (actual).
    Target,
    /// The only dataset of a single-dataset check.
    Input,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Input => "input",
        })
    }
}

/// Why a check did not pass.
///
/// `Failed` means the check ran and the data violates it. Every other
/// variant means the check could not run at all.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A requested column is absent.
    #[error("column '{column}' not found in {side} dataset")]
    MissingColumn { column: String, side: Side },

    /// A validity rule could not be compiled.
    #[error("invalid rule for column '{column}': {reason}")]
    InvalidRule { column: String, reason: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// The data violates the check.
    #[error("{0}")]
    Failed(FailureReport),
}

impl CheckError {
    /// The failure evidence, when the check ran and failed.
    pub fn report(&self) -> Option<&FailureReport> {
        match self {
            Self::Failed(report) => Some(report),
            _ => None,
        }
    }

    /// True for assertion failures, false for schema/setup errors.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<PolarsError> for CheckError {
    fn from(err: PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

impl From<FailureReport> for CheckError {
    fn from(report: FailureReport) -> Self {
        Self::Failed(report)
    }
}

/// Result of running one check.
pub type CheckResult = std::result::Result<Pass, CheckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_column_display() {
        let err = CheckError::MissingColumn {
            column: "visit_date".to_string(),
            side: Side::Target,
        };
        assert_eq!(
            err.to_string(),
            "column 'visit_date' not found in target dataset"
        );
        assert!(!err.is_failure());
        assert!(err.report().is_none());
    }

    #[test]
    fn test_failure_wraps_report() {
        let err = CheckError::from(FailureReport::Empty);
        assert!(err.is_failure());
        assert_eq!(err.to_string(), "dataset is empty");
    }
}
