//! Check outcomes and failure evidence.
//!
//! A passing check yields [`Pass`]; a failing one yields a [`FailureReport`]
//! carrying the structured evidence (grouped rows, counts) so callers can
//! render it for a console, JSON, or CI annotations.

use std::fmt;

use dq_common::Scalar;
use serde::{Deserialize, Serialize};

/// Rows shown by the plain-text rendering of a report.
pub const MAX_SAMPLE_ROWS: usize = 20;

/// The checks this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    NotEmpty,
    Duplicates,
    RowCount,
    FullMatch,
    NotNull,
    ColumnValidity,
    Schema,
}

impl CheckKind {
    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotEmpty => "not empty",
            Self::Duplicates => "duplicates",
            Self::RowCount => "row count",
            Self::FullMatch => "full match",
            Self::NotNull => "not null",
            Self::ColumnValidity => "column validity",
            Self::Schema => "schema",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A check that ran and found nothing wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pass {
    pub check: CheckKind,
    /// Rows inspected across all inputs of the check.
    pub rows_examined: usize,
}

impl Pass {
    pub(crate) fn new(check: CheckKind, rows_examined: usize) -> Self {
        Self {
            check,
            rows_examined,
        }
    }
}

/// Which side of a comparison a differing row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Provenance {
    #[serde(rename = "in source not in target")]
    SourceOnly,
    #[serde(rename = "in target not in source")]
    TargetOnly,
}

impl Provenance {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SourceOnly => "in source not in target",
            Self::TargetOnly => "in target not in source",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rows with one value tuple that exist on only one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffGroup {
    /// Values of the compared columns, after type alignment.
    pub values: Vec<Scalar>,
    pub provenance: Provenance,
    /// Occurrences of the tuple on its side.
    pub count: usize,
}

/// A value combination that occurs more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub values: Vec<Scalar>,
    pub count: usize,
}

/// A column holding null values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NullColumn {
    pub column: String,
    pub null_count: usize,
}

/// Kinds of column validity rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Min,
    Max,
    AllowedValues,
    Pattern,
    Condition,
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Min => "min",
            Self::Max => "max",
            Self::AllowedValues => "allowed_values",
            Self::Pattern => "pattern",
            Self::Condition => "condition",
        }
    }
}

/// One value flagged by the rules of one column.
///
/// A row violating rules on several columns yields one record per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidRecord {
    /// Zero-based row position in the checked dataset.
    pub row: usize,
    pub column: String,
    pub value: Scalar,
    pub violations: Vec<RuleKind>,
}

/// Structured evidence of a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReport {
    /// The dataset has no rows.
    Empty,
    /// Row counts differ.
    RowCountMismatch { source: usize, target: usize },
    /// Row tuples present on only one side, most frequent first.
    Mismatch {
        columns: Vec<String>,
        groups: Vec<DiffGroup>,
        source_only: usize,
        target_only: usize,
    },
    /// Repeated value combinations, most frequent first.
    Duplicates {
        columns: Vec<String>,
        full_row: bool,
        groups: Vec<DuplicateGroup>,
    },
    /// Columns holding nulls.
    NullValues { columns: Vec<NullColumn> },
    /// Values flagged by column rules.
    InvalidValues { records: Vec<InvalidRecord> },
    /// Column names differ from the expected schema.
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
}

/// Tabular view of a report's evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FailureReport {
    /// One-line description of the failure.
    pub fn summary(&self) -> String {
        match self {
            Self::Empty => "dataset is empty".to_string(),
            Self::RowCountMismatch { source, target } => {
                format!("row count mismatch: {source} != {target}")
            }
            Self::Mismatch {
                source_only,
                target_only,
                groups,
                ..
            } => format!(
                "datasets do not match: {source_only} row(s) in source not in target, \
                 {target_only} row(s) in target not in source ({} group(s))",
                groups.len()
            ),
            Self::Duplicates {
                columns, full_row, ..
            } => {
                if *full_row {
                    "duplicate full rows found".to_string()
                } else {
                    format!("duplicate rows found on columns [{}]", columns.join(", "))
                }
            }
            Self::NullValues { columns } => {
                let parts: Vec<String> = columns
                    .iter()
                    .map(|c| format!("{} ({})", c.column, c.null_count))
                    .collect();
                format!("null values found in column(s): {}", parts.join(", "))
            }
            Self::InvalidValues { records } => format!(
                "invalid values found: {} invalid row(s) across {} column(s)",
                records.len(),
                count_distinct_columns(records)
            ),
            Self::SchemaMismatch {
                missing,
                unexpected,
            } => format!(
                "schema mismatch: missing columns [{}]; unexpected columns [{}]",
                missing.join(", "),
                unexpected.join(", ")
            ),
        }
    }

    /// Rows backing the failure, if the report has any.
    pub fn evidence(&self) -> Option<Evidence> {
        match self {
            Self::Mismatch {
                columns, groups, ..
            } => {
                let mut headers = columns.clone();
                headers.push("diff_type".to_string());
                headers.push("count".to_string());
                let rows = groups
                    .iter()
                    .map(|group| {
                        let mut row = render_values(&group.values);
                        row.push(group.provenance.label().to_string());
                        row.push(group.count.to_string());
                        row
                    })
                    .collect();
                Some(Evidence { headers, rows })
            }
            Self::Duplicates {
                columns, groups, ..
            } => {
                let mut headers = columns.clone();
                headers.push("count".to_string());
                let rows = groups
                    .iter()
                    .map(|group| {
                        let mut row = render_values(&group.values);
                        row.push(group.count.to_string());
                        row
                    })
                    .collect();
                Some(Evidence { headers, rows })
            }
            Self::InvalidValues { records } => {
                let headers = ["row", "invalid_column", "value", "rules"]
                    .iter()
                    .map(|h| (*h).to_string())
                    .collect();
                let rows = records
                    .iter()
                    .map(|record| {
                        let rules: Vec<&str> =
                            record.violations.iter().map(RuleKind::label).collect();
                        vec![
                            record.row.to_string(),
                            record.column.clone(),
                            record.value.to_string(),
                            rules.join(", "),
                        ]
                    })
                    .collect();
                Some(Evidence { headers, rows })
            }
            Self::NullValues { columns } => Some(Evidence {
                headers: vec!["column".to_string(), "null_count".to_string()],
                rows: columns
                    .iter()
                    .map(|c| vec![c.column.clone(), c.null_count.to_string()])
                    .collect(),
            }),
            Self::Empty | Self::RowCountMismatch { .. } | Self::SchemaMismatch { .. } => None,
        }
    }
}

fn render_values(values: &[Scalar]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn count_distinct_columns(records: &[InvalidRecord]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for record in records {
        if !seen.contains(&record.column.as_str()) {
            seen.push(&record.column);
        }
    }
    seen.len()
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())?;
        if let Some(evidence) = self.evidence() {
            writeln!(f)?;
            write_grid(f, &evidence)?;
        }
        Ok(())
    }
}

/// Writes evidence as aligned plain-text columns, capped at
/// [`MAX_SAMPLE_ROWS`] rows.
fn write_grid(f: &mut fmt::Formatter<'_>, evidence: &Evidence) -> fmt::Result {
    let shown = &evidence.rows[..evidence.rows.len().min(MAX_SAMPLE_ROWS)];

    let mut widths: Vec<usize> = evidence.headers.iter().map(|h| h.chars().count()).collect();
    for row in shown {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_grid_line(f, &evidence.headers, &widths)?;
    for row in shown {
        writeln!(f)?;
        write_grid_line(f, row, &widths)?;
    }

    let hidden = evidence.rows.len() - shown.len();
    if hidden > 0 {
        write!(f, "\n... {hidden} more row(s)")?;
    }
    Ok(())
}

fn write_grid_line(f: &mut fmt::Formatter<'_>, cells: &[String], widths: &[usize]) -> fmt::Result {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    f.write_str(line.join(" | ").trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_display() {
        let report = FailureReport::RowCountMismatch {
            source: 5,
            target: 4,
        };
        assert_eq!(report.to_string(), "row count mismatch: 5 != 4");
        assert!(report.evidence().is_none());
    }

    #[test]
    fn test_mismatch_display_renders_grid() {
        let report = FailureReport::Mismatch {
            columns: vec!["facility".to_string(), "cost".to_string()],
            groups: vec![DiffGroup {
                values: vec![Scalar::from("Lab"), Scalar::Float(12.5)],
                provenance: Provenance::SourceOnly,
                count: 2,
            }],
            source_only: 2,
            target_only: 0,
        };

        let rendered = report.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "facility | cost | diff_type               | count");
        assert_eq!(lines[2], "Lab      | 12.5 | in source not in target | 2");
    }

    #[test]
    fn test_grid_truncates_long_evidence() {
        let records = (0..25)
            .map(|row| InvalidRecord {
                row,
                column: "cost".to_string(),
                value: Scalar::Int(-1),
                violations: vec![RuleKind::Min],
            })
            .collect();
        let report = FailureReport::InvalidValues { records };

        let rendered = report.to_string();
        assert!(rendered.starts_with("invalid values found: 25 invalid row(s) across 1 column(s)"));
        assert!(rendered.ends_with("... 5 more row(s)"));
        // summary + header + 20 rows + trailer
        assert_eq!(rendered.lines().count(), 23);
    }

    #[test]
    fn test_report_serializes_with_kind_tag() {
        let report = FailureReport::Duplicates {
            columns: vec!["id".to_string()],
            full_row: true,
            groups: vec![DuplicateGroup {
                values: vec![Scalar::Int(1)],
                count: 2,
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "duplicates");
        assert_eq!(json["groups"][0]["values"][0], 1);
        assert_eq!(json["groups"][0]["count"], 2);

        let diff = DiffGroup {
            values: vec![],
            provenance: Provenance::TargetOnly,
            count: 1,
        };
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["provenance"], "in target not in source");
    }
}
