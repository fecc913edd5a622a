//! Suite files: named datasets plus the checks to run on them.
//!
//! ```json
//! {
//!   "name": "facility_visits",
//!   "requirement": "TICKET-1234",
//!   "datasets": {
//!     "source": { "parquet": "facility_type_avg_time_spent_per_visit_date" },
//!     "target": { "sql": "SELECT facility_type, visit_date FROM visits" }
//!   },
//!   "checks": [
//!     { "check": "not_empty", "dataset": "source", "tags": ["smoke"] },
//!     { "check": "full_match", "source": "source", "target": "target" }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use dq_validate::{CheckKind, ComparisonType, RuleSpec};
use serde::Deserialize;

/// A parsed suite file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Ticket or requirement the suite covers.
    #[serde(default)]
    pub requirement: Option<String>,
    pub datasets: BTreeMap<String, DatasetSpec>,
    pub checks: Vec<CheckSpec>,
}

/// Where a dataset comes from and how it is prepared.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatasetSpec {
    /// Parquet file or directory, relative to the Parquet root.
    #[serde(default)]
    pub parquet: Option<PathBuf>,
    /// CSV file, relative to the data root.
    #[serde(default)]
    pub csv: Option<PathBuf>,
    /// Query run against the configured database.
    #[serde(default)]
    pub sql: Option<String>,
    /// Trim and lowercase column names after loading.
    #[serde(default)]
    pub normalize_columns: bool,
    /// Column renames, applied after normalization.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Columns removed last, e.g. partition columns.
    #[serde(default)]
    pub drop_columns: Vec<String>,
}

/// Resolved location of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource<'a> {
    Parquet(&'a Path),
    Csv(&'a Path),
    Sql(&'a str),
}

impl DatasetSpec {
    /// The single configured location.
    pub fn source(&self) -> Result<DatasetSource<'_>> {
        match (&self.parquet, &self.csv, &self.sql) {
            (Some(path), None, None) => Ok(DatasetSource::Parquet(path)),
            (None, Some(path), None) => Ok(DatasetSource::Csv(path)),
            (None, None, Some(sql)) => Ok(DatasetSource::Sql(sql)),
            (None, None, None) => bail!("one of 'parquet', 'csv' or 'sql' is required"),
            _ => bail!("only one of 'parquet', 'csv' or 'sql' may be given"),
        }
    }
}

/// One check of a suite.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckSpec {
    pub check: CheckKind,
    /// Display name; derived from the check and datasets when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Dataset of single-dataset checks.
    #[serde(default)]
    pub dataset: Option<String>,
    /// First dataset of two-dataset checks.
    #[serde(default)]
    pub source: Option<String>,
    /// Second dataset of two-dataset checks.
    #[serde(default)]
    pub target: Option<String>,
    /// Column subset; empty means all columns.
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSpec>,
    #[serde(default)]
    pub expected_columns: Vec<String>,
    /// Comparison type overrides for `full_match`.
    #[serde(default)]
    pub compare_as: BTreeMap<String, ComparisonType>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CheckSpec {
    /// True for checks comparing a source and a target dataset.
    pub fn is_pairwise(&self) -> bool {
        matches!(self.check, CheckKind::RowCount | CheckKind::FullMatch)
    }

    /// Names of the datasets the check reads.
    pub fn dataset_refs(&self) -> Vec<&str> {
        [&self.dataset, &self.source, &self.target]
            .into_iter()
            .filter_map(|name| name.as_deref())
            .collect()
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let datasets = self.dataset_refs().join(" vs ");
        if self.columns.is_empty() {
            format!("{} [{datasets}]", self.check)
        } else {
            format!("{} [{datasets}] on {}", self.check, self.columns.join(", "))
        }
    }

    /// Selected when no tag filter is given or any tag matches.
    pub fn matches_tags(&self, filter: &[String]) -> bool {
        filter.is_empty() || self.tags.iter().any(|tag| filter.contains(tag))
    }
}

impl Suite {
    /// Reads, parses, and validates a suite file.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("read suite {}", path.display()))?;
        let suite: Suite = serde_json::from_str(&content)
            .with_context(|| format!("parse suite {}", path.display()))?;
        suite
            .validate()
            .with_context(|| format!("invalid suite {}", path.display()))?;
        Ok(suite)
    }

    /// Checks dataset definitions and references.
    pub fn validate(&self) -> Result<()> {
        for (name, dataset) in &self.datasets {
            dataset
                .source()
                .with_context(|| format!("dataset '{name}'"))?;
        }

        for (idx, check) in self.checks.iter().enumerate() {
            let label = format!("check #{} ({})", idx + 1, check.check);
            if check.is_pairwise() {
                if check.source.is_none() || check.target.is_none() || check.dataset.is_some() {
                    bail!("{label}: requires 'source' and 'target'");
                }
            } else if check.dataset.is_none() || check.source.is_some() || check.target.is_some()
            {
                bail!("{label}: requires 'dataset'");
            }
            for name in check.dataset_refs() {
                if !self.datasets.contains_key(name) {
                    bail!("{label}: unknown dataset '{name}'");
                }
            }
            if check.check == CheckKind::ColumnValidity && check.rules.is_empty() {
                bail!("{label}: requires 'rules'");
            }
            if check.check == CheckKind::Schema && check.expected_columns.is_empty() {
                bail!("{label}: requires 'expected_columns'");
            }
        }
        Ok(())
    }

    /// Datasets used by the checks that match `tags`.
    pub fn datasets_for(&self, tags: &[String]) -> BTreeSet<&str> {
        self.checks
            .iter()
            .filter(|check| check.matches_tags(tags))
            .flat_map(CheckSpec::dataset_refs)
            .collect()
    }

    pub fn needs_database(&self, tags: &[String]) -> bool {
        self.datasets_for(tags).into_iter().any(|name| {
            self.datasets
                .get(name)
                .is_some_and(|dataset| dataset.sql.is_some())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"{
        "name": "patient_costs",
        "requirement": "TICKET-1234",
        "datasets": {
            "source": { "parquet": "patient_sum_treatment_cost_per_facility_type" },
            "target": { "sql": "SELECT * FROM costs", "drop_columns": ["facility_type_partition"] }
        },
        "checks": [
            { "check": "not_empty", "dataset": "source", "tags": ["smoke"] },
            { "check": "full_match", "source": "source", "target": "target", "tags": ["source_to_target"] },
            { "check": "column_validity", "dataset": "source",
              "rules": { "sum_treatment_cost": { "min": 0 } }, "tags": ["validity"] }
        ]
    }"#;

    fn suite() -> Suite {
        serde_json::from_str(SUITE).unwrap()
    }

    #[test]
    fn test_parse_and_validate() {
        let suite = suite();
        suite.validate().unwrap();
        assert_eq!(suite.checks.len(), 3);
        assert_eq!(suite.checks[1].check, CheckKind::FullMatch);
        assert_eq!(
            suite.datasets["target"].drop_columns,
            vec!["facility_type_partition"]
        );
    }

    #[test]
    fn test_tag_selection_drives_database_need() {
        let suite = suite();
        assert!(suite.needs_database(&[]));
        assert!(!suite.needs_database(&["smoke".to_string()]));
        assert_eq!(
            suite.datasets_for(&["validity".to_string()]),
            BTreeSet::from(["source"])
        );
    }

    #[test]
    fn test_display_name() {
        let suite = suite();
        assert_eq!(suite.checks[0].display_name(), "not empty [source]");
        assert_eq!(
            suite.checks[1].display_name(),
            "full match [source vs target]"
        );
    }

    #[test]
    fn test_unknown_dataset_reference() {
        let mut suite = suite();
        suite.checks[0].dataset = Some("missing".to_string());
        let err = suite.validate().unwrap_err();
        assert!(err.to_string().contains("unknown dataset 'missing'"));
    }

    #[test]
    fn test_pairwise_check_needs_both_sides() {
        let mut suite = suite();
        suite.checks[1].target = None;
        assert!(suite.validate().is_err());
    }

    #[test]
    fn test_dataset_needs_exactly_one_source() {
        let spec = DatasetSpec {
            parquet: Some(PathBuf::from("a")),
            csv: Some(PathBuf::from("b.csv")),
            ..DatasetSpec::default()
        };
        assert!(spec.source().is_err());
        assert!(DatasetSpec::default().source().is_err());
    }
}
