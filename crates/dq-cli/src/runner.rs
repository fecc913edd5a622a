//! Suite execution.
//!
//! Datasets are loaded once per suite, before any check runs. A dataset that
//! fails to load turns every check reading it into an error; the remaining
//! checks still run.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use polars::prelude::DataFrame;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn};

use dq_ingest::{PostgresSource, read_csv_table, read_parquet_path};
use dq_validate::{
    AlignOptions, CheckError, CheckKind, CheckResult, ColumnRules, FailureReport, Pass,
    check_column_validity, check_duplicates, check_full_match_with, check_not_empty,
    check_not_null, check_row_count, check_schema, drop_columns, normalize_column_names,
    rename_columns,
};

use crate::config::HarnessConfig;
use crate::logging::redact_value;
use crate::suite::{CheckSpec, DatasetSource, DatasetSpec, Suite};

/// Outcome of one check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed(Pass),
    Failed(FailureReport),
    /// The check could not run.
    Error { message: String },
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed(_) => "PASS",
            Self::Failed(_) => "FAIL",
            Self::Error { .. } => "ERROR",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Passed(_))
    }
}

impl From<CheckResult> for Outcome {
    fn from(result: CheckResult) -> Self {
        match result {
            Ok(pass) => Self::Passed(pass),
            Err(CheckError::Failed(report)) => Self::Failed(report),
            Err(other) => Self::Error {
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub name: String,
    pub check: CheckKind,
    pub tags: Vec<String>,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuiteRun {
    pub suite: String,
    pub description: Option<String>,
    pub requirement: Option<String>,
    pub checks: Vec<CheckOutcome>,
}

/// Results of every suite of one invocation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    pub suites: Vec<SuiteRun>,
}

impl RunResult {
    pub fn outcomes(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.suites.iter().flat_map(|suite| suite.checks.iter())
    }

    /// (passed, failed, errored) counts.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.outcomes()
            .fold((0, 0, 0), |(pass, fail, err), check| match check.outcome {
                Outcome::Passed(_) => (pass + 1, fail, err),
                Outcome::Failed(_) => (pass, fail + 1, err),
                Outcome::Error { .. } => (pass, fail, err + 1),
            })
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes().all(|check| check.outcome.is_pass())
    }
}

/// Runs the checks of `suite` whose tags match `tags`.
pub fn run_suite(suite: &Suite, config: &HarnessConfig, tags: &[String]) -> SuiteRun {
    let span = info_span!("suite", suite = %suite.name);
    let _guard = span.enter();

    let datasets = load_datasets(suite, config, tags);
    let mut checks = Vec::new();
    for spec in suite.checks.iter().filter(|check| check.matches_tags(tags)) {
        let name = spec.display_name();
        let outcome = match run_check(spec, &datasets) {
            Ok(result) => Outcome::from(result),
            Err(error) => Outcome::Error {
                message: format!("{error:#}"),
            },
        };
        log_outcome(&name, &outcome);
        checks.push(CheckOutcome {
            name,
            check: spec.check,
            tags: spec.tags.clone(),
            outcome,
        });
    }

    SuiteRun {
        suite: suite.name.clone(),
        description: suite.description.clone(),
        requirement: suite.requirement.clone(),
        checks,
    }
}

fn log_outcome(name: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Passed(pass) => info!(check = %name, rows = pass.rows_examined, "check passed"),
        Outcome::Failed(report) => {
            let rendered = report.to_string();
            warn!(check = %name, reason = %report.summary(), "check failed");
            debug!(check = %name, evidence = %redact_value(&rendered), "failure evidence");
        }
        Outcome::Error { message } => error!(check = %name, %message, "check could not run"),
    }
}

type Datasets = BTreeMap<String, std::result::Result<DataFrame, String>>;

fn load_datasets(suite: &Suite, config: &HarnessConfig, tags: &[String]) -> Datasets {
    let needed = suite.datasets_for(tags);
    let mut loaded = Datasets::new();

    let mut sql = Vec::new();
    for name in needed {
        let Some(spec) = suite.datasets.get(name) else {
            continue;
        };
        match spec.source() {
            Ok(DatasetSource::Sql(query)) => sql.push((name, spec, query)),
            Ok(source) => {
                let result = load_file(&source, config).and_then(|df| prepare(df, spec));
                loaded.insert(name.to_string(), result.map_err(|e| format!("{e:#}")));
            }
            Err(e) => {
                loaded.insert(name.to_string(), Err(format!("{e:#}")));
            }
        }
    }

    if sql.is_empty() {
        return loaded;
    }

    let queried = config.require_db().and_then(|db| {
        PostgresSource::scoped(db, |source| {
            let mut frames = Vec::with_capacity(sql.len());
            for (name, spec, query) in &sql {
                let result = source
                    .query(query)
                    .map_err(anyhow::Error::from)
                    .and_then(|df| prepare(df, spec));
                frames.push(((*name).to_string(), result.map_err(|e| format!("{e:#}"))));
            }
            Ok::<_, anyhow::Error>(frames)
        })
    });

    match queried {
        Ok(frames) => loaded.extend(frames),
        Err(e) => {
            let message = format!("{e:#}");
            error!(%message, "database datasets unavailable");
            for (name, _, _) in sql {
                loaded.insert(name.to_string(), Err(message.clone()));
            }
        }
    }
    loaded
}

fn load_file(source: &DatasetSource<'_>, config: &HarnessConfig) -> Result<DataFrame> {
    let df = match source {
        DatasetSource::Parquet(path) => read_parquet_path(&config.resolve_parquet(path))?,
        DatasetSource::Csv(path) => read_csv_table(&config.resolve_csv(path))?,
        DatasetSource::Sql(_) => return Err(anyhow!("SQL datasets need a database connection")),
    };
    Ok(df)
}

fn prepare(df: DataFrame, spec: &DatasetSpec) -> Result<DataFrame> {
    let mut df = df;
    if spec.normalize_columns {
        df = normalize_column_names(&df).context("normalize column names")?;
    }
    if !spec.rename.is_empty() {
        let mapping = spec
            .rename
            .iter()
            .map(|(from, to)| (from.as_str(), to.as_str()));
        df = rename_columns(&df, mapping).context("rename columns")?;
    }
    if !spec.drop_columns.is_empty() {
        let names: Vec<&str> = spec.drop_columns.iter().map(String::as_str).collect();
        df = drop_columns(&df, &names).context("drop columns")?;
    }
    Ok(df)
}

fn run_check(spec: &CheckSpec, datasets: &Datasets) -> Result<CheckResult> {
    let columns: Vec<&str> = spec.columns.iter().map(String::as_str).collect();

    let result = match spec.check {
        CheckKind::NotEmpty => check_not_empty(dataset(datasets, spec.dataset.as_deref())?),
        CheckKind::Duplicates => {
            check_duplicates(dataset(datasets, spec.dataset.as_deref())?, &columns)
        }
        CheckKind::NotNull => check_not_null(dataset(datasets, spec.dataset.as_deref())?, &columns),
        CheckKind::Schema => {
            let expected: Vec<&str> = spec.expected_columns.iter().map(String::as_str).collect();
            check_schema(dataset(datasets, spec.dataset.as_deref())?, &expected)
        }
        CheckKind::ColumnValidity => {
            let df = dataset(datasets, spec.dataset.as_deref())?;
            let specs = spec.rules.iter().map(|(column, rule)| (column.as_str(), rule));
            ColumnRules::from_specs(specs).and_then(|rules| check_column_validity(df, &rules))
        }
        CheckKind::RowCount => check_row_count(
            dataset(datasets, spec.source.as_deref())?,
            dataset(datasets, spec.target.as_deref())?,
        ),
        CheckKind::FullMatch => {
            let options = spec
                .compare_as
                .iter()
                .fold(AlignOptions::new(), |options, (column, comparison)| {
                    options.with_type(column.clone(), *comparison)
                });
            check_full_match_with(
                dataset(datasets, spec.source.as_deref())?,
                dataset(datasets, spec.target.as_deref())?,
                &columns,
                &options,
            )
        }
    };
    Ok(result)
}

fn dataset<'a>(datasets: &'a Datasets, name: Option<&str>) -> Result<&'a DataFrame> {
    let name = name.context("check does not name a dataset")?;
    match datasets.get(name) {
        Some(Ok(df)) => Ok(df),
        Some(Err(message)) => Err(anyhow!("dataset '{name}' failed to load: {message}")),
        None => Err(anyhow!("dataset '{name}' is not defined")),
    }
}
