use anyhow::{Context, Result};
use tracing::{info, info_span};

use dq_cli::config::HarnessConfig;
use dq_cli::runner::{RunResult, run_suite};
use dq_cli::suite::Suite;
use dq_ingest::read_path;

use crate::cli::{DbArgs, InspectArgs, RunArgs};
use crate::types::{ColumnSummary, InspectResult};

pub fn run_suites(args: &RunArgs) -> Result<RunResult> {
    let config = harness_config(args);

    // All suites are parsed before any dataset is loaded
    let suites = args
        .suites
        .iter()
        .map(|path| Suite::load(path))
        .collect::<Result<Vec<_>>>()?;

    if config.db.is_none() && suites.iter().any(|suite| suite.needs_database(&args.tags)) {
        config.require_db().context("suites with SQL datasets were selected")?;
    }

    let mut result = RunResult::default();
    for suite in &suites {
        let run = run_suite(suite, &config, &args.tags);
        info!(suite = %suite.name, checks = run.checks.len(), "suite finished");
        result.suites.push(run);
    }
    Ok(result)
}

fn harness_config(args: &RunArgs) -> HarnessConfig {
    HarnessConfig::new(
        db_config(&args.db),
        args.parquet_root.clone(),
        args.data_root.clone(),
    )
}

fn db_config(args: &DbArgs) -> Option<dq_ingest::DbConfig> {
    HarnessConfig::db_from_parts(
        &args.host,
        args.port,
        &args.name,
        args.user.as_deref(),
        args.password.as_deref(),
    )
}

pub fn run_inspect(args: &InspectArgs) -> Result<InspectResult> {
    let span = info_span!("inspect", path = %args.path.display());
    let _guard = span.enter();

    let df = read_path(&args.path).with_context(|| format!("load {}", args.path.display()))?;
    let columns = df
        .get_columns()
        .iter()
        .map(|column| ColumnSummary {
            name: column.name().to_string(),
            dtype: column.dtype().to_string(),
            nulls: column.null_count(),
        })
        .collect();
    Ok(InspectResult {
        path: args.path.clone(),
        rows: df.height(),
        columns,
    })
}
