//! CLI argument definitions for the `dq` runner.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dq",
    version,
    about = "Data-quality checks for Parquet, CSV, and PostgreSQL datasets",
    long_about = "Run data-quality check suites.\n\n\
                  Each suite names its datasets (Parquet files or partitioned folders,\n\
                  CSV files, SQL queries) and the checks to run on them: emptiness,\n\
                  duplicates, nulls, column validity, schema, row counts, and full\n\
                  source-vs-target reconciliation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one or more suite files.
    Run(RunArgs),

    /// Load a Parquet or CSV dataset and print its shape and schema.
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Suite files (JSON).
    #[arg(value_name = "SUITE", required = true)]
    pub suites: Vec<PathBuf>,

    /// Run only checks carrying this tag (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// How results are printed.
    #[arg(long = "report-format", value_enum, default_value = "table")]
    pub report_format: ReportFormatArg,

    /// Base directory for relative Parquet dataset paths.
    #[arg(
        long = "parquet-root",
        value_name = "DIR",
        env = "PARQUET_ROOT_PATH",
        default_value = "."
    )]
    pub parquet_root: PathBuf,

    /// Base directory for relative CSV dataset paths.
    #[arg(
        long = "data-root",
        value_name = "DIR",
        env = "DATA_ROOT_PATH",
        default_value = "."
    )]
    pub data_root: PathBuf,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Database connection flags, only needed for SQL datasets.
#[derive(Args)]
pub struct DbArgs {
    /// Database host.
    #[arg(long = "db-host", env = "DB_HOST", default_value = "localhost")]
    pub host: String,

    /// Database port.
    #[arg(long = "db-port", env = "DB_PORT", default_value_t = 5434)]
    pub port: u16,

    /// Database name.
    #[arg(long = "db-name", env = "DB_NAME", default_value = "mydatabase")]
    pub name: String,

    /// Database username.
    #[arg(long = "db-user", env = "DB_USER")]
    pub user: Option<String>,

    /// Database password.
    #[arg(long = "db-password", env = "DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Parquet file, Parquet folder, or CSV file.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
