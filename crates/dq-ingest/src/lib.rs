//! Dataset sources for data-quality checks.
//!
//! This crate loads the tabular datasets that the checks in `dq-validate`
//! compare. Every source returns a Polars `DataFrame`.
//!
//! # Features
//!
//! - **Parquet**: single files or directories walked recursively, with
//!   `key=value` folder names turned into partition columns
//! - **CSV**: header row plus inferred column types
//! - **PostgreSQL**: run a query over a scoped connection
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use dq_ingest::{DbConfig, PostgresSource, read_parquet_path};
//!
//! let source = read_parquet_path(Path::new("parquet_data/facility_visits"))?;
//! let target = PostgresSource::scoped(&DbConfig::default(), |db| {
//!     db.query("SELECT facility_type, visit_date FROM visits")
//! })?;
//! ```

mod csv;
mod discovery;
mod error;
mod parquet;
mod postgres;
mod source;

// === Error Types ===
pub use error::{IngestError, Result};

// === File Readers ===
pub use csv::read_csv_table;
pub use parquet::{read_parquet_file, read_parquet_path};
pub use source::read_path;

// === File Discovery ===
pub use discovery::{PARQUET_EXTENSIONS, list_data_files, partition_values};

// === Database ===
pub use postgres::{DbConfig, PostgresSource};
