//! Error types for dataset ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Path does not exist.
    #[error("path does not exist: {path}")]
    NotFound { path: PathBuf },

    /// Path exists but is neither a regular file nor a directory.
    #[error("path is neither a file nor a directory: {path}")]
    UnsupportedPath { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to open a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// A directory contained no data files with the expected extension.
    #[error("no {kind} files found in directory: {path}")]
    NoDataFiles { kind: &'static str, path: PathBuf },

    /// Failed to parse a Parquet file.
    #[error("failed to read Parquet file {path}: {message}")]
    ParquetRead { path: PathBuf, message: String },

    /// Failed to parse a CSV file.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Frames read from one directory could not be combined.
    #[error("failed to combine data files under {path}: {message}")]
    Aggregate { path: PathBuf, message: String },

    // === Database Errors ===
    /// Could not open a database connection.
    #[error("failed to connect to PostgreSQL at {host}:{port}/{database}: {source}")]
    Connection {
        host: String,
        port: u16,
        database: String,
        #[source]
        source: sqlx::Error,
    },

    /// Query execution failed.
    #[error("query failed: {source}")]
    Query {
        #[source]
        source: sqlx::Error,
    },

    /// A result column could not be decoded.
    #[error("failed to decode column '{column}' ({type_name}): {source}")]
    Decode {
        column: String,
        type_name: String,
        #[source]
        source: sqlx::Error,
    },

    /// The async runtime backing the database client could not start.
    #[error("failed to start database runtime: {0}")]
    Runtime(#[source] std::io::Error),

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
