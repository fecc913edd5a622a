//! Path-based dataset loading.

use std::path::Path;

use polars::prelude::DataFrame;

use crate::csv::read_csv_table;
use crate::error::{IngestError, Result};
use crate::parquet::read_parquet_path;

/// Loads a dataset from a path, choosing the reader by extension.
///
/// Directories and `.parquet`/`.pq` files go through the Parquet reader,
/// `.csv` files through the CSV reader.
pub fn read_path(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let is_csv = path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv_table(path)
    } else {
        read_parquet_path(path)
    }
}
