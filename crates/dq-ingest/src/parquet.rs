//! Parquet loading for single files and partitioned directories.

use std::fs::File;
use std::path::Path;

use polars::functions::concat_df_diagonal;
use polars::prelude::*;
use tracing::{debug, info};

use crate::discovery::{PARQUET_EXTENSIONS, list_data_files, partition_values};
use crate::error::{IngestError, Result};

/// Reads a Parquet file, or every Parquet file below a directory.
///
/// For directories, files are read in sorted path order and every
/// `key=value` directory segment between `path` and the file becomes a
/// string column `key` holding `value`. Frames are combined by column name;
/// columns missing from some files are filled with nulls.
pub fn read_parquet_path(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(IngestError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let df = if path.is_file() {
        read_parquet_file(path)?
    } else if path.is_dir() {
        read_parquet_dir(path)?
    } else {
        return Err(IngestError::UnsupportedPath {
            path: path.to_path_buf(),
        });
    };

    info!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "loaded parquet dataset"
    );
    Ok(df)
}

/// Reads one Parquet file.
pub fn read_parquet_file(path: &Path) -> Result<DataFrame> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    ParquetReader::new(file)
        .finish()
        .map_err(|e| IngestError::ParquetRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

fn read_parquet_dir(root: &Path) -> Result<DataFrame> {
    let files = list_data_files(root, PARQUET_EXTENSIONS)?;
    if files.is_empty() {
        return Err(IngestError::NoDataFiles {
            kind: "Parquet",
            path: root.to_path_buf(),
        });
    }

    let mut frames = Vec::with_capacity(files.len());
    for file in &files {
        let mut df = read_parquet_file(file)?;
        let partitions = partition_values(root, file);
        for (key, value) in &partitions {
            let column = Series::new(key.as_str().into(), vec![value.as_str(); df.height()]);
            df.with_column(column)
                .map_err(|e| IngestError::ParquetRead {
                    path: file.clone(),
                    message: e.to_string(),
                })?;
        }
        debug!(
            file = %file.display(),
            rows = df.height(),
            partitions = partitions.len(),
            "read parquet file"
        );
        frames.push(df);
    }

    if frames.len() == 1 {
        return Ok(frames.remove(0));
    }

    concat_df_diagonal(&frames).map_err(|e| IngestError::Aggregate {
        path: root.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_parquet(path: &Path, mut df: DataFrame) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        ParquetWriter::new(&mut file).finish(&mut df).unwrap();
    }

    fn frame(ids: Vec<i64>) -> DataFrame {
        let costs: Vec<f64> = ids.iter().map(|id| *id as f64 * 10.0).collect();
        DataFrame::new(vec![
            Series::new("id".into(), ids).into(),
            Series::new("cost".into(), costs).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_read_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.parquet");
        write_parquet(&path, frame(vec![1, 2, 3]));

        let df = read_parquet_path(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn test_read_partitioned_dir_adds_partition_columns() {
        let dir = TempDir::new().unwrap();
        write_parquet(
            &dir.path().join("partition_date=2024-01").join("part-0.parquet"),
            frame(vec![1, 2]),
        );
        write_parquet(
            &dir.path().join("partition_date=2024-02").join("part-0.pq"),
            frame(vec![3]),
        );

        let df = read_parquet_path(dir.path()).unwrap();
        assert_eq!(df.height(), 3);

        let partition = df.column("partition_date").unwrap();
        assert_eq!(partition.get(0).unwrap(), AnyValue::String("2024-01"));
        assert_eq!(partition.get(2).unwrap(), AnyValue::String("2024-02"));
    }

    #[test]
    fn test_read_dir_fills_missing_partition_columns_with_null() {
        let dir = TempDir::new().unwrap();
        write_parquet(&dir.path().join("root.parquet"), frame(vec![1]));
        write_parquet(
            &dir.path().join("region=EU").join("part.parquet"),
            frame(vec![2]),
        );

        let df = read_parquet_path(dir.path()).unwrap();
        assert_eq!(df.height(), 2);
        let region = df.column("region").unwrap();
        assert_eq!(region.null_count(), 1);
    }

    #[test]
    fn test_missing_path() {
        let dir = TempDir::new().unwrap();
        let result = read_parquet_path(&dir.path().join("absent"));
        assert!(matches!(result, Err(IngestError::NotFound { .. })));
    }

    #[test]
    fn test_dir_without_parquet_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("readme.txt"), "nothing here").unwrap();

        let result = read_parquet_path(dir.path());
        assert!(matches!(result, Err(IngestError::NoDataFiles { .. })));
    }

    #[test]
    fn test_corrupt_parquet_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.parquet");
        std::fs::write(&path, "definitely not parquet").unwrap();

        let result = read_parquet_path(dir.path());
        assert!(matches!(result, Err(IngestError::ParquetRead { .. })));
    }
}
