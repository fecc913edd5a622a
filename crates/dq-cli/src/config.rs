//! Harness configuration shared by every suite of a run.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use dq_ingest::DbConfig;

/// Settings resolved once from flags and environment.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Database connection; `None` when no credentials were given.
    pub db: Option<DbConfig>,
    /// Base directory for relative Parquet dataset paths.
    pub parquet_root: PathBuf,
    /// Base directory for relative CSV dataset paths.
    pub data_root: PathBuf,
}

impl HarnessConfig {
    pub fn new(db: Option<DbConfig>, parquet_root: PathBuf, data_root: PathBuf) -> Self {
        Self {
            db,
            parquet_root,
            data_root,
        }
    }

    /// Builds the database settings when both credentials are present.
    pub fn db_from_parts(
        host: &str,
        port: u16,
        database: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Option<DbConfig> {
        match (user, password) {
            (Some(user), Some(password)) => Some(DbConfig {
                host: host.to_string(),
                port,
                database: database.to_string(),
                user: user.to_string(),
                password: password.to_string(),
            }),
            _ => None,
        }
    }

    /// Database settings, required by suites with SQL datasets.
    pub fn require_db(&self) -> Result<&DbConfig> {
        match &self.db {
            Some(db) => Ok(db),
            None => bail!(
                "database credentials are required for SQL datasets: \
                 pass --db-user and --db-password (or set DB_USER and DB_PASSWORD)"
            ),
        }
    }

    pub fn resolve_parquet(&self, path: &Path) -> PathBuf {
        resolve(&self.parquet_root, path)
    }

    pub fn resolve_csv(&self, path: &Path) -> PathBuf {
        resolve(&self.data_root, path)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new(None, PathBuf::from("."), PathBuf::from("."))
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
