//! PostgreSQL dataset source.
//!
//! Runs a query and materializes the full result as a DataFrame. The client
//! is synchronous from the caller's point of view: a current-thread runtime
//! drives the underlying async connection and is owned by the source.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use polars::prelude::{Column, DataFrame, DataType, NamedFrom, PolarsResult, Series, TimeUnit};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::types::Decimal;
use sqlx::{Column as _, Connection, Executor, Row, Statement, TypeInfo};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};

/// Connection parameters for a PostgreSQL database.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5434,
            database: "mydatabase".to_string(),
            user: String::new(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// An open connection that turns SQL results into DataFrames.
///
/// The connection is closed by [`PostgresSource::close`] or when the source
/// is dropped.
pub struct PostgresSource {
    runtime: Runtime,
    conn: Option<PgConnection>,
}

impl PostgresSource {
    /// Opens a connection.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(IngestError::Runtime)?;

        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);

        let conn = runtime
            .block_on(PgConnection::connect_with(&options))
            .map_err(|source| IngestError::Connection {
                host: config.host.clone(),
                port: config.port,
                database: config.database.clone(),
                source,
            })?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "connected to PostgreSQL"
        );
        Ok(Self {
            runtime,
            conn: Some(conn),
        })
    }

    /// Connects, runs `f`, and closes the connection on every exit path.
    ///
    /// An error from `f` takes precedence over an error while closing.
    pub fn scoped<T, E, F>(config: &DbConfig, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: From<IngestError>,
    {
        let mut source = Self::connect(config)?;
        let outcome = f(&mut source);
        let closed = source.close();
        let value = outcome?;
        closed?;
        Ok(value)
    }

    /// Executes `sql` and returns the whole result set.
    ///
    /// Column names and types come from the prepared statement, so an empty
    /// result still carries its schema.
    pub fn query(&mut self, sql: &str) -> Result<DataFrame> {
        let Some(conn) = self.conn.as_mut() else {
            return Err(IngestError::Query {
                source: sqlx::Error::PoolClosed,
            });
        };

        let statement = self
            .runtime
            .block_on((&mut *conn).prepare(sql))
            .map_err(|source| IngestError::Query { source })?;

        let mut buffers: Vec<(String, String, ColumnBuffer)> = statement
            .columns()
            .iter()
            .map(|column| {
                let type_name = column.type_info().name().to_string();
                let buffer = ColumnBuffer::for_type(&type_name);
                (column.name().to_string(), type_name, buffer)
            })
            .collect();

        let rows = self
            .runtime
            .block_on(statement.query().fetch_all(&mut *conn))
            .map_err(|source| IngestError::Query { source })?;

        for row in &rows {
            for (idx, (name, type_name, buffer)) in buffers.iter_mut().enumerate() {
                buffer
                    .push(row, idx)
                    .map_err(|source| IngestError::Decode {
                        column: name.clone(),
                        type_name: type_name.clone(),
                        source,
                    })?;
            }
        }

        let columns = buffers
            .into_iter()
            .map(|(name, _, buffer)| buffer.into_column(&name))
            .collect::<PolarsResult<Vec<Column>>>()?;
        let df = DataFrame::new(columns)?;

        debug!(rows = df.height(), columns = df.width(), "query returned");
        Ok(df)
    }

    /// Closes the connection.
    pub fn close(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            self.runtime
                .block_on(conn.close())
                .map_err(|source| IngestError::Query { source })?;
            debug!("closed PostgreSQL connection");
        }
        Ok(())
    }
}

impl Drop for PostgresSource {
    fn drop(&mut self) {
        if let Err(error) = self.shutdown() {
            warn!(%error, "failed to close PostgreSQL connection");
        }
    }
}

/// Typed accumulator for one result column.
enum ColumnBuffer {
    Bool(Vec<Option<bool>>),
    Int16(Vec<Option<i64>>),
    Int32(Vec<Option<i64>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f64>>),
    Float64(Vec<Option<f64>>),
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
    /// Days since the Unix epoch.
    Date(Vec<Option<i32>>),
    /// Microseconds since the Unix epoch.
    Timestamp(Vec<Option<i64>>),
    TimestampTz(Vec<Option<i64>>),
}

impl ColumnBuffer {
    fn for_type(type_name: &str) -> Self {
        match type_name {
            "BOOL" => Self::Bool(Vec::new()),
            "INT2" => Self::Int16(Vec::new()),
            "INT4" => Self::Int32(Vec::new()),
            "INT8" => Self::Int64(Vec::new()),
            "FLOAT4" => Self::Float32(Vec::new()),
            "FLOAT8" => Self::Float64(Vec::new()),
            "NUMERIC" => Self::Numeric(Vec::new()),
            "DATE" => Self::Date(Vec::new()),
            "TIMESTAMP" => Self::Timestamp(Vec::new()),
            "TIMESTAMPTZ" => Self::TimestampTz(Vec::new()),
            // TEXT, VARCHAR, BPCHAR, NAME, CHAR; anything else fails to decode
            _ => Self::Text(Vec::new()),
        }
    }

    fn push(&mut self, row: &PgRow, idx: usize) -> std::result::Result<(), sqlx::Error> {
        match self {
            Self::Bool(values) => values.push(row.try_get::<Option<bool>, _>(idx)?),
            Self::Int16(values) => {
                values.push(row.try_get::<Option<i16>, _>(idx)?.map(i64::from));
            }
            Self::Int32(values) => {
                values.push(row.try_get::<Option<i32>, _>(idx)?.map(i64::from));
            }
            Self::Int64(values) => values.push(row.try_get::<Option<i64>, _>(idx)?),
            Self::Float32(values) => {
                values.push(row.try_get::<Option<f32>, _>(idx)?.map(f64::from));
            }
            Self::Float64(values) => values.push(row.try_get::<Option<f64>, _>(idx)?),
            Self::Numeric(values) => {
                let value = row.try_get::<Option<Decimal>, _>(idx)?;
                values.push(value.and_then(|d| d.to_string().parse::<f64>().ok()));
            }
            Self::Text(values) => values.push(row.try_get::<Option<String>, _>(idx)?),
            Self::Date(values) => {
                let value = row.try_get::<Option<NaiveDate>, _>(idx)?;
                values.push(value.and_then(days_since_epoch));
            }
            Self::Timestamp(values) => {
                let value = row.try_get::<Option<NaiveDateTime>, _>(idx)?;
                values.push(value.map(|ts| ts.and_utc().timestamp_micros()));
            }
            Self::TimestampTz(values) => {
                let value = row.try_get::<Option<DateTime<Utc>>, _>(idx)?;
                values.push(value.map(|ts| ts.timestamp_micros()));
            }
        }
        Ok(())
    }

    fn into_column(self, name: &str) -> PolarsResult<Column> {
        let series = match self {
            Self::Bool(values) => Series::new(name.into(), values),
            Self::Int16(values) | Self::Int32(values) | Self::Int64(values) => {
                Series::new(name.into(), values)
            }
            Self::Float32(values) | Self::Float64(values) | Self::Numeric(values) => {
                Series::new(name.into(), values)
            }
            Self::Text(values) => Series::new(name.into(), values),
            Self::Date(values) => Series::new(name.into(), values).cast(&DataType::Date)?,
            Self::Timestamp(values) | Self::TimestampTz(values) => Series::new(name.into(), values)
                .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?,
        };
        Ok(series.into())
    }
}

fn days_since_epoch(date: NaiveDate) -> Option<i32> {
    i32::try_from(date.signed_duration_since(NaiveDate::default()).num_days()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5434);
        assert_eq!(config.database, "mydatabase");
    }

    #[test]
    fn test_db_config_debug_redacts_password() {
        let config = DbConfig {
            password: "hunter2".to_string(),
            ..DbConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_db_config_deserialize_partial() {
        let config: DbConfig =
            serde_json::from_str(r#"{"host": "db.internal", "user": "qa"}"#).unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.user, "qa");
        assert_eq!(config.port, 5434);
    }

    #[test]
    fn test_days_since_epoch() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(days_since_epoch(date), Some(19_723));
    }

    #[test]
    fn test_date_buffer_builds_date_column() {
        let column = ColumnBuffer::Date(vec![Some(19_723), None])
            .into_column("visit_date")
            .unwrap();
        assert_eq!(column.dtype(), &DataType::Date);
        assert_eq!(column.null_count(), 1);
    }

    #[test]
    fn test_connect_failure_is_connection_error() {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "nobody".to_string(),
            ..DbConfig::default()
        };
        let result = PostgresSource::connect(&config);
        assert!(matches!(result, Err(IngestError::Connection { .. })));
    }

    #[derive(Debug)]
    enum LoadError {
        Ingest(IngestError),
    }

    impl From<IngestError> for LoadError {
        fn from(error: IngestError) -> Self {
            Self::Ingest(error)
        }
    }

    #[test]
    fn test_scoped_connect_failure_skips_body() {
        let config = DbConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            user: "nobody".to_string(),
            ..DbConfig::default()
        };
        let mut ran = false;
        let result: std::result::Result<(), LoadError> = PostgresSource::scoped(&config, |_| {
            ran = true;
            Ok(())
        });
        assert!(!ran);
        assert!(matches!(
            result,
            Err(LoadError::Ingest(IngestError::Connection { port: 1, .. }))
        ));
    }
}
