//! Store capability consumed by the repository.
//!
//! A store executes a [`Statement`] and hands back an opaque cursor together
//! with a [`Release`] guard, then materializes the cursor into column-keyed
//! [`Record`]s. The repository never sees a concrete database client.

use crate::error::StoreError;
use crate::sql::{Placeholder, Statement, Value};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use std::fmt;
use tracing::{debug, instrument, trace};

/// One materialized row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: &str, value: impl Into<Value>) {
        self.columns.push((column.to_string(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }

    /// Text value of `column`. Numbers are rendered in decimal, since SQLite
    /// column affinity may have stored a caller's text as INTEGER or REAL.
    pub fn text(&self, column: &str) -> Result<String, StoreError> {
        match self.get(column) {
            Some(Value::Text(s)) => Ok(s.clone()),
            Some(Value::Integer(i)) => Ok(i.to_string()),
            Some(Value::Real(f)) => Ok(f.to_string()),
            Some(Value::Null) => Err(StoreError::Decode {
                column: column.to_string(),
                reason: "unexpected NULL".into(),
            }),
            None => Err(StoreError::MissingColumn(column.to_string())),
        }
    }
}

/// Builds a typed entity from a [`Record`] using the entity's declared
/// column names.
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, StoreError>;
}

/// Cleanup handle returned alongside a cursor. The cleanup runs exactly once:
/// either through [`Release::release`] or when the guard is dropped.
pub struct Release(Option<Box<dyn FnOnce() + Send>>);

impl Release {
    pub fn new(cleanup: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(cleanup)))
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(cleanup) = self.0.take() {
            cleanup();
        }
    }
}

impl Drop for Release {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Release")
            .field("pending", &self.0.is_some())
            .finish()
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    type Cursor: Send;

    /// Placeholder style the store's driver expects.
    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    /// Executes `stmt` with its positional arguments. The returned guard must
    /// be kept alive until the cursor has been consumed.
    async fn query(&self, stmt: &Statement) -> Result<(Self::Cursor, Release), StoreError>;

    /// Materializes every row of `cursor`.
    async fn scan_all(&self, cursor: Self::Cursor) -> Result<Vec<Record>, StoreError>;
}

/// [`Store`] backed by an sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for SqliteStore {
    type Cursor = Vec<SqliteRow>;

    #[instrument(skip_all, fields(sql = %stmt.sql, args = stmt.args.len()))]
    async fn query(&self, stmt: &Statement) -> Result<(Self::Cursor, Release), StoreError> {
        let mut conn = self.pool.acquire().await?;

        let mut query = sqlx::query(&stmt.sql);
        for arg in &stmt.args {
            query = match arg {
                Value::Null => query.bind(None::<String>),
                Value::Integer(v) => query.bind(*v),
                Value::Real(v) => query.bind(*v),
                Value::Text(v) => query.bind(v.clone()),
            };
        }
        let rows = query.fetch_all(&mut *conn).await?;
        debug!(rows = rows.len(), "statement executed");

        // The pooled connection goes back to the pool when the guard runs.
        let release = Release::new(move || {
            drop(conn);
            trace!("connection released");
        });
        Ok((rows, release))
    }

    async fn scan_all(&self, rows: Self::Cursor) -> Result<Vec<Record>, StoreError> {
        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &SqliteRow) -> Result<Record, StoreError> {
    let mut record = Record::new();
    for col in row.columns() {
        let name = col.name();
        let idx = col.ordinal();
        let decode_err = |e: sqlx::Error| StoreError::Decode {
            column: name.to_string(),
            reason: e.to_string(),
        };

        let raw = row.try_get_raw(idx).map_err(decode_err)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" => Value::Integer(row.try_get(idx).map_err(decode_err)?),
                "REAL" => Value::Real(row.try_get(idx).map_err(decode_err)?),
                "TEXT" => Value::Text(row.try_get(idx).map_err(decode_err)?),
                "BLOB" => {
                    let bytes: Vec<u8> = row.try_get(idx).map_err(decode_err)?;
                    let text = String::from_utf8(bytes).map_err(|_| StoreError::Decode {
                        column: name.to_string(),
                        reason: "BLOB is not valid UTF-8".into(),
                    })?;
                    Value::Text(text)
                }
                other => {
                    return Err(StoreError::Decode {
                        column: name.to_string(),
                        reason: format!("unsupported column type {other}"),
                    })
                }
            }
        };
        record.push(name, value);
    }
    Ok(record)
}
