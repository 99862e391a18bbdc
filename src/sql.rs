//! Minimal SQL statement builder.
//!
//! Statements are assembled from validated identifiers and positional
//! parameters only. Values never appear in the statement text; they travel
//! alongside it in [`Statement::args`].

use std::fmt::Write as _;
use thiserror::Error;

/// A value bound to a positional parameter, or read back from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Placeholder style used when rendering positional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placeholder {
    /// `?` for every parameter (SQLite, MySQL).
    #[default]
    Question,
    /// `$1`, `$2`, ... (PostgreSQL).
    Dollar,
}

impl Placeholder {
    fn push(self, out: &mut String, n: usize) {
        match self {
            Placeholder::Question => out.push('?'),
            Placeholder::Dollar => {
                let _ = write!(out, "${n}");
            }
        }
    }
}

/// Statement text plus its positional arguments, in binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("statement has no table")]
    MissingTable,
    #[error("statement has no columns")]
    EmptyColumns,
    #[error("{columns} columns but {values} values")]
    ValueCount { columns: usize, values: usize },
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
}

/// Accepts plain or table-qualified names: `[A-Za-z_][A-Za-z0-9_]*` segments
/// separated by single dots.
fn check_ident(name: &str) -> Result<(), BuildError> {
    let ok = !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if ok {
        Ok(())
    } else {
        Err(BuildError::InvalidIdentifier(name.to_string()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Insert {
    pub fn into(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(columns.into_iter().map(|c| c.as_ref().to_string()));
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn to_sql(&self, placeholder: Placeholder) -> Result<Statement, BuildError> {
        if self.table.is_empty() {
            return Err(BuildError::MissingTable);
        }
        check_ident(&self.table)?;
        if self.columns.is_empty() {
            return Err(BuildError::EmptyColumns);
        }
        for c in &self.columns {
            check_ident(c)?;
        }
        if self.columns.len() != self.values.len() {
            return Err(BuildError::ValueCount {
                columns: self.columns.len(),
                values: self.values.len(),
            });
        }

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES (",
            self.table,
            self.columns.join(", ")
        );
        for i in 0..self.values.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            placeholder.push(&mut sql, i + 1);
        }
        sql.push(')');

        Ok(Statement {
            sql,
            args: self.values.clone(),
        })
    }
}

#[derive(Debug, Clone)]
struct Join {
    table: String,
    left: String,
    right: String,
}

#[derive(Debug, Clone, Default)]
pub struct Select {
    columns: Vec<(String, Option<String>)>,
    from: Option<String>,
    joins: Vec<Join>,
    filters: Vec<(String, Value)>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, name: &str) -> Self {
        self.columns.push((name.to_string(), None));
        self
    }

    /// Project `name AS alias`.
    pub fn column_as(mut self, name: &str, alias: &str) -> Self {
        self.columns
            .push((name.to_string(), Some(alias.to_string())));
        self
    }

    pub fn from(mut self, table: &str) -> Self {
        self.from = Some(table.to_string());
        self
    }

    /// Inner join on `left = right`.
    pub fn join(mut self, table: &str, left: &str, right: &str) -> Self {
        self.joins.push(Join {
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        });
        self
    }

    /// Adds `column = <param>`; multiple filters are combined with AND.
    pub fn where_eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push((column.to_string(), value.into()));
        self
    }

    pub fn to_sql(&self, placeholder: Placeholder) -> Result<Statement, BuildError> {
        let from = self.from.as_deref().ok_or(BuildError::MissingTable)?;
        check_ident(from)?;
        if self.columns.is_empty() {
            return Err(BuildError::EmptyColumns);
        }

        let mut sql = String::from("SELECT ");
        for (i, (name, alias)) in self.columns.iter().enumerate() {
            check_ident(name)?;
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(name);
            if let Some(alias) = alias {
                check_ident(alias)?;
                let _ = write!(sql, " AS {alias}");
            }
        }
        let _ = write!(sql, " FROM {from}");

        for j in &self.joins {
            check_ident(&j.table)?;
            check_ident(&j.left)?;
            check_ident(&j.right)?;
            let _ = write!(sql, " JOIN {} ON {} = {}", j.table, j.left, j.right);
        }

        let mut args = Vec::with_capacity(self.filters.len());
        for (i, (column, value)) in self.filters.iter().enumerate() {
            check_ident(column)?;
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let _ = write!(sql, "{column} = ");
            placeholder.push(&mut sql, i + 1);
            args.push(value.clone());
        }

        Ok(Statement { sql, args })
    }
}
