//! Positional parameter binding and call-syntax construction.
//!
//! Parameters bind strictly in the order supplied. One rule is inherited
//! deliberately: a `Text` parameter holding the empty string binds as SQL
//! NULL, exactly like `Null` itself. Existing callers depend on that
//! conflation, so it is preserved rather than fixed; an empty string is never
//! passed through as a literal empty string.

use sqlx::postgres::PgArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Postgres, Sqlite};

/// A positional statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        SqlParam::Bool(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Int(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        SqlParam::Int(v as i64)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        SqlParam::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl From<Vec<u8>> for SqlParam {
    fn from(v: Vec<u8>) -> Self {
        SqlParam::Bytes(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => SqlParam::Null,
        }
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        // Empty string binds NULL, same as Null (see module docs).
        SqlParam::Text(v) if v.is_empty() => query.bind(None::<String>),
        SqlParam::Text(v) => query.bind(v.as_str()),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a parameter to a PostgreSQL query.
pub(crate) fn bind_postgres_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Null => query.bind(None::<String>),
        // Empty string binds NULL, same as Null (see module docs).
        SqlParam::Text(v) if v.is_empty() => query.bind(None::<String>),
        SqlParam::Text(v) => query.bind(v.as_str()),
        SqlParam::Bool(v) => query.bind(*v),
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Float(v) => query.bind(*v),
        SqlParam::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Positional placeholder syntax for constructed SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` - SQLite.
    QuestionMark,
    /// `$1`, `$2`, ... - PostgreSQL.
    Dollar,
}

/// Build a stored-procedure invocation with one positional placeholder per
/// parameter. Zero parameters yield `CALL name()` with no trailing separator.
pub(crate) fn build_call_sql(
    procedure: &str,
    param_count: usize,
    style: PlaceholderStyle,
) -> String {
    let mut sql = String::with_capacity(procedure.len() + 8 + param_count * 4);
    sql.push_str("CALL ");
    sql.push_str(procedure);
    sql.push('(');
    for i in 0..param_count {
        if i > 0 {
            sql.push_str(", ");
        }
        match style {
            PlaceholderStyle::QuestionMark => sql.push('?'),
            PlaceholderStyle::Dollar => {
                sql.push('$');
                sql.push_str(&(i + 1).to_string());
            }
        }
    }
    sql.push(')');
    sql
}
