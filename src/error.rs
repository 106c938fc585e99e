//! Error types for the row-mapping layer.
//!
//! All failures surface to the caller as a single [`DbError`] wrapping the
//! underlying cause. There are no internal retries anywhere: a pool acquire
//! timeout is a terminal `Acquire` failure. The one intentionally swallowed
//! failure lives in `QueryExecutor::rollback_quietly`, which logs a secondary
//! rollback failure instead of masking the primary error that triggered it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    /// A pooled connection could not be obtained (pool exhausted, acquire
    /// timeout, closed pool, or the server refused the connection).
    #[error("Connection acquisition failed: {message}")]
    Acquire { message: String },

    /// The statement could not be prepared (malformed SQL, bad connection
    /// configuration, driver-side prepare rejection).
    #[error("Statement preparation failed: {message}")]
    Prepare { message: String },

    /// The driver rejected the statement or its parameters at execution time.
    #[error("Execution failed: {message}")]
    Execution {
        message: String,
        /// e.g. "42P01" for an undefined table
        sql_state: Option<String>,
    },

    /// A row could not be converted into the requested shape (unreadable
    /// metadata, missing column, incompatible value for a bound field).
    #[error("Row mapping failed: {message}")]
    Mapping { message: String },

    /// The target type is not usable for typed mapping. Detected eagerly,
    /// before any row is fetched.
    #[error("Type '{type_name}' has no registered record bindings")]
    Configuration { type_name: String },
}

impl DbError {
    pub fn acquire(message: impl Into<String>) -> Self {
        Self::Acquire {
            message: message.into(),
        }
    }

    pub fn prepare(message: impl Into<String>) -> Self {
        Self::Prepare {
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Execution {
            message: message.into(),
            sql_state,
        }
    }

    pub fn mapping(message: impl Into<String>) -> Self {
        Self::Mapping {
            message: message.into(),
        }
    }

    pub fn configuration(type_name: impl Into<String>) -> Self {
        Self::Configuration {
            type_name: type_name.into(),
        }
    }

    /// SQLSTATE reported by the driver, when the failure carried one.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Execution { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }
}

/// Convert sqlx errors into the layer's taxonomy.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                DbError::acquire("Timed out waiting for a pooled connection")
            }
            sqlx::Error::PoolClosed => DbError::acquire("Connection pool is closed"),
            sqlx::Error::Io(io_err) => DbError::acquire(format!("I/O error: {io_err}")),
            sqlx::Error::Tls(tls_err) => DbError::acquire(format!("TLS error: {tls_err}")),
            sqlx::Error::Configuration(msg) => {
                DbError::prepare(format!("Invalid connection configuration: {msg}"))
            }
            sqlx::Error::Protocol(msg) => {
                DbError::execution(format!("Protocol error: {msg}"), None)
            }
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::execution(db_err.message().to_string(), code)
            }
            sqlx::Error::ColumnNotFound(col) => DbError::mapping(format!("Column not found: {col}")),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => {
                DbError::mapping(format!("Column index {index} out of bounds (len: {len})"))
            }
            sqlx::Error::ColumnDecode { index, source } => {
                DbError::mapping(format!("Failed to decode column {index}: {source}"))
            }
            sqlx::Error::Decode(source) => DbError::mapping(format!("Decode error: {source}")),
            sqlx::Error::TypeNotFound { type_name } => {
                DbError::mapping(format!("Type not found: {type_name}"))
            }
            sqlx::Error::RowNotFound => DbError::execution("No rows returned", None),
            sqlx::Error::WorkerCrashed => DbError::execution("Database worker crashed", None),
            _ => DbError::execution(format!("Database error: {err}"), None),
        }
    }
}

/// Result type alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
