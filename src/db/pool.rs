//! Connection pool construction and pooled connections.
//!
//! Database-specific pools (SqlitePool, PgPool) behind a `DbPool` enum, so
//! every operation keeps full native type support instead of going through a
//! lowest-common-denominator driver.

use crate::config::PoolConfig;
use crate::db::params::PlaceholderStyle;
use crate::error::{DbError, DbResult};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{PgPool, Postgres, Sqlite, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Postgres,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgresql"),
        }
    }
}

impl Backend {
    /// Positional placeholder syntax the backend's driver expects.
    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Backend::Sqlite => PlaceholderStyle::QuestionMark,
            Backend::Postgres => PlaceholderStyle::Dollar,
        }
    }
}

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl DbPool {
    /// Connect a pool for the given URL, dispatching on the URL scheme
    /// (`sqlite:` or `postgres:`/`postgresql:`).
    pub async fn connect(url: &str, config: &PoolConfig) -> DbResult<Self> {
        config.validate().map_err(DbError::prepare)?;

        let pool = if url.starts_with("sqlite:") {
            Self::connect_sqlite(url, config).await?
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Self::connect_postgres(url, config).await?
        } else {
            return Err(DbError::prepare(format!(
                "Unsupported database URL scheme in '{url}'; expected sqlite: or postgres:"
            )));
        };

        info!(backend = %pool.backend(), "Connected database pool");
        Ok(pool)
    }

    async fn connect_sqlite(url: &str, config: &PoolConfig) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| DbError::prepare(format!("Invalid SQLite connection string: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(config.initial_size)
            .max_connections(config.max_total)
            .acquire_timeout(config.max_wait())
            .connect_with(options)
            .await
            .map_err(|e| DbError::acquire(format!("Failed to connect: {e}")))?;
        Ok(DbPool::Sqlite(pool))
    }

    async fn connect_postgres(url: &str, config: &PoolConfig) -> DbResult<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.initial_size)
            .max_connections(config.max_total)
            .acquire_timeout(config.max_wait())
            .connect(url)
            .await
            .map_err(|e| DbError::acquire(format!("Failed to connect: {e}")))?;
        Ok(DbPool::Postgres(pool))
    }

    pub fn backend(&self) -> Backend {
        match self {
            DbPool::Sqlite(_) => Backend::Sqlite,
            DbPool::Postgres(_) => Backend::Postgres,
        }
    }

    /// Check out a connection. Blocks up to the configured wait bound when
    /// the pool is exhausted, then fails with an acquisition error.
    pub async fn acquire(&self) -> DbResult<DbConnection> {
        match self {
            DbPool::Sqlite(pool) => Ok(DbConnection::Sqlite(pool.acquire().await?)),
            DbPool::Postgres(pool) => Ok(DbConnection::Postgres(pool.acquire().await?)),
        }
    }

    /// Close the pool and all its connections.
    pub async fn close(&self) {
        match self {
            DbPool::Sqlite(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
        }
    }
}

/// A checked-out pooled connection.
///
/// Returned to the pool on drop. Used to compose several executor calls into
/// one transaction or scan; the caller-supplied-connection operation variants
/// take `&mut DbConnection`.
pub enum DbConnection {
    Sqlite(PoolConnection<Sqlite>),
    Postgres(PoolConnection<Postgres>),
}

impl DbConnection {
    pub fn backend(&self) -> Backend {
        match self {
            DbConnection::Sqlite(_) => Backend::Sqlite,
            DbConnection::Postgres(_) => Backend::Postgres,
        }
    }

    /// Run a bare control statement (BEGIN/COMMIT/ROLLBACK) on this
    /// connection.
    pub(crate) async fn execute_raw(&mut self, sql: &str) -> DbResult<()> {
        debug!(sql = %sql, "Executing control statement");
        match self {
            DbConnection::Sqlite(conn) => {
                sqlx::query(sql).execute(&mut **conn).await?;
            }
            DbConnection::Postgres(conn) => {
                sqlx::query(sql).execute(&mut **conn).await?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection")
            .field("backend", &self.backend())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_display() {
        assert_eq!(Backend::Sqlite.to_string(), "sqlite");
        assert_eq!(Backend::Postgres.to_string(), "postgresql");
    }

    #[test]
    fn test_placeholder_style_per_backend() {
        assert_eq!(
            Backend::Sqlite.placeholder_style(),
            PlaceholderStyle::QuestionMark
        );
        assert_eq!(
            Backend::Postgres.placeholder_style(),
            PlaceholderStyle::Dollar
        );
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let result = DbPool::connect("mysql://host/db", &PoolConfig::default()).await;
        assert!(matches!(result, Err(DbError::Prepare { .. })));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_connect() {
        let config = PoolConfig {
            max_total: 0,
            ..PoolConfig::default()
        };
        let result = DbPool::connect("sqlite::memory:", &config).await;
        assert!(matches!(result, Err(DbError::Prepare { .. })));
    }
}
