//! Query execution over pooled connections.
//!
//! [`QueryExecutor`] is the single entry point callers hold: it owns the pool
//! and both mappers, and exposes each operation in two variants. The short
//! form acquires a connection, runs, and returns it to the pool; the `_on`
//! form runs on a caller-supplied [`DbConnection`] so several operations can
//! share one connection (a transaction, or interleaved reads during a scan).
//!
//! Result rows stream: the row callback sees each row as it arrives and no
//! result set is ever fully buffered unless an accumulating convenience
//! method is asked to do so.

use crate::db::decode;
use crate::db::params::{SqlParam, build_call_sql};
use crate::db::pool::{DbConnection, DbPool};
use crate::error::DbResult;
use crate::row::{
    BindingRegistry, CursorRow, MappingMode, RowRecord, RowRecordMapper, TypedRowMapper,
};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, warn};

/// Executes statements against a pooled database and maps their results.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: DbPool,
    record_mapper: RowRecordMapper,
    typed_mapper: TypedRowMapper,
}

impl QueryExecutor {
    /// Build an executor over `pool` with raw-label record mapping.
    pub fn new(pool: DbPool, registry: Arc<BindingRegistry>) -> Self {
        Self::with_mapping_mode(pool, registry, MappingMode::Raw)
    }

    /// Build an executor with an explicit record-key mapping mode.
    pub fn with_mapping_mode(
        pool: DbPool,
        registry: Arc<BindingRegistry>,
        mode: MappingMode,
    ) -> Self {
        Self {
            pool,
            record_mapper: RowRecordMapper::with_mode(mode),
            typed_mapper: TypedRowMapper::new(registry),
        }
    }

    /// Toggle camelCase record keys on this executor instance. The flag is
    /// per-instance; other executors over the same pool are unaffected.
    pub fn set_camel_case(&mut self, enable: bool) {
        self.record_mapper.set_camel_case(enable);
    }

    pub fn camel_case(&self) -> bool {
        self.record_mapper.camel_case()
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Check out a connection for a multi-operation sequence. The connection
    /// returns to the pool when dropped.
    pub async fn acquire(&self) -> DbResult<DbConnection> {
        self.pool.acquire().await
    }

    /// Round-trip a trivial statement to verify the pool can serve a working
    /// connection.
    pub async fn check_connection(&self) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        self.query_to_record_on(&mut conn, "SELECT 1", &[]).await?;
        Ok(())
    }

    // ===== Streaming queries =====

    /// Run a parameterized query, invoking `action` once per result row in
    /// cursor order. An error from `action` aborts the scan and propagates.
    pub async fn query<F>(&self, sql: &str, params: &[SqlParam], action: F) -> DbResult<()>
    where
        F: FnMut(&CursorRow) -> DbResult<()> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        self.query_on(&mut conn, sql, params, action).await
    }

    /// [`QueryExecutor::query`] on a caller-supplied connection.
    pub async fn query_on<F>(
        &self,
        conn: &mut DbConnection,
        sql: &str,
        params: &[SqlParam],
        mut action: F,
    ) -> DbResult<()>
    where
        F: FnMut(&CursorRow) -> DbResult<()> + Send,
    {
        debug!(sql = %sql, params = params.len(), "Executing query");
        match conn {
            DbConnection::Sqlite(c) => sqlite::for_each_row(c, sql, params, &mut action).await,
            DbConnection::Postgres(c) => postgres::for_each_row(c, sql, params, &mut action).await,
        }
    }

    // ===== Record queries =====

    /// Run a query and accumulate every row as a [`RowRecord`], in cursor
    /// order.
    pub async fn query_to_records(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Vec<RowRecord>> {
        let mut conn = self.pool.acquire().await?;
        self.query_to_records_on(&mut conn, sql, params).await
    }

    /// [`QueryExecutor::query_to_records`] on a caller-supplied connection.
    pub async fn query_to_records_on(
        &self,
        conn: &mut DbConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Vec<RowRecord>> {
        let mut records = Vec::new();
        self.query_on(conn, sql, params, |row| {
            records.push(self.record_mapper.map(row)?);
            Ok(())
        })
        .await?;
        Ok(records)
    }

    /// Run a query expected to yield at most one interesting row and map the
    /// first one. `None` for an empty result; surplus rows are not fetched.
    pub async fn query_to_record(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<RowRecord>> {
        let mut conn = self.pool.acquire().await?;
        self.query_to_record_on(&mut conn, sql, params).await
    }

    /// [`QueryExecutor::query_to_record`] on a caller-supplied connection.
    pub async fn query_to_record_on(
        &self,
        conn: &mut DbConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<RowRecord>> {
        debug!(sql = %sql, params = params.len(), "Executing single-row query");
        let row = match conn {
            DbConnection::Sqlite(c) => sqlite::fetch_first(c, sql, params).await?,
            DbConnection::Postgres(c) => postgres::fetch_first(c, sql, params).await?,
        };
        row.map(|r| self.record_mapper.map(&r)).transpose()
    }

    // ===== Typed queries =====

    /// Run a query and map every row into `T` through its registered
    /// bindings. Fails before fetching anything when `T` is unregistered.
    pub async fn query_to_objects<T: Default + 'static + Send>(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        self.query_to_objects_on(&mut conn, sql, params).await
    }

    /// [`QueryExecutor::query_to_objects`] on a caller-supplied connection.
    pub async fn query_to_objects_on<T: Default + 'static + Send>(
        &self,
        conn: &mut DbConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Vec<T>> {
        self.typed_mapper.require::<T>()?;
        let mut objects = Vec::new();
        self.query_on(conn, sql, params, |row| {
            objects.push(self.typed_mapper.map_row(row)?);
            Ok(())
        })
        .await?;
        Ok(objects)
    }

    /// Map the first result row into `T`, or `None` for an empty result.
    pub async fn query_to_object<T: Default + 'static>(
        &self,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<T>> {
        let mut conn = self.pool.acquire().await?;
        self.query_to_object_on(&mut conn, sql, params).await
    }

    /// [`QueryExecutor::query_to_object`] on a caller-supplied connection.
    pub async fn query_to_object_on<T: Default + 'static>(
        &self,
        conn: &mut DbConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<T>> {
        self.typed_mapper.require::<T>()?;
        debug!(sql = %sql, params = params.len(), "Executing single-object query");
        let row = match conn {
            DbConnection::Sqlite(c) => sqlite::fetch_first(c, sql, params).await?,
            DbConnection::Postgres(c) => postgres::fetch_first(c, sql, params).await?,
        };
        row.map(|r| self.typed_mapper.map_row(&r)).transpose()
    }

    // ===== Updates and procedures =====

    /// Run a non-query statement (INSERT/UPDATE/DELETE/DDL) and return the
    /// affected-row count.
    pub async fn execute_update(&self, sql: &str, params: &[SqlParam]) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        self.execute_update_on(&mut conn, sql, params).await
    }

    /// [`QueryExecutor::execute_update`] on a caller-supplied connection.
    pub async fn execute_update_on(
        &self,
        conn: &mut DbConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<u64> {
        debug!(sql = %sql, params = params.len(), "Executing update");
        match conn {
            DbConnection::Sqlite(c) => sqlite::execute_update(c, sql, params).await,
            DbConnection::Postgres(c) => postgres::execute_update(c, sql, params).await,
        }
    }

    /// Invoke a stored procedure by name with positional parameters. The call
    /// statement is constructed in the backend's placeholder syntax; result
    /// sets a procedure may produce are discarded.
    pub async fn execute_procedure(&self, procedure: &str, params: &[SqlParam]) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        self.execute_procedure_on(&mut conn, procedure, params).await
    }

    /// [`QueryExecutor::execute_procedure`] on a caller-supplied connection.
    pub async fn execute_procedure_on(
        &self,
        conn: &mut DbConnection,
        procedure: &str,
        params: &[SqlParam],
    ) -> DbResult<()> {
        let sql = build_call_sql(procedure, params.len(), conn.backend().placeholder_style());
        debug!(procedure = %procedure, params = params.len(), "Invoking procedure");
        self.execute_update_on(conn, &sql, params).await?;
        Ok(())
    }

    // ===== Transactions =====

    /// Run a unit of work inside an explicit transaction on one pooled
    /// connection. Commit happens only when the work returns `Ok`. A failing
    /// unit of work propagates with no commit and no rollback: the connection
    /// goes back to the pool mid-transaction, and what happens to it there is
    /// the pool's concern. Callers needing guaranteed rollback hold the
    /// connection themselves via [`QueryExecutor::transaction_on`] and call
    /// [`QueryExecutor::rollback_quietly`] on failure.
    pub async fn transaction<F>(&self, work: F) -> DbResult<()>
    where
        F: for<'c> FnOnce(&'c mut DbConnection) -> BoxFuture<'c, DbResult<()>>,
    {
        let mut conn = self.pool.acquire().await?;
        self.transaction_on(&mut conn, work).await
    }

    /// [`QueryExecutor::transaction`] on a caller-supplied connection. On
    /// error the connection is left mid-transaction for the caller to
    /// resolve.
    pub async fn transaction_on<F>(&self, conn: &mut DbConnection, work: F) -> DbResult<()>
    where
        F: for<'c> FnOnce(&'c mut DbConnection) -> BoxFuture<'c, DbResult<()>>,
    {
        conn.execute_raw("BEGIN").await?;
        work(&mut *conn).await?;
        conn.execute_raw("COMMIT").await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Roll back the open transaction on `conn`, logging a rollback failure
    /// instead of propagating it. The primary error that forced the rollback
    /// is the one the caller needs to see.
    pub async fn rollback_quietly(conn: &mut DbConnection) {
        if let Err(err) = conn.execute_raw("ROLLBACK").await {
            warn!(error = %err, "Rollback failed after aborted transaction");
        }
    }
}

// ===== SQLite =====

mod sqlite {
    use super::*;
    use crate::db::params::bind_sqlite_param;
    use crate::row::ColumnInfo;
    use futures_util::TryStreamExt;
    use sqlx::SqliteConnection;

    pub(super) async fn for_each_row(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[SqlParam],
        action: &mut (dyn FnMut(&CursorRow) -> DbResult<()> + Send),
    ) -> DbResult<()> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        let mut stream = query.fetch(&mut *conn);
        let mut columns: Option<Arc<[ColumnInfo]>> = None;
        while let Some(row) = stream.try_next().await? {
            let cols = columns
                .get_or_insert_with(|| decode::sqlite::columns_of(&row))
                .clone();
            action(&decode::sqlite::decode(&row, cols)?)?;
        }
        Ok(())
    }

    pub(super) async fn fetch_first(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<CursorRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        match query.fetch_optional(&mut *conn).await? {
            Some(row) => {
                let columns = decode::sqlite::columns_of(&row);
                Ok(Some(decode::sqlite::decode(&row, columns)?))
            }
            None => Ok(None),
        }
    }

    pub(super) async fn execute_update(
        conn: &mut SqliteConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_sqlite_param(query, param);
        }
        let result = query.execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

// ===== PostgreSQL =====

mod postgres {
    use super::*;
    use crate::db::params::bind_postgres_param;
    use crate::row::ColumnInfo;
    use futures_util::TryStreamExt;
    use sqlx::PgConnection;

    pub(super) async fn for_each_row(
        conn: &mut PgConnection,
        sql: &str,
        params: &[SqlParam],
        action: &mut (dyn FnMut(&CursorRow) -> DbResult<()> + Send),
    ) -> DbResult<()> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        let mut stream = query.fetch(&mut *conn);
        let mut columns: Option<Arc<[ColumnInfo]>> = None;
        while let Some(row) = stream.try_next().await? {
            let cols = columns
                .get_or_insert_with(|| decode::postgres::columns_of(&row))
                .clone();
            action(&decode::postgres::decode(&row, cols)?)?;
        }
        Ok(())
    }

    pub(super) async fn fetch_first(
        conn: &mut PgConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<Option<CursorRow>> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        match query.fetch_optional(&mut *conn).await? {
            Some(row) => {
                let columns = decode::postgres::columns_of(&row);
                Ok(Some(decode::postgres::decode(&row, columns)?))
            }
            None => Ok(None),
        }
    }

    pub(super) async fn execute_update(
        conn: &mut PgConnection,
        sql: &str,
        params: &[SqlParam],
    ) -> DbResult<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_postgres_param(query, param);
        }
        let result = query.execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}
