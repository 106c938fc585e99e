//! Convenience layer over pooled SQL connections.
//!
//! Wraps a [`DbPool`] behind a [`QueryExecutor`] that turns the acquire,
//! bind, execute, map, release sequence into single calls. Result rows map
//! either into insertion-ordered [`RowRecord`]s with optional camelCase keys
//! and collision-qualified duplicates, or into caller-declared structs via
//! field bindings registered in a [`BindingRegistry`].
//!
//! ```no_run
//! use rowcast::{BindingRegistry, DbPool, PoolConfig, QueryExecutor, SqlParam};
//! use std::sync::Arc;
//!
//! # async fn demo() -> rowcast::DbResult<()> {
//! let pool = DbPool::connect("sqlite:app.db", &PoolConfig::default()).await?;
//! let executor = QueryExecutor::new(pool, Arc::new(BindingRegistry::new()));
//!
//! let users = executor
//!     .query_to_records(
//!         "SELECT id, user_name FROM users WHERE active = ?",
//!         &[SqlParam::Bool(true)],
//!     )
//!     .await?;
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

pub mod case;
pub mod config;
pub mod db;
pub mod error;
pub mod row;

pub use config::PoolConfig;
pub use db::{Backend, DbConnection, DbPool, PlaceholderStyle, QueryExecutor, SqlParam};
pub use error::{DbError, DbResult};
pub use row::{
    BindingRegistry, ColumnInfo, CursorRow, FieldBinding, FieldType, MappingMode,
    RecordDescriptor, RowRecord, RowRecordMapper, SqlValue, TypedRowMapper,
};
