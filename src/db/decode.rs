//! Per-backend decoding of driver rows into [`CursorRow`]s.
//!
//! Each backend submodule exposes the same two functions: `columns_of` builds
//! the shared column metadata from a statement's first row, and `decode`
//! materializes one row's values in ordinal order. Decoding dispatches on the
//! driver-reported type name and always reads through `Option<T>` so SQL NULL
//! surfaces as [`SqlValue::Null`] instead of a decode failure.
//!
//! Neither driver reports the originating table of a column, so `table_name`
//! is left empty and collision qualification degrades as documented on
//! `RowRecordMapper`.

use crate::row::{ColumnInfo, SqlValue};

// ===== SQLite =====

pub(crate) mod sqlite {
    use super::*;
    use crate::error::DbResult;
    use crate::row::CursorRow;
    use chrono::NaiveDateTime;
    use sqlx::sqlite::SqliteRow;
    use sqlx::{Column, Row, TypeInfo};
    use std::sync::Arc;

    pub(crate) fn columns_of(row: &SqliteRow) -> Arc<[ColumnInfo]> {
        row.columns()
            .iter()
            .enumerate()
            .map(|(i, col)| ColumnInfo::new(col.name(), col.name(), "", i + 1))
            .collect::<Vec<_>>()
            .into()
    }

    /// Decode one row. SQLite rows never support typed retrieval by name;
    /// the typed mapper takes its untyped fallback path for them.
    pub(crate) fn decode(row: &SqliteRow, columns: Arc<[ColumnInfo]>) -> DbResult<CursorRow> {
        let mut values = Vec::with_capacity(columns.len());
        for (i, col) in row.columns().iter().enumerate() {
            values.push(decode_value(row, i, col.type_info().name())?);
        }
        Ok(CursorRow::new(columns, values, false))
    }

    fn decode_value(row: &SqliteRow, index: usize, type_name: &str) -> DbResult<SqlValue> {
        let upper = type_name.to_uppercase();
        // SQLite type affinity: declared types are free-form, so match on
        // substrings the way the engine itself classifies them.
        let value = if upper.contains("BOOL") {
            row.try_get::<Option<bool>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Bool)
        } else if upper.contains("INT") {
            row.try_get::<Option<i64>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Int)
        } else if upper.contains("REAL")
            || upper.contains("FLOA")
            || upper.contains("DOUB")
            || upper.contains("NUMERIC")
        {
            row.try_get::<Option<f64>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Float)
        } else if upper.contains("BLOB") {
            row.try_get::<Option<Vec<u8>>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Bytes)
        } else if upper.contains("DATETIME") || upper.contains("TIMESTAMP") {
            // Stored as text or numeric depending on who wrote it; try the
            // chrono decode first, then fall back to raw text.
            match row.try_get::<Option<NaiveDateTime>, _>(index) {
                Ok(v) => v.map_or(SqlValue::Null, SqlValue::Timestamp),
                Err(_) => row
                    .try_get::<Option<String>, _>(index)?
                    .map_or(SqlValue::Null, SqlValue::Text),
            }
        } else {
            row.try_get::<Option<String>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Text)
        };
        Ok(value)
    }
}

// ===== PostgreSQL =====

pub(crate) mod postgres {
    use super::*;
    use crate::error::DbResult;
    use crate::row::CursorRow;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use sqlx::postgres::{PgRow, PgValueRef};
    use sqlx::{Column, Row, TypeInfo};
    use std::sync::Arc;

    /// NUMERIC values decoded as their text form. Avoids pulling in a decimal
    /// crate for values the mapping layer treats as text anyway.
    struct RawNumeric(String);

    impl sqlx::Type<sqlx::Postgres> for RawNumeric {
        fn type_info() -> sqlx::postgres::PgTypeInfo {
            <String as sqlx::Type<sqlx::Postgres>>::type_info()
        }

        fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
            let name = ty.name().to_lowercase();
            name.contains("numeric") || name.contains("decimal")
        }
    }

    impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RawNumeric {
        fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
            let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
            Ok(RawNumeric(s.to_string()))
        }
    }

    pub(crate) fn columns_of(row: &PgRow) -> Arc<[ColumnInfo]> {
        row.columns()
            .iter()
            .enumerate()
            .map(|(i, col)| ColumnInfo::new(col.name(), col.name(), "", i + 1))
            .collect::<Vec<_>>()
            .into()
    }

    /// Decode one row. PostgreSQL reports precise wire types, so these rows
    /// support typed retrieval by name.
    pub(crate) fn decode(row: &PgRow, columns: Arc<[ColumnInfo]>) -> DbResult<CursorRow> {
        let mut values = Vec::with_capacity(columns.len());
        for (i, col) in row.columns().iter().enumerate() {
            values.push(decode_value(row, i, col.type_info().name())?);
        }
        Ok(CursorRow::new(columns, values, true))
    }

    fn decode_value(row: &PgRow, index: usize, type_name: &str) -> DbResult<SqlValue> {
        let value = match type_name {
            "INT2" => row
                .try_get::<Option<i16>, _>(index)?
                .map_or(SqlValue::Null, |v| SqlValue::Int(v as i64)),
            "INT4" => row
                .try_get::<Option<i32>, _>(index)?
                .map_or(SqlValue::Null, |v| SqlValue::Int(v as i64)),
            "INT8" => row
                .try_get::<Option<i64>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Int),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(index)?
                .map_or(SqlValue::Null, |v| SqlValue::Float(v as f64)),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Float),
            "BOOL" => row
                .try_get::<Option<bool>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Bool),
            "BYTEA" => row
                .try_get::<Option<Vec<u8>>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Bytes),
            "TIMESTAMP" => row
                .try_get::<Option<NaiveDateTime>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Timestamp),
            "TIMESTAMPTZ" => row
                .try_get::<Option<DateTime<Utc>>, _>(index)?
                .map_or(SqlValue::Null, |v| SqlValue::Timestamp(v.naive_utc())),
            "NUMERIC" => row
                .try_get::<Option<RawNumeric>, _>(index)?
                .map_or(SqlValue::Null, |v| SqlValue::Text(v.0)),
            _ => row
                .try_get::<Option<String>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Text),
        };
        Ok(value)
    }
}
