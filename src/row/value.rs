//! Driver-native row values and column metadata.
//!
//! A [`CursorRow`] is one materialized result row: the column descriptors the
//! cursor reported for the statement, the values in ordinal order, and a flag
//! recording whether the originating driver supports typed retrieval by name
//! (`get_typed`). Lightweight drivers do not; the typed mapper falls back to
//! untyped retrieval plus host-side coercion when they signal that.

use crate::error::{DbError, DbResult};
use crate::row::coerce::{self, CoerceError, FieldType};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::NaiveDateTime;
use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A value in the driver's native dynamic representation.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short name of the value's variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Timestamp(_) => "timestamp",
        }
    }

    /// Project the value into JSON. Byte sequences render as base64 text,
    /// non-finite floats as strings (JSON numbers cannot carry them).
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(v) => JsonValue::Bool(*v),
            SqlValue::Int(v) => JsonValue::Number((*v).into()),
            SqlValue::Float(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or_else(|| JsonValue::String(v.to_string())),
            SqlValue::Text(v) => JsonValue::String(v.clone()),
            SqlValue::Bytes(v) => JsonValue::String(STANDARD.encode(v)),
            SqlValue::Timestamp(v) => JsonValue::String(v.to_string()),
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Metadata for one result column, produced by the cursor per statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column label; reflects any `AS` alias in the query.
    pub label: String,
    /// Underlying table column name, ignoring aliases.
    pub real_name: String,
    /// Originating table name; empty when the driver does not know it
    /// (expressions, or drivers without origin metadata).
    pub table_name: String,
    /// 1-based position within the row.
    pub ordinal: usize,
}

impl ColumnInfo {
    pub fn new(
        label: impl Into<String>,
        real_name: impl Into<String>,
        table_name: impl Into<String>,
        ordinal: usize,
    ) -> Self {
        Self {
            label: label.into(),
            real_name: real_name.into(),
            table_name: table_name.into(),
            ordinal,
        }
    }
}

/// Failure modes of the typed column accessor. "Driver cannot do typed
/// retrieval at all" is deliberately distinct from "column absent".
#[derive(Debug)]
pub enum TypedAccessError {
    /// The driver has no typed retrieval; fall back to the untyped accessor.
    Unsupported,
    /// No column with the requested label exists in this row.
    ColumnAbsent(String),
    /// The column exists but its value cannot represent the requested type.
    Incompatible(CoerceError),
}

/// One materialized cursor row.
///
/// Column metadata is shared across all rows of a statement execution.
/// Values are owned; the row is handed to mappers read-only and never reused.
#[derive(Debug, Clone)]
pub struct CursorRow {
    columns: Arc<[ColumnInfo]>,
    values: Vec<SqlValue>,
    typed_access: bool,
}

impl CursorRow {
    /// Build a row from column metadata and values in ordinal order.
    ///
    /// `typed_access` records whether the source driver supports typed
    /// retrieval by name (see [`CursorRow::get_typed`]).
    pub fn new(columns: Arc<[ColumnInfo]>, values: Vec<SqlValue>, typed_access: bool) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self {
            columns,
            values,
            typed_access,
        }
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn supports_typed_access(&self) -> bool {
        self.typed_access
    }

    /// Generic per-column value accessor, 1-based ordinal.
    pub fn value(&self, ordinal: usize) -> DbResult<&SqlValue> {
        ordinal
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .ok_or_else(|| {
                DbError::mapping(format!(
                    "Column ordinal {ordinal} out of range (1..={})",
                    self.values.len()
                ))
            })
    }

    /// Untyped value accessor by column label (alias-aware).
    pub fn value_by_label(&self, label: &str) -> DbResult<&SqlValue> {
        self.position_of(label)
            .map(|i| &self.values[i])
            .ok_or_else(|| DbError::mapping(format!("Column not found: {label}")))
    }

    /// Typed value accessor by column label: the driver-side pre-coercion
    /// path. Returns `Unsupported` when the underlying driver cannot do typed
    /// retrieval (the caller then falls back to [`CursorRow::value_by_label`]),
    /// `ColumnAbsent` when no such label exists, and `Incompatible` when the
    /// value cannot represent the requested type.
    pub fn get_typed(&self, label: &str, ty: FieldType) -> Result<SqlValue, TypedAccessError> {
        if !self.typed_access {
            return Err(TypedAccessError::Unsupported);
        }
        let idx = self
            .position_of(label)
            .ok_or_else(|| TypedAccessError::ColumnAbsent(label.to_string()))?;
        coerce::coerce(&self.values[idx], ty).map_err(TypedAccessError::Incompatible)
    }

    fn position_of(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CursorRow {
        let columns: Arc<[ColumnInfo]> = Arc::from(vec![
            ColumnInfo::new("id", "id", "users", 1),
            ColumnInfo::new("name", "name", "users", 2),
        ]);
        CursorRow::new(
            columns,
            vec![SqlValue::Int(7), SqlValue::Text("ada".into())],
            true,
        )
    }

    #[test]
    fn test_value_is_one_based() {
        let row = row();
        assert_eq!(row.value(1).unwrap(), &SqlValue::Int(7));
        assert_eq!(row.value(2).unwrap(), &SqlValue::Text("ada".into()));
        assert!(row.value(0).is_err());
        assert!(row.value(3).is_err());
    }

    #[test]
    fn test_value_by_label() {
        let row = row();
        assert_eq!(row.value_by_label("name").unwrap(), &SqlValue::Text("ada".into()));
        assert!(row.value_by_label("missing").is_err());
    }

    #[test]
    fn test_get_typed_absent_vs_unsupported() {
        let row = row();
        assert!(matches!(
            row.get_typed("missing", FieldType::Integer),
            Err(TypedAccessError::ColumnAbsent(_))
        ));

        let columns: Arc<[ColumnInfo]> = Arc::from(vec![ColumnInfo::new("id", "id", "", 1)]);
        let untyped = CursorRow::new(columns, vec![SqlValue::Int(1)], false);
        assert!(matches!(
            untyped.get_typed("id", FieldType::Integer),
            Err(TypedAccessError::Unsupported)
        ));
    }

    #[test]
    fn test_json_projection() {
        assert_eq!(SqlValue::Null.to_json(), JsonValue::Null);
        assert_eq!(SqlValue::Int(3).to_json(), serde_json::json!(3));
        assert_eq!(
            SqlValue::Bytes(b"hi".to_vec()).to_json(),
            JsonValue::String("aGk=".to_string())
        );
        assert_eq!(
            SqlValue::Float(f64::NAN).to_json(),
            JsonValue::String("NaN".to_string())
        );
    }
}
