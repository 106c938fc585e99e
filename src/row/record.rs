//! Generic row-to-record mapping.
//!
//! Converts one cursor row into an insertion-ordered record keyed by column
//! label (alias-aware), real column name, or camelCased label. Values pass
//! through in the driver's native representation; no coercion happens here.

use crate::case::to_camel_case;
use crate::error::DbResult;
use crate::row::value::{CursorRow, SqlValue};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Controls whether record keys undergo snake-to-camel conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingMode {
    /// Keys are column labels verbatim.
    #[default]
    Raw,
    /// Keys are camelCased column labels.
    CamelCase,
}

/// An insertion-ordered mapping from column key to value.
///
/// No two entries share a key. On a label collision the first occurrence
/// keeps the bare key; later duplicates are stored under a table-qualified
/// key (see [`RowRecordMapper`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    entries: Vec<(String, SqlValue)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&SqlValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Insert a key-value pair. An existing key keeps its position and has
    /// its value replaced. The mapper relies on this for repeated collisions:
    /// when a third same-table duplicate of a label produces the same
    /// qualified key, it overwrites the second (map-put semantics), so the
    /// record can hold fewer entries than the row has columns.
    pub fn insert(&mut self, key: String, value: SqlValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Serializes as a JSON object, preserving insertion order.
impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Maps cursor rows into [`RowRecord`]s.
///
/// The camel-case flag is plain instance state: toggling it from multiple
/// threads on one shared mapper is not supported; give each thread its own
/// mapper or synchronize externally.
#[derive(Debug, Clone, Default)]
pub struct RowRecordMapper {
    camel_case: bool,
}

impl RowRecordMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: MappingMode) -> Self {
        Self {
            camel_case: mode == MappingMode::CamelCase,
        }
    }

    /// Enable or disable camelCase record keys for subsequent mappings.
    pub fn set_camel_case(&mut self, enable: bool) {
        self.camel_case = enable;
    }

    pub fn camel_case(&self) -> bool {
        self.camel_case
    }

    /// Map a row using the instance's mapping mode (label-based addressing).
    pub fn map(&self, row: &CursorRow) -> DbResult<RowRecord> {
        if self.camel_case {
            self.map_camel_case(row)
        } else {
            self.map_labels(row)
        }
    }

    /// Map a row keyed by column labels (respects `AS` aliases).
    ///
    /// Collisions: iterating columns in ordinal order, a column whose label is
    /// already present is stored under `"<table>.<label>"` instead. Detection
    /// only looks backward; the first occurrence keeps the bare key. When the
    /// qualified key itself collides (three or more duplicates of one label
    /// from the same table), the later value replaces the earlier one under
    /// that qualified key; see [`RowRecord::insert`].
    pub fn map_labels(&self, row: &CursorRow) -> DbResult<RowRecord> {
        self.map_qualified_dotted(row, |c| c.label.clone())
    }

    /// Map a row keyed by real column names (ignores aliases). Same collision
    /// policy as [`RowRecordMapper::map_labels`].
    pub fn map_real_names(&self, row: &CursorRow) -> DbResult<RowRecord> {
        self.map_qualified_dotted(row, |c| c.real_name.clone())
    }

    /// Map a row keyed by camelCased labels. Colliding keys are stored under
    /// `"<camelKey> (<table>)"` - a different qualification syntax than the
    /// label modes, kept literally for compatibility.
    pub fn map_camel_case(&self, row: &CursorRow) -> DbResult<RowRecord> {
        let mut record = RowRecord::new();
        for column in row.columns() {
            let key = to_camel_case(&column.label);
            let value = row.value(column.ordinal)?.clone();
            if record.contains_key(&key) {
                record.insert(format!("{} ({})", key, column.table_name), value);
            } else {
                record.insert(key, value);
            }
        }
        Ok(record)
    }

    fn map_qualified_dotted(
        &self,
        row: &CursorRow,
        key_of: impl Fn(&crate::row::value::ColumnInfo) -> String,
    ) -> DbResult<RowRecord> {
        let mut record = RowRecord::new();
        for column in row.columns() {
            let key = key_of(column);
            let value = row.value(column.ordinal)?.clone();
            if record.contains_key(&key) {
                record.insert(format!("{}.{}", column.table_name, key), value);
            } else {
                record.insert(key, value);
            }
        }
        Ok(record)
    }
}
