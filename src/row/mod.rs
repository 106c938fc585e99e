//! The row-mapping engine.
//!
//! Converts tabular results (column metadata plus heterogeneous typed values)
//! into two target shapes: an insertion-ordered associative record, or a
//! caller-declared structured type driven by registered field bindings.

pub mod coerce;
pub mod record;
pub mod typed;
pub mod value;

pub use coerce::{CoerceError, FieldType};
pub use record::{MappingMode, RowRecord, RowRecordMapper};
pub use typed::{BindingRegistry, FieldBinding, RecordDescriptor, TypedRowMapper};
pub use value::{ColumnInfo, CursorRow, SqlValue, TypedAccessError};
