//! Value coercion across the driver type boundary.
//!
//! The original behavior here was "coerce to whatever type the target field
//! declares". That open-ended contract is replaced by a closed set of
//! coercions keyed by [`FieldType`]; combinations outside the table below
//! fail explicitly instead of leaning on implicit runtime conversion.
//!
//! | target    | accepted sources                                  |
//! |-----------|---------------------------------------------------|
//! | Boolean   | boolean, integer 0/1                              |
//! | Integer   | integer, boolean, integral finite float           |
//! | Float     | float, integer                                    |
//! | Text      | text                                              |
//! | Bytes     | bytes                                             |
//! | Timestamp | timestamp, text (RFC 3339 or `Y-m-d H:M:S[.f]`)   |
//!
//! Null passes through untouched; whether null is acceptable is decided at
//! assignment time, where the field's optionality is known.

use crate::row::value::SqlValue;
use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

/// Declared semantic type of a bound target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Boolean,
    Integer,
    Float,
    Text,
    Bytes,
    Timestamp,
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Text => "text",
            FieldType::Bytes => "bytes",
            FieldType::Timestamp => "timestamp",
        }
    }
}

#[derive(Error, Debug)]
pub enum CoerceError {
    #[error("cannot coerce {from} value to {to}")]
    Incompatible { from: &'static str, to: &'static str },

    #[error("float value {value} is not an integral {to}")]
    NotIntegral { value: f64, to: &'static str },

    #[error("cannot parse '{text}' as a timestamp")]
    BadTimestamp { text: String },

    #[error("null value for non-optional field")]
    NullValue,
}

fn incompatible(from: &SqlValue, to: FieldType) -> CoerceError {
    CoerceError::Incompatible {
        from: from.type_name(),
        to: to.name(),
    }
}

/// Coerce a driver-native value into the closed representation for `ty`.
///
/// Used on both retrieval paths: by the cursor's typed accessor (the
/// driver-side pre-coercion) and by the typed mapper's fallback after an
/// untyped read.
pub fn coerce(value: &SqlValue, ty: FieldType) -> Result<SqlValue, CoerceError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    match ty {
        FieldType::Boolean => match value {
            SqlValue::Bool(_) => Ok(value.clone()),
            SqlValue::Int(0) => Ok(SqlValue::Bool(false)),
            SqlValue::Int(1) => Ok(SqlValue::Bool(true)),
            _ => Err(incompatible(value, ty)),
        },
        FieldType::Integer => match value {
            SqlValue::Int(_) => Ok(value.clone()),
            SqlValue::Bool(b) => Ok(SqlValue::Int(i64::from(*b))),
            SqlValue::Float(f) => {
                // 2^63 is exactly representable as f64; i64::MAX is not and
                // would round up past the last representable i64.
                const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
                if f.is_finite() && f.fract() == 0.0 && *f >= -I64_BOUND && *f < I64_BOUND {
                    Ok(SqlValue::Int(*f as i64))
                } else {
                    Err(CoerceError::NotIntegral {
                        value: *f,
                        to: ty.name(),
                    })
                }
            }
            _ => Err(incompatible(value, ty)),
        },
        FieldType::Float => match value {
            SqlValue::Float(_) => Ok(value.clone()),
            SqlValue::Int(i) => Ok(SqlValue::Float(*i as f64)),
            _ => Err(incompatible(value, ty)),
        },
        FieldType::Text => match value {
            SqlValue::Text(_) => Ok(value.clone()),
            _ => Err(incompatible(value, ty)),
        },
        FieldType::Bytes => match value {
            SqlValue::Bytes(_) => Ok(value.clone()),
            _ => Err(incompatible(value, ty)),
        },
        FieldType::Timestamp => match value {
            SqlValue::Timestamp(_) => Ok(value.clone()),
            SqlValue::Text(s) => parse_timestamp(s)
                .map(SqlValue::Timestamp)
                .ok_or_else(|| CoerceError::BadTimestamp { text: s.clone() }),
            _ => Err(incompatible(value, ty)),
        },
    }
}

/// Parse the timestamp text forms drivers commonly hand back.
fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_passes_through() {
        for ty in [FieldType::Integer, FieldType::Text, FieldType::Timestamp] {
            assert_eq!(coerce(&SqlValue::Null, ty).unwrap(), SqlValue::Null);
        }
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(
            coerce(&SqlValue::Float(4.0), FieldType::Integer).unwrap(),
            SqlValue::Int(4)
        );
        assert_eq!(
            coerce(&SqlValue::Int(4), FieldType::Float).unwrap(),
            SqlValue::Float(4.0)
        );
        assert!(matches!(
            coerce(&SqlValue::Float(4.5), FieldType::Integer),
            Err(CoerceError::NotIntegral { .. })
        ));
    }

    #[test]
    fn test_integer_boundary_floats() {
        // i64::MIN is exactly representable and converts; 2^63 is out of
        // range and must not saturate silently.
        assert_eq!(
            coerce(&SqlValue::Float(-9_223_372_036_854_775_808.0), FieldType::Integer).unwrap(),
            SqlValue::Int(i64::MIN)
        );
        assert!(matches!(
            coerce(&SqlValue::Float(9_223_372_036_854_775_808.0), FieldType::Integer),
            Err(CoerceError::NotIntegral { .. })
        ));
        assert!(matches!(
            coerce(&SqlValue::Float(f64::INFINITY), FieldType::Integer),
            Err(CoerceError::NotIntegral { .. })
        ));
    }

    #[test]
    fn test_boolean_from_integer() {
        assert_eq!(
            coerce(&SqlValue::Int(1), FieldType::Boolean).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(
            coerce(&SqlValue::Int(0), FieldType::Boolean).unwrap(),
            SqlValue::Bool(false)
        );
        assert!(coerce(&SqlValue::Int(2), FieldType::Boolean).is_err());
    }

    #[test]
    fn test_text_is_strict() {
        assert!(coerce(&SqlValue::Int(1), FieldType::Text).is_err());
        assert_eq!(
            coerce(&SqlValue::Text("x".into()), FieldType::Text).unwrap(),
            SqlValue::Text("x".into())
        );
    }

    #[test]
    fn test_timestamp_from_text() {
        let coerced = coerce(
            &SqlValue::Text("2024-05-01 12:30:00".into()),
            FieldType::Timestamp,
        )
        .unwrap();
        match coerced {
            SqlValue::Timestamp(dt) => assert_eq!(dt.to_string(), "2024-05-01 12:30:00"),
            other => panic!("expected timestamp, got {other:?}"),
        }

        assert!(matches!(
            coerce(&SqlValue::Text("not a date".into()), FieldType::Timestamp),
            Err(CoerceError::BadTimestamp { .. })
        ));
    }

    #[test]
    fn test_unsupported_combination_fails_explicitly() {
        let err = coerce(&SqlValue::Bytes(vec![1]), FieldType::Integer).unwrap_err();
        assert!(err.to_string().contains("bytes"));
    }
}
