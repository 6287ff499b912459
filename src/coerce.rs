//! Coercion from a dynamically-decoded [`Value`] into a statically-typed
//! destination. The legal conversions are a closed table: exact shape
//! matches, range-checked integer narrowing/widening, lossless float
//! widening, one level of optional wrapping, and element-wise conversion
//! for sequences and maps. Anything else is an error naming both shapes.

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::integer::Integer;
use crate::timestamp::Timestamp;
use crate::value::{ByteBuf, Value};

/// A destination shape that a dynamic [`Value`] can be converted into.
pub trait FromValue: Sized {
    fn from_value(v: Value) -> Result<Self>;
}

impl Value {
    /// Convert this value into a concrete destination shape.
    pub fn coerce<T: FromValue>(self) -> Result<T> {
        T::from_value(self)
    }
}

impl FromValue for Value {
    fn from_value(v: Value) -> Result<Self> {
        Ok(v)
    }
}

impl FromValue for () {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Null => Ok(()),
            other => Err(Error::TypeMismatch {
                expected: "Null",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for bool {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Bool(b) => Ok(b),
            other => Err(Error::TypeMismatch {
                expected: "Bool",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for Integer {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Int(i) => Ok(i),
            other => Err(Error::TypeMismatch {
                expected: "Int",
                found: other.kind(),
            }),
        }
    }
}

macro_rules! impl_from_value_int {
    ($t: ty) => {
        impl FromValue for $t {
            fn from_value(v: Value) -> Result<Self> {
                match v {
                    Value::Int(i) => <$t>::try_from(i).map_err(|value| Error::IntOutOfRange {
                        value,
                        target: stringify!($t),
                    }),
                    other => Err(Error::TypeMismatch {
                        expected: stringify!($t),
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

impl_from_value_int!(u8);
impl_from_value_int!(u16);
impl_from_value_int!(u32);
impl_from_value_int!(u64);
impl_from_value_int!(i8);
impl_from_value_int!(i16);
impl_from_value_int!(i32);
impl_from_value_int!(i64);

impl FromValue for f32 {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::F32(f) => Ok(f),
            other => Err(Error::TypeMismatch {
                expected: "F32",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for f64 {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::F64(f) => Ok(f),
            Value::F32(f) => Ok(f as f64),
            other => Err(Error::TypeMismatch {
                expected: "F64",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for String {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Str(s) => Ok(s),
            other => Err(Error::TypeMismatch {
                expected: "Str",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for ByteBuf {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Bin(b) => Ok(ByteBuf(b)),
            other => Err(Error::TypeMismatch {
                expected: "Bin",
                found: other.kind(),
            }),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Timestamp(t) => Ok(t),
            other => Err(Error::TypeMismatch {
                expected: "Timestamp",
                found: other.kind(),
            }),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Null => Ok(None),
            other => Ok(Some(T::from_value(other)?)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    T::from_value(item).map_err(|e| Error::Element {
                        index: i,
                        source: Box::new(e),
                    })
                })
                .collect(),
            other => Err(Error::TypeMismatch {
                expected: "Array",
                found: other.kind(),
            }),
        }
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(v: Value) -> Result<Self> {
        match v {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, val)| match T::from_value(val) {
                    Ok(val) => Ok((key, val)),
                    Err(e) => Err(Error::Field {
                        key,
                        source: Box::new(e),
                    }),
                })
                .collect(),
            other => Err(Error::TypeMismatch {
                expected: "Map",
                found: other.kind(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_shapes() {
        assert_eq!(Value::Bool(true).coerce::<bool>().unwrap(), true);
        assert_eq!(
            Value::from("abc").coerce::<String>().unwrap(),
            "abc".to_string()
        );
        assert_eq!(
            Value::Bin(vec![1, 2]).coerce::<ByteBuf>().unwrap(),
            ByteBuf(vec![1, 2])
        );
        assert_eq!(Value::Null.coerce::<()>().unwrap(), ());
    }

    #[test]
    fn numeric_narrowing_is_range_checked() {
        assert_eq!(Value::from(300u64).coerce::<u16>().unwrap(), 300);
        assert_eq!(Value::from(300u64).coerce::<i64>().unwrap(), 300);
        assert!(matches!(
            Value::from(300u64).coerce::<u8>().unwrap_err(),
            Error::IntOutOfRange { target: "u8", .. }
        ));
        assert!(matches!(
            Value::from(-1i64).coerce::<u64>().unwrap_err(),
            Error::IntOutOfRange { .. }
        ));
    }

    #[test]
    fn float_widening() {
        assert_eq!(Value::F32(1.5).coerce::<f64>().unwrap(), 1.5);
        assert_eq!(Value::F64(1.5).coerce::<f64>().unwrap(), 1.5);
        assert!(Value::F64(1.5).coerce::<f32>().is_err());
    }

    #[test]
    fn dynamic_sequence_into_concrete_elements() {
        let v = Value::Array(vec![
            Value::from(1u8),
            Value::from(200u16),
            Value::from(-3i8),
        ]);
        assert_eq!(v.coerce::<Vec<i64>>().unwrap(), vec![1, 200, -3]);
    }

    #[test]
    fn sequence_element_failure_names_index() {
        let v = Value::Array(vec![Value::from(1u8), Value::from("oops")]);
        match v.coerce::<Vec<i64>>().unwrap_err() {
            Error::Element { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::TypeMismatch { .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn optional_indirection_per_element() {
        let v = Value::Array(vec![Value::Null, Value::from(9u8)]);
        assert_eq!(
            v.coerce::<Vec<Option<u8>>>().unwrap(),
            vec![None, Some(9)]
        );
    }

    #[test]
    fn map_values_converted() {
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), Value::from(1u8));
        m.insert("b".to_string(), Value::from(2u8));
        let out: BTreeMap<String, u32> = Value::Map(m).coerce().unwrap();
        assert_eq!(out["a"], 1);
        assert_eq!(out["b"], 2);
    }

    #[test]
    fn mismatch_names_both_shapes() {
        let err = Value::from("text").coerce::<u8>().unwrap_err();
        match err {
            Error::TypeMismatch { expected, found } => {
                assert_eq!(expected, "u8");
                assert_eq!(found, "Str");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
