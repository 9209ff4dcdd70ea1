//! Conversions between Rust types and [`Value`].
//!
//! `#[derive(Typed)]` implements both traits for application types, wrapping
//! them in [`Value::Object`].

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::FromValueError;
use crate::object::Object;
use crate::value::Value;

pub trait IntoValue {
    fn into_value(self) -> Value;
}

pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, FromValueError>;
}

fn mismatch<T>(expected: &'static str, found: &Value) -> Result<T, FromValueError> {
    Err(FromValueError::Mismatch {
        expected,
        found: found.kind(),
    })
}

/// Raw MessagePack binary, as opposed to an array of small integers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blob(pub Vec<u8>);

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        Ok(value)
    }
}

impl IntoValue for Object {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl FromValue for Object {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Object(object) => Ok(object),
            other => mismatch("object", &other),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch("bool", &other),
        }
    }
}

macro_rules! integer_conversions {
    ($($t:ty),*) => {$(
        impl IntoValue for $t {
            fn into_value(self) -> Value {
                Value::from(self)
            }
        }

        impl FromValue for $t {
            fn from_value(value: Value) -> Result<Self, FromValueError> {
                match value {
                    Value::Int(i) => <$t>::try_from(i)
                        .map_err(|_| FromValueError::OutOfRange(i.to_string(), stringify!($t))),
                    Value::UInt(u) => <$t>::try_from(u)
                        .map_err(|_| FromValueError::OutOfRange(u.to_string(), stringify!($t))),
                    other => mismatch("integer", &other),
                }
            }
        }
    )*};
}

integer_conversions!(i8, i16, i32, i64, u8, u16, u32, u64);

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => mismatch("float", &other),
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        f64::from_value(value).map(|f| f as f32)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Str(s) => Ok(s),
            other => mismatch("string", &other),
        }
    }
}

impl IntoValue for Blob {
    fn into_value(self) -> Value {
        Value::Bytes(self.0)
    }
}

impl FromValue for Blob {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Bytes(b) => Ok(Blob(b)),
            other => mismatch("bytes", &other),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Nil,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Nil => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            other => mismatch("array", &other),
        }
    }
}

impl<T: IntoValue, S: BuildHasher> IntoValue for HashMap<String, T, S> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (Value::Str(k), v.into_value()))
                .collect(),
        )
    }
}

impl<T: FromValue, S: BuildHasher + Default> FromValue for HashMap<String, T, S> {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        string_keyed(value)?
            .map(|entry| entry.and_then(|(k, v)| Ok((k, T::from_value(v)?))))
            .collect()
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Map(
            self.into_iter()
                .map(|(k, v)| (Value::Str(k), v.into_value()))
                .collect(),
        )
    }
}

impl<T: FromValue> FromValue for BTreeMap<String, T> {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        string_keyed(value)?
            .map(|entry| entry.and_then(|(k, v)| Ok((k, T::from_value(v)?))))
            .collect()
    }
}

fn string_keyed(
    value: Value,
) -> Result<impl Iterator<Item = Result<(String, Value), FromValueError>>, FromValueError> {
    match value {
        Value::Map(entries) => Ok(entries.into_iter().map(|(k, v)| match k {
            Value::Str(k) => Ok((k, v)),
            other => mismatch("string key", &other),
        })),
        other => mismatch("map", &other),
    }
}

impl<A: IntoValue, B: IntoValue> IntoValue for (A, B) {
    fn into_value(self) -> Value {
        Value::Array(vec![self.0.into_value(), self.1.into_value()])
    }
}

impl<A: FromValue, B: FromValue> FromValue for (A, B) {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Array(items) => {
                let [a, b] = crate::structure::positional::<2>(items)?;
                Ok((A::from_value(a)?, B::from_value(b)?))
            }
            other => mismatch("array", &other),
        }
    }
}

impl<A: IntoValue, B: IntoValue, C: IntoValue> IntoValue for (A, B, C) {
    fn into_value(self) -> Value {
        Value::Array(vec![
            self.0.into_value(),
            self.1.into_value(),
            self.2.into_value(),
        ])
    }
}

impl<A: FromValue, B: FromValue, C: FromValue> FromValue for (A, B, C) {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        match value {
            Value::Array(items) => {
                let [a, b, c] = crate::structure::positional::<3>(items)?;
                Ok((A::from_value(a)?, B::from_value(b)?, C::from_value(c)?))
            }
            other => mismatch("array", &other),
        }
    }
}
