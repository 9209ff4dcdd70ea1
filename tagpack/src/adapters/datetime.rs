//! Date/time adapters for `chrono` types.
//!
//! Values travel as fixed-width text so that the encoded form sorts the same
//! way the values do. Decoding accepts exactly the format encoding produces.

use std::any::Any;

use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::convert::{FromValue, IntoValue};
use crate::error::FromValueError;
use crate::object::{eq_downcast, Describe, Object, Typed};
use crate::serializer::Serializer;
use crate::types::TypePath;
use crate::value::Value;

pub const CHRONO_MODULE: &str = "chrono";

/// UTC timestamps: nanosecond precision, `Z` suffix
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";
pub const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

macro_rules! chrono_typed {
    ($ty:ty, $name:literal) => {
        impl Typed for $ty {
            fn type_path(&self) -> TypePath {
                <$ty as Describe>::path()
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn eq_typed(&self, other: &dyn Typed) -> bool {
                eq_downcast(self, other)
            }
        }

        impl Describe for $ty {
            const MODULE: &'static str = CHRONO_MODULE;
            const NAME: &'static str = $name;
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::Object(Object::new(self))
            }
        }

        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, FromValueError> {
                let object = Object::from_value(value)?;
                object
                    .downcast::<$ty>()
                    .ok_or_else(|| FromValueError::ObjectType {
                        expected: <$ty as Describe>::path().qualified_name(),
                        found: object.qualified_name(),
                    })
            }
        }
    };
}

chrono_typed!(DateTime<Utc>, "DateTime");
chrono_typed!(NaiveDateTime, "NaiveDateTime");
chrono_typed!(NaiveDate, "NaiveDate");

fn text(payload: &Value) -> anyhow::Result<&str> {
    payload
        .as_str()
        .ok_or_else(|| anyhow!("expected a date/time string, found {}", payload.kind()))
}

/// Only the exact text encoding would produce is accepted
fn canonical<T>(text: &str, parsed: T, format: impl Fn(&T) -> String) -> anyhow::Result<T> {
    let expected = format(&parsed);
    if expected != text {
        return Err(anyhow!("{text:?} is not in canonical form, expected {expected:?}"));
    }
    Ok(parsed)
}

pub fn pack_datetime(value: &DateTime<Utc>) -> anyhow::Result<Value> {
    Ok(Value::Str(value.format(DATETIME_FORMAT).to_string()))
}

pub fn unpack_datetime(payload: Value) -> anyhow::Result<DateTime<Utc>> {
    let text = text(&payload)?;
    let naive = NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .with_context(|| format!("invalid timestamp {text:?}"))?;
    canonical(text, Utc.from_utc_datetime(&naive), |v| {
        v.format(DATETIME_FORMAT).to_string()
    })
}

pub fn pack_naive_datetime(value: &NaiveDateTime) -> anyhow::Result<Value> {
    Ok(Value::Str(value.format(NAIVE_DATETIME_FORMAT).to_string()))
}

pub fn unpack_naive_datetime(payload: Value) -> anyhow::Result<NaiveDateTime> {
    let text = text(&payload)?;
    let parsed = NaiveDateTime::parse_from_str(text, NAIVE_DATETIME_FORMAT)
        .with_context(|| format!("invalid naive timestamp {text:?}"))?;
    canonical(text, parsed, |v| v.format(NAIVE_DATETIME_FORMAT).to_string())
}

pub fn pack_date(value: &NaiveDate) -> anyhow::Result<Value> {
    Ok(Value::Str(value.format(DATE_FORMAT).to_string()))
}

pub fn unpack_date(payload: Value) -> anyhow::Result<NaiveDate> {
    let text = text(&payload)?;
    let parsed = NaiveDate::parse_from_str(text, DATE_FORMAT)
        .with_context(|| format!("invalid date {text:?}"))?;
    canonical(text, parsed, |v| v.format(DATE_FORMAT).to_string())
}

/// Register all three date/time strategies on `serializer`
pub fn register(serializer: &mut Serializer) {
    serializer.register_type_strategy::<DateTime<Utc>, _, _>(pack_datetime, unpack_datetime);
    serializer.register_type_strategy::<NaiveDateTime, _, _>(pack_naive_datetime, unpack_naive_datetime);
    serializer.register_type_strategy::<NaiveDate, _, _>(pack_date, unpack_date);
}
