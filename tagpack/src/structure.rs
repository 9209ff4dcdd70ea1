//! Structural description of plain objects, used by the generic object adapter.

use crate::convert::{FromValue, IntoValue};
use crate::error::FromValueError;
use crate::value::Value;

/// How a value describes its own shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Structure {
    /// Attribute bag. Only usable when it is a map with unique string keys;
    /// anything else is rejected by the adapter rather than coerced.
    Attributes(Value),
    /// Fixed-arity tuple-like value, rebuilt positionally
    Sequence(Vec<Value>),
    /// Fixed set of named slots
    Slots(Fields),
}

/// Ordered, string-keyed fields of an object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a field, replacing an existing one with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl IntoValue) {
        let name = name.into();
        let value = value.into_value();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Remove a field and return its value
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Remove a field and convert it; a missing field is an error
    pub fn take_as<T: FromValue>(&mut self, name: &str) -> Result<T, FromValueError> {
        let value = self
            .take(name)
            .ok_or_else(|| FromValueError::MissingField(name.to_string()))?;
        T::from_value(value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accept a map value whose keys are unique strings
    pub fn from_map(value: Value) -> Result<Self, FromValueError> {
        let Value::Map(entries) = value else {
            return Err(FromValueError::MalformedAttributes);
        };
        let mut fields = Self::with_capacity(entries.len());
        for (key, value) in entries {
            let Value::Str(name) = key else {
                return Err(FromValueError::MalformedAttributes);
            };
            if fields.get(&name).is_some() {
                return Err(FromValueError::MalformedAttributes);
            }
            fields.entries.push((name, value));
        }
        Ok(fields)
    }

    pub fn into_value(self) -> Value {
        Value::Map(
            self.entries
                .into_iter()
                .map(|(n, v)| (Value::Str(n), v))
                .collect(),
        )
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<N: Into<String>, V: IntoValue> FromIterator<(N, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// Describe a value structurally and rebuild it from that description.
///
/// `from_structure` receives whichever variant matches the decoded payload:
/// an array becomes [`Structure::Sequence`], a map becomes
/// [`Structure::Slots`] when [`StructuralCodec::SLOTS`] is declared and
/// [`Structure::Attributes`] otherwise.
pub trait StructuralCodec: Sized {
    /// Declared slot names. Slotted types are rebuilt from `Default` with only
    /// the slots present in the payload assigned.
    const SLOTS: Option<&'static [&'static str]> = None;

    fn to_structure(&self) -> Structure;

    fn from_structure(structure: Structure) -> Result<Self, FromValueError>;
}

/// Split a positional payload into exactly `N` values
pub fn positional<const N: usize>(items: Vec<Value>) -> Result<[Value; N], FromValueError> {
    <[Value; N]>::try_from(items).map_err(|items| FromValueError::Arity {
        expected: N,
        found: items.len(),
    })
}
