use std::fmt;

use thiserror::Error;

/// Direction of the call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Encode => f.write_str("encode"),
            Operation::Decode => f.write_str("decode"),
        }
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by [`crate::Serializer`]
#[derive(Error, Debug)]
pub enum Error {
    /// No encode strategy produced a payload, or the chosen one failed
    #[error("encode: object of type {type_name} is not serializable: {reason}")]
    NotSerializable {
        type_name: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The envelope could not be resolved back into a value
    #[error("decode: object of type {type_name} is not deserializable: {reason}")]
    NotDeserializable {
        type_name: String,
        reason: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The MessagePack codec rejected the input or output
    #[error("wire: {reason}")]
    Wire {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl Error {
    pub fn not_serializable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NotSerializable {
            type_name: type_name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn not_deserializable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NotDeserializable {
            type_name: type_name.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Malformed wire data with no underlying codec error
    pub fn wire(reason: impl Into<String>) -> Self {
        Error::Wire {
            reason: reason.into(),
            source: None,
        }
    }

    /// The MessagePack codec itself failed
    pub(crate) fn codec<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Wire {
            reason: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// A strategy accepted the value and then failed
    pub(crate) fn strategy_failed(
        operation: Operation,
        type_name: impl Into<String>,
        cause: anyhow::Error,
    ) -> Self {
        let type_name = type_name.into();
        let reason = format!("{operation} strategy failed: {cause:#}");
        let source = Some(cause.into());
        match operation {
            Operation::Encode => Error::NotSerializable {
                type_name,
                reason,
                source,
            },
            Operation::Decode => Error::NotDeserializable {
                type_name,
                reason,
                source,
            },
        }
    }

    /// Qualified type name the error refers to, when there is one
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Error::NotSerializable { type_name, .. } | Error::NotDeserializable { type_name, .. } => {
                Some(type_name)
            }
            Error::Wire { .. } => None,
        }
    }

    pub fn is_not_serializable(&self) -> bool {
        matches!(self, Error::NotSerializable { .. })
    }

    pub fn is_not_deserializable(&self) -> bool {
        matches!(self, Error::NotDeserializable { .. })
    }

    pub fn is_wire(&self) -> bool {
        matches!(self, Error::Wire { .. })
    }
}

/// Result type for tagpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to convert a [`crate::Value`] into a Rust type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FromValueError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("integer {0} out of range for {1}")]
    OutOfRange(String, &'static str),

    #[error("expected object of type {expected}, found {found}")]
    ObjectType { expected: String, found: String },

    #[error("missing field {0}")]
    MissingField(String),

    #[error("unknown slot {0}")]
    UnknownSlot(String),

    #[error("expected {expected} positional values, found {found}")]
    Arity { expected: usize, found: usize },

    #[error("attribute bag is not a string-keyed mapping")]
    MalformedAttributes,
}

/// Failure to resolve a qualified name in a [`crate::TypeRegistry`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("no module named {0}")]
    ModuleNotFound(String),

    #[error("module {module} has no attribute {name}")]
    NameNotFound { module: String, name: String },
}
