//! Typed envelopes over MessagePack
//!
//! This crate provides:
//! - A value model with a typed-object leaf ([`Value::Object`])
//! - An open dispatch chain of pack/unpack strategies, tried in a fixed order
//! - A type registry the decoder resolves envelope names through
//! - Optional tag compaction (integer class codes on the wire)
//! - Generic structural, date/time and callable adapters
//! - `#[derive(Typed)]` to make application types serializable

extern crate self as tagpack;

pub mod adapters;
pub mod compaction;
pub mod convert;
pub mod envelope;
pub mod error;
pub mod facade;
pub mod object;
pub mod serializer;
pub mod strategy;
pub mod structure;
pub mod types;
pub mod value;

pub use adapters::{Callable, ObjectAdapter};
pub use compaction::CompactionTable;
pub use convert::{Blob, FromValue, IntoValue};
pub use envelope::{ClassTag, Envelope, CLASS_KEY, DATA_KEY, MODULE_KEY};
pub use error::{Error, FromValueError, LookupError, Operation, Result};
pub use facade::*;
pub use object::{eq_downcast, Describe, Exportable, Importable, Object, Typed};
pub use serializer::{Serializer, SerializerConfig};
pub use strategy::{pack_fn, unpack_fn, GenericHandler, GenericHook, PackFn, Strategy, StrategyTable, UnpackFn};
pub use structure::{positional, Fields, StructuralCodec, Structure};
pub use types::{global_types, Function, Symbol, TypeDescriptor, TypePath, TypeRegistry, TypeTable, BUILTIN_MODULE};
pub use value::Value;

// Re-export the derive macro
pub use tagpack_macros::Typed;
