//! Process-wide default serializer.
//!
//! The default instance has the date/time and callable adapters installed
//! and resolves types through [`global_types`]. Registration calls take the
//! write lock; encode and decode share the read lock. Reads are recursive so
//! a strategy may call back into the facade while a writer is queued.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tagpack_common::logging::Component;

use crate::error::Result;
use crate::object::Describe;
use crate::serializer::{Serializer, SerializerConfig};
use crate::strategy::{GenericHandler, GenericHook, PackFn, UnpackFn};
use crate::types::{global_types, Function};
use crate::value::Value;

static DEFAULT: Lazy<RwLock<Serializer>> = Lazy::new(|| {
    let config = SerializerConfig::new("default").with_default_adapters(true);
    let serializer = Serializer::with_config(config);
    serializer
        .logger()
        .with_component(Component::Facade)
        .debug("Default serializer initialized");
    RwLock::new(serializer)
});

/// Run `f` with shared access to the default serializer
pub fn with_default<R>(f: impl FnOnce(&Serializer) -> R) -> R {
    f(&*DEFAULT.read_recursive())
}

/// Run `f` with exclusive access to the default serializer
pub fn configure<R>(f: impl FnOnce(&mut Serializer) -> R) -> R {
    f(&mut *DEFAULT.write())
}

pub fn encode(value: &Value) -> Result<Vec<u8>> {
    DEFAULT.read_recursive().encode(value)
}

pub fn encode_strict(value: &Value) -> Result<Vec<u8>> {
    DEFAULT.read_recursive().encode_strict(value)
}

pub fn decode(bytes: &[u8]) -> Result<Value> {
    DEFAULT.read_recursive().decode(bytes)
}

pub fn decode_strict(bytes: &[u8]) -> Result<Value> {
    DEFAULT.read_recursive().decode_strict(bytes)
}

pub fn register(qualified_name: impl Into<String>, pack: Option<PackFn>, unpack: Option<UnpackFn>) {
    DEFAULT.write().register(qualified_name, pack, unpack);
}

pub fn add_generic_handler(handler: Arc<dyn GenericHandler>) {
    DEFAULT.write().add_generic_handler(handler);
}

pub fn add_generic_hook(hook: Arc<dyn GenericHook>) {
    DEFAULT.write().add_generic_hook(hook);
}

pub fn activate_compaction(names: Option<Vec<String>>) {
    DEFAULT.write().activate_compaction(names);
}

pub fn deactivate_compaction() {
    DEFAULT.write().deactivate_compaction();
}

/// Make `T` resolvable by the default serializer
pub fn register_type<T: Describe>() {
    global_types().register_type::<T>();
}

/// Make `function` resolvable, and therefore encodable as a callable
pub fn register_function(function: Arc<Function>) {
    global_types().register_function(function);
}
