//! The serializer: encode/decode walks and the dispatch chain between them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tagpack_common::logging::{Component, Logger, LoggingConfig};

use crate::adapters::{self, ObjectAdapter};
use crate::compaction::CompactionTable;
use crate::convert::FromValue;
use crate::envelope::{ClassTag, Envelope};
use crate::error::{Error, Operation, Result};
use crate::object::{Describe, Object};
use crate::strategy::{pack_fn, unpack_fn, GenericHandler, GenericHook, PackFn, StrategyTable, UnpackFn};
use crate::types::{global_types, Symbol, TypePath, TypeRegistry};
use crate::value::Value;

/// Serializer Configuration
///
/// INTENTION: Describe everything a serializer is built with, so that a
/// configured instance can be reproduced from a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Instance name used as the logging prefix
    pub name: String,

    /// Pre-register the date/time and callable adapters
    pub default_adapters: bool,

    /// Append the generic object adapter to both fallback chains
    pub structural_fallback: bool,

    /// Explicit compaction enumeration; `None` leaves compaction off
    pub compaction: Option<Vec<String>>,

    /// Logging configuration, applied when the serializer is built
    pub logging: Option<LoggingConfig>,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            name: "tagpack".to_string(),
            default_adapters: false,
            structural_fallback: true,
            compaction: None,
            logging: None,
        }
    }
}

impl SerializerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_default_adapters(mut self, enabled: bool) -> Self {
        self.default_adapters = enabled;
        self
    }

    pub fn with_structural_fallback(mut self, enabled: bool) -> Self {
        self.structural_fallback = enabled;
        self
    }

    /// Activate compaction over `names` as soon as the serializer is built
    pub fn with_compaction<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compaction = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_logging_config(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }
}

impl fmt::Display for SerializerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SerializerConfig: name:{} default_adapters:{} structural_fallback:{}",
            self.name, self.default_adapters, self.structural_fallback
        )?;
        if let Some(names) = &self.compaction {
            write!(f, " compaction:{} names", names.len())?;
        }
        Ok(())
    }
}

/// Encodes [`Value`] trees containing typed objects to MessagePack and back.
///
/// Objects are wrapped in envelopes by the encode chain
/// (registered pack → self-describing export → generic handlers → object
/// adapter) and rebuilt by the decode chain (registered unpack → registry
/// lookup → import → generic hooks → object adapter). Strict calls stop
/// after the self-describing step in both directions.
///
/// Configuration takes `&mut self`; once configured a serializer can be
/// shared freely behind an `Arc`.
pub struct Serializer {
    config: SerializerConfig,
    strategies: StrategyTable,
    handlers: Vec<Arc<dyn GenericHandler>>,
    hooks: Vec<Arc<dyn GenericHook>>,
    fallback: Option<ObjectAdapter>,
    compaction: Option<CompactionTable>,
    types: Arc<dyn TypeRegistry>,
    logger: Arc<Logger>,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    /// Serializer without adapters, resolving types through [`global_types`]
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self::with_registry(config, global_types())
    }

    /// Serializer that resolves envelope names only through `types`
    pub fn with_registry(config: SerializerConfig, types: Arc<dyn TypeRegistry>) -> Self {
        let logger = Arc::new(Logger::new_root(Component::Serializer, &config.name));
        if let Some(logging) = &config.logging {
            if let Err(e) = logging.apply() {
                logger.debug(format!("Keeping the installed logger: {e}"));
            }
        }
        logger.debug(format!("Creating serializer with {config}"));

        let mut serializer = Self {
            fallback: config.structural_fallback.then(ObjectAdapter::new),
            config,
            strategies: StrategyTable::new(),
            handlers: Vec::new(),
            hooks: Vec::new(),
            compaction: None,
            types,
            logger,
        };
        if serializer.config.default_adapters {
            adapters::install_defaults(&mut serializer);
        }
        if let Some(names) = serializer.config.compaction.clone() {
            serializer.activate_compaction(Some(names));
        }
        serializer
    }

    pub fn config(&self) -> &SerializerConfig {
        &self.config
    }

    /// Registry used to resolve envelope names on decode
    pub fn types(&self) -> Arc<dyn TypeRegistry> {
        self.types.clone()
    }

    pub fn logger(&self) -> &Arc<Logger> {
        &self.logger
    }

    /// Active compaction table, if any
    pub fn compaction(&self) -> Option<&CompactionTable> {
        self.compaction.as_ref()
    }

    /// Qualified names with a registered strategy, in first-registration order
    pub fn registered_names(&self) -> impl Iterator<Item = &str> {
        self.strategies.names()
    }

    /// Register pack and/or unpack functions for a qualified type name.
    ///
    /// An absent half leaves a previously registered half in place; a present
    /// half replaces it.
    pub fn register(
        &mut self,
        qualified_name: impl Into<String>,
        pack: Option<PackFn>,
        unpack: Option<UnpackFn>,
    ) {
        let qualified_name = qualified_name.into();
        self.logger.debug(format!(
            "Registering strategy for {qualified_name} (pack:{} unpack:{})",
            pack.is_some(),
            unpack.is_some()
        ));
        self.strategies.register(qualified_name, pack, unpack);
    }

    pub fn register_pack(&mut self, qualified_name: impl Into<String>, pack: PackFn) {
        self.register(qualified_name, Some(pack), None);
    }

    pub fn register_unpack(&mut self, qualified_name: impl Into<String>, unpack: UnpackFn) {
        self.register(qualified_name, None, Some(unpack));
    }

    /// Register a typed strategy pair for `T` under its own qualified name
    pub fn register_type_strategy<T, P, U>(&mut self, pack: P, unpack: U)
    where
        T: Describe,
        P: Fn(&T) -> anyhow::Result<Value> + Send + Sync + 'static,
        U: Fn(Value) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let pack = pack_fn(move |object| match object.downcast_ref::<T>() {
            Some(value) => pack(value).map(Some),
            None => Ok(None),
        });
        let unpack = unpack_fn(move |payload| Ok(Value::Object(Object::new(unpack(payload)?))));
        self.register(T::path().qualified_name(), Some(pack), Some(unpack));
    }

    /// Append an encode fallback, tried after the ones already added
    pub fn add_generic_handler(&mut self, handler: Arc<dyn GenericHandler>) {
        self.handlers.push(handler);
        self.logger
            .debug(format!("Added generic handler #{}", self.handlers.len()));
    }

    /// Append a decode fallback, tried after the ones already added
    pub fn add_generic_hook(&mut self, hook: Arc<dyn GenericHook>) {
        self.hooks.push(hook);
        self.logger
            .debug(format!("Added generic hook #{}", self.hooks.len()));
    }

    /// Replace class names on the wire with integer codes.
    ///
    /// Without an explicit enumeration the registered strategy names are
    /// used in their registration order. Both peers must activate the same
    /// enumeration.
    pub fn activate_compaction(&mut self, names: Option<Vec<String>>) {
        let names = names.unwrap_or_else(|| self.strategies.names().map(str::to_string).collect());
        let table = CompactionTable::new(names);
        self.logger
            .with_component(Component::Compaction)
            .info(format!("Tag compaction active with {} names", table.len()));
        self.compaction = Some(table);
    }

    pub fn deactivate_compaction(&mut self) {
        if self.compaction.take().is_some() {
            self.logger
                .with_component(Component::Compaction)
                .info("Tag compaction deactivated");
        }
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        self.encode_with(value, false)
    }

    /// Encode using only registered and self-describing strategies
    pub fn encode_strict(&self, value: &Value) -> Result<Vec<u8>> {
        self.encode_with(value, true)
    }

    pub fn encode_with(&self, value: &Value, strict: bool) -> Result<Vec<u8>> {
        let wire = self.to_wire(value, strict)?;
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &wire).map_err(Error::codec)?;
        Ok(buf)
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        self.decode_with(bytes, false)
    }

    /// Decode using only registered unpack functions and importable types
    pub fn decode_strict(&self, bytes: &[u8]) -> Result<Value> {
        self.decode_with(bytes, true)
    }

    pub fn decode_with(&self, bytes: &[u8], strict: bool) -> Result<Value> {
        let mut reader = bytes;
        let wire = rmpv::decode::read_value(&mut reader).map_err(Error::codec)?;
        if !reader.is_empty() {
            return Err(Error::wire(format!(
                "{} trailing bytes after the encoded value",
                reader.len()
            )));
        }
        self.from_wire(wire, strict)
    }

    /// Decode and convert the result into `T`.
    ///
    /// A failed conversion is reported against what was decoded: the
    /// object's qualified name, or the kind of a native value.
    pub fn decode_as<T: FromValue>(&self, bytes: &[u8]) -> Result<T> {
        let value = self.decode(bytes)?;
        let decoded = match &value {
            Value::Object(object) => object.qualified_name(),
            other => other.kind().to_string(),
        };
        T::from_value(value).map_err(|e| Error::NotDeserializable {
            type_name: decoded,
            reason: format!("conversion to {} failed: {e}", std::any::type_name::<T>()),
            source: Some(Box::new(e)),
        })
    }

    fn to_wire(&self, value: &Value, strict: bool) -> Result<rmpv::Value> {
        Ok(match value {
            Value::Nil => rmpv::Value::Nil,
            Value::Bool(b) => rmpv::Value::Boolean(*b),
            Value::Int(i) => rmpv::Value::from(*i),
            Value::UInt(u) => rmpv::Value::from(*u),
            Value::Float(f) => rmpv::Value::F64(*f),
            Value::Str(s) => rmpv::Value::from(s.as_str()),
            Value::Bytes(b) => rmpv::Value::Binary(b.clone()),
            Value::Array(items) => rmpv::Value::Array(
                items
                    .iter()
                    .map(|item| self.to_wire(item, strict))
                    .collect::<Result<_>>()?,
            ),
            Value::Map(entries) => rmpv::Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((self.to_wire(k, strict)?, self.to_wire(v, strict)?)))
                    .collect::<Result<_>>()?,
            ),
            Value::Ext(tag, data) => rmpv::Value::Ext(*tag, data.clone()),
            Value::Object(object) => self.wrap(object, strict)?,
        })
    }

    /// Turn an object into its (already encoded) envelope
    fn wrap(&self, object: &Object, strict: bool) -> Result<rmpv::Value> {
        let path = object.type_path();
        let qualified = path.qualified_name();
        let payload = self.pack(object, &qualified, strict)?;

        let envelope = match &self.compaction {
            Some(table) => {
                let code = table.code_of(&qualified).ok_or_else(|| {
                    Error::not_serializable(&qualified, "type name is missing from the compaction table")
                })?;
                Envelope::new(ClassTag::Code(code), "", payload)
            }
            None => Envelope::new(ClassTag::Name(path.name().to_string()), path.module(), payload),
        };
        // The payload may itself hold objects
        self.to_wire(&envelope.into_value(), strict)
    }

    fn pack(&self, object: &Object, qualified: &str, strict: bool) -> Result<Value> {
        let failed = |e| Error::strategy_failed(Operation::Encode, qualified, e);

        if let Some(pack) = self.strategies.pack(qualified) {
            if let Some(payload) = pack(object).map_err(failed)? {
                self.logger
                    .debug_args(format_args!("Packed {qualified} with registered strategy"));
                return Ok(payload);
            }
        }
        if let Some(exportable) = object.as_typed().as_exportable() {
            self.logger
                .debug_args(format_args!("Packed {qualified} with its own export"));
            return exportable.export().map_err(failed);
        }
        if strict {
            return Err(Error::not_serializable(
                qualified,
                "no registered or self-describing strategy (strict mode)",
            ));
        }
        let fallback = self.fallback.as_ref().map(|a| a as &dyn GenericHandler);
        let handlers = self
            .handlers
            .iter()
            .map(|h| &**h as &dyn GenericHandler)
            .chain(fallback);
        for (index, handler) in handlers.enumerate() {
            if let Some(payload) = handler.pack(object).map_err(failed)? {
                self.logger
                    .debug_args(format_args!("Packed {qualified} with generic handler #{index}"));
                return Ok(payload);
            }
        }
        Err(Error::not_serializable(qualified, "no strategy accepted the value"))
    }

    fn from_wire(&self, wire: rmpv::Value, strict: bool) -> Result<Value> {
        Ok(match wire {
            rmpv::Value::Nil => Value::Nil,
            rmpv::Value::Boolean(b) => Value::Bool(b),
            rmpv::Value::Integer(i) => match (i.as_i64(), i.as_u64()) {
                (Some(signed), _) => Value::Int(signed),
                (None, Some(unsigned)) => Value::UInt(unsigned),
                (None, None) => return Err(Error::wire(format!("integer {i:?} out of range"))),
            },
            rmpv::Value::F32(f) => Value::Float(f64::from(f)),
            rmpv::Value::F64(f) => Value::Float(f),
            rmpv::Value::String(s) => match s.into_str() {
                Some(s) => Value::Str(s),
                None => return Err(Error::wire("string is not valid UTF-8")),
            },
            rmpv::Value::Binary(b) => Value::Bytes(b),
            rmpv::Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.from_wire(item, strict))
                    .collect::<Result<_>>()?,
            ),
            rmpv::Value::Map(entries) => {
                // Inner envelopes are resolved before the map holding them
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| Ok((self.from_wire(k, strict)?, self.from_wire(v, strict)?)))
                    .collect::<Result<Vec<_>>>()?;
                self.unwrap(entries, strict)?
            }
            rmpv::Value::Ext(tag, data) => Value::Ext(tag, data),
        })
    }

    /// Rebuild the value behind an envelope; any other map passes through
    fn unwrap(&self, entries: Vec<(Value, Value)>, strict: bool) -> Result<Value> {
        let envelope = match Envelope::recognize(entries) {
            Ok(envelope) => envelope,
            Err(entries) => return Ok(Value::Map(entries)),
        };
        let path = self.envelope_path(&envelope)?;
        let qualified = path.qualified_name();
        let payload = envelope.payload;
        let failed = |e| Error::strategy_failed(Operation::Decode, &qualified, e);

        if let Some(unpack) = self.strategies.unpack(&qualified) {
            return unpack(payload).map_err(failed);
        }

        let descriptor = match self.types.resolve(&path) {
            Ok(Symbol::Type(descriptor)) => descriptor,
            Ok(Symbol::Function(_)) => {
                return Err(Error::not_deserializable(
                    &qualified,
                    "name refers to a function, not a type",
                ))
            }
            Err(e) => {
                self.logger
                    .with_component(Component::Registry)
                    .warn(format!("Cannot resolve {qualified}: {e}"));
                return Err(Error::NotDeserializable {
                    type_name: qualified.clone(),
                    reason: e.to_string(),
                    source: Some(Box::new(e)),
                });
            }
        };

        if let Some(import) = descriptor.importer() {
            return import(payload).map_err(failed);
        }
        if strict {
            return Err(Error::not_deserializable(
                &qualified,
                "type is not importable and no unpack is registered (strict mode)",
            ));
        }
        let fallback = self.fallback.as_ref().map(|a| a as &dyn GenericHook);
        let hooks = self
            .hooks
            .iter()
            .map(|h| &**h as &dyn GenericHook)
            .chain(fallback);
        for (index, hook) in hooks.enumerate() {
            if let Some(value) = hook.unpack(&descriptor, &payload).map_err(failed)? {
                self.logger
                    .debug_args(format_args!("Unpacked {qualified} with generic hook #{index}"));
                return Ok(value);
            }
        }
        Err(Error::not_deserializable(&qualified, "no strategy accepted the payload"))
    }

    /// Qualified name an envelope refers to, under the current compaction mode
    fn envelope_path(&self, envelope: &Envelope) -> Result<TypePath> {
        match &self.compaction {
            Some(table) => {
                let name = envelope
                    .class_code()
                    .and_then(|code| table.name_of(code))
                    .ok_or_else(|| {
                        Error::not_deserializable(
                            envelope.describe(),
                            "class tag is not a known compaction code",
                        )
                    })?;
                TypePath::parse(name).ok_or_else(|| {
                    Error::not_deserializable(name, "compacted name is not module-qualified")
                })
            }
            None => match (&envelope.module_tag, &envelope.class_tag) {
                (Value::Str(module), Value::Str(class)) => {
                    Ok(TypePath::new(module.clone(), class.clone()))
                }
                _ => Err(Error::not_deserializable(
                    envelope.describe(),
                    "envelope tags must be strings",
                )),
            },
        }
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("config", &self.config)
            .field("strategies", &self.strategies)
            .field("handlers", &self.handlers.len())
            .field("hooks", &self.hooks.len())
            .field("compaction", &self.compaction)
            .finish()
    }
}
