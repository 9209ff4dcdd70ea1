//! Generic object adapter: the structural fallback at the end of both chains.

use crate::object::Object;
use crate::strategy::{GenericHandler, GenericHook};
use crate::structure::{Fields, Structure};
use crate::types::TypeDescriptor;
use crate::value::Value;

/// Packs any [`crate::StructuralCodec`] value by its structure and rebuilds
/// it through the descriptor's structural constructor.
///
/// Built-in values are never handled here, so functions and types that the
/// callable adapter declines end up not serializable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjectAdapter;

impl ObjectAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl GenericHandler for ObjectAdapter {
    fn pack(&self, object: &Object) -> anyhow::Result<Option<Value>> {
        if object.type_path().is_builtin() {
            return Ok(None);
        }
        let payload = match object.as_typed().structure() {
            // A bag that is not a string-keyed map is declined, not coerced
            Some(Structure::Attributes(bag)) => Fields::from_map(bag).ok().map(Fields::into_value),
            Some(Structure::Sequence(items)) => Some(Value::Array(items)),
            Some(Structure::Slots(fields)) => Some(fields.into_value()),
            None => None,
        };
        Ok(payload)
    }
}

impl GenericHook for ObjectAdapter {
    fn unpack(
        &self,
        descriptor: &TypeDescriptor,
        payload: &Value,
    ) -> anyhow::Result<Option<Value>> {
        if !descriptor.is_structural() || descriptor.path().is_builtin() {
            return Ok(None);
        }
        let structure = match payload {
            Value::Array(items) => Structure::Sequence(items.clone()),
            Value::Map(_) if descriptor.slots().is_some() => match Fields::from_map(payload.clone()) {
                Ok(fields) => Structure::Slots(fields),
                Err(_) => return Ok(None),
            },
            Value::Map(_) => Structure::Attributes(payload.clone()),
            _ => return Ok(None),
        };
        match descriptor.build(structure) {
            Some(built) => Ok(Some(built?)),
            None => Ok(None),
        }
    }
}
