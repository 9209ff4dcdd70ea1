//! Importable callables: functions and types travel as `[module, name]`.
//!
//! A callable is only encoded when the serializer's registry resolves its
//! path back to the very same function or type, so anonymous closures and
//! shadowed registrations are refused instead of silently rebinding to
//! something else on decode.

use std::any::Any;
use std::sync::Arc;

use anyhow::anyhow;

use crate::convert::{FromValue, IntoValue};
use crate::error::FromValueError;
use crate::object::{Describe, Object, Typed};
use crate::serializer::Serializer;
use crate::strategy::{pack_fn, unpack_fn};
use crate::structure::Structure;
use crate::types::{Function, Symbol, TypeDescriptor, TypePath, TypeRegistry, BUILTIN_MODULE};
use crate::value::Value;

pub const FUNCTION_NAME: &str = "function";
pub const TYPE_NAME: &str = "type";

/// A function or a type, carried by reference
#[derive(Debug, Clone)]
pub enum Callable {
    Function(Arc<Function>),
    Type(Arc<TypeDescriptor>),
}

impl Callable {
    pub fn function(function: Arc<Function>) -> Self {
        Callable::Function(function)
    }

    pub fn of_type<T: Describe>() -> Self {
        Callable::Type(Arc::new(T::descriptor()))
    }

    /// Path of the referenced function or type
    pub fn target(&self) -> &TypePath {
        match self {
            Callable::Function(function) => function.path(),
            Callable::Type(descriptor) => descriptor.path(),
        }
    }

    /// Invoke a function, or construct a type positionally
    pub fn call(&self, args: Vec<Value>) -> anyhow::Result<Value> {
        match self {
            Callable::Function(function) => function.call(args),
            Callable::Type(descriptor) => match descriptor.build(Structure::Sequence(args)) {
                Some(built) => Ok(built?),
                None => Err(anyhow!("type {} has no structural constructor", descriptor.path())),
            },
        }
    }

    /// Whether `registry` hands back this exact callable for its path
    fn is_resolvable(&self, registry: &dyn TypeRegistry) -> bool {
        match (self, registry.resolve(self.target())) {
            (Callable::Function(ours), Ok(Symbol::Function(found))) => Arc::ptr_eq(ours, &found),
            (Callable::Type(ours), Ok(Symbol::Type(found))) => **ours == *found,
            _ => false,
        }
    }
}

impl From<Symbol> for Callable {
    fn from(symbol: Symbol) -> Self {
        match symbol {
            Symbol::Function(function) => Callable::Function(function),
            Symbol::Type(descriptor) => Callable::Type(descriptor),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => Arc::ptr_eq(a, b),
            (Callable::Type(a), Callable::Type(b)) => a == b,
            _ => false,
        }
    }
}

impl Typed for Callable {
    fn type_path(&self) -> TypePath {
        match self {
            Callable::Function(_) => TypePath::new(BUILTIN_MODULE, FUNCTION_NAME),
            Callable::Type(_) => TypePath::new(BUILTIN_MODULE, TYPE_NAME),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_typed(&self, other: &dyn Typed) -> bool {
        other
            .as_any()
            .downcast_ref::<Callable>()
            .is_some_and(|other| self == other)
    }
}

impl IntoValue for Callable {
    fn into_value(self) -> Value {
        Value::Object(Object::new(self))
    }
}

impl FromValue for Callable {
    fn from_value(value: Value) -> Result<Self, FromValueError> {
        let object = Object::from_value(value)?;
        object
            .downcast::<Callable>()
            .ok_or_else(|| FromValueError::ObjectType {
                expected: "builtins.function".to_string(),
                found: object.qualified_name(),
            })
    }
}

/// Encode a callable as `[module, name]`, declining anything the registry
/// would not resolve back to the same target
pub fn pack_callable(registry: &dyn TypeRegistry, object: &Object) -> anyhow::Result<Option<Value>> {
    let Some(callable) = object.downcast_ref::<Callable>() else {
        return Ok(None);
    };
    if !callable.is_resolvable(registry) {
        return Ok(None);
    }
    let target = callable.target();
    Ok(Some(Value::Array(vec![
        Value::from(target.module()),
        Value::from(target.name()),
    ])))
}

pub fn unpack_callable(registry: &dyn TypeRegistry, payload: Value) -> anyhow::Result<Value> {
    let (module, name) = <(String, String)>::from_value(payload)
        .map_err(|e| anyhow!("callable payload must be [module, name]: {e}"))?;
    let symbol = registry.resolve(&TypePath::new(module, name))?;
    Ok(Callable::from(symbol).into_value())
}

/// Register the function and type strategies, bound to the serializer's registry
pub fn register(serializer: &mut Serializer) {
    for name in [FUNCTION_NAME, TYPE_NAME] {
        let pack_types = serializer.types();
        let unpack_types = serializer.types();
        serializer.register(
            TypePath::new(BUILTIN_MODULE, name).qualified_name(),
            Some(pack_fn(move |object| pack_callable(pack_types.as_ref(), object))),
            Some(unpack_fn(move |payload| {
                unpack_callable(unpack_types.as_ref(), payload)
            })),
        );
    }
}
