//! Typed application objects and their opt-in capabilities.
//!
//! Every non-native value travelling through a [`crate::Serializer`] is an
//! [`Object`]: a type-erased `Arc<dyn Typed>`. Capabilities a type wants the
//! dispatch chain to use are advertised through the [`Typed`] trait instead
//! of being probed at runtime:
//!
//! * [`Exportable`] / [`Importable`] is the self-describing protocol: the type
//!   packs and unpacks its own payload.
//! * [`crate::StructuralCodec`] lets the generic object adapter describe the
//!   value as attributes, a sequence or named slots.
//!
//! `#[derive(Typed)]` generates all the glue; the traits can also be
//! implemented by hand for foreign types (see the date/time adapters).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::structure::Structure;
use crate::types::{TypeDescriptor, TypePath};
use crate::value::Value;

/// Object-safe view of a typed application value.
pub trait Typed: Any + Send + Sync + fmt::Debug {
    /// Module and name the value is registered under
    fn type_path(&self) -> TypePath;

    fn as_any(&self) -> &dyn Any;

    /// Structural equality across erased values of possibly different types
    fn eq_typed(&self, other: &dyn Typed) -> bool;

    /// Self-describing export capability, if the type has one
    fn as_exportable(&self) -> Option<&dyn Exportable> {
        None
    }

    /// Structural description used by the generic object adapter
    fn structure(&self) -> Option<Structure> {
        None
    }
}

/// Static identity of a [`Typed`] type.
pub trait Describe: Typed + Sized {
    const MODULE: &'static str;
    const NAME: &'static str;

    fn path() -> TypePath {
        TypePath::new(Self::MODULE, Self::NAME)
    }

    /// Descriptor registered in a [`crate::TypeRegistry`] for this type
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::of::<Self>()
    }
}

/// A type that produces its own wire payload.
pub trait Exportable {
    fn export(&self) -> anyhow::Result<Value>;
}

/// A type that rebuilds itself from the payload its [`Exportable`] produced.
pub trait Importable: Sized {
    fn import(payload: Value) -> anyhow::Result<Self>;
}

/// Type-erased, cheaply clonable handle to a [`Typed`] value.
#[derive(Clone)]
pub struct Object {
    inner: Arc<dyn Typed>,
}

impl Object {
    pub fn new<T: Typed>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    pub fn from_arc(inner: Arc<dyn Typed>) -> Self {
        Self { inner }
    }

    pub fn type_path(&self) -> TypePath {
        self.inner.type_path()
    }

    pub fn qualified_name(&self) -> String {
        self.inner.type_path().qualified_name()
    }

    pub fn as_typed(&self) -> &dyn Typed {
        self.inner.as_ref()
    }

    pub fn is<T: Typed>(&self) -> bool {
        self.inner.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Typed>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Clone the concrete value out of the handle
    pub fn downcast<T: Typed + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.inner.eq_typed(other.inner.as_ref())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object<{}>({:?})", self.inner.type_path(), self.inner)
    }
}

/// Equality helper for [`Typed::eq_typed`] implementations
pub fn eq_downcast<T: Typed + PartialEq>(this: &T, other: &dyn Typed) -> bool {
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| this == other)
}
