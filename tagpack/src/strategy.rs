//! Pack/unpack strategies: the per-name table and the generic chains.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::object::Object;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// Encode half of a strategy. `Ok(None)` declines the value.
pub type PackFn = Arc<dyn Fn(&Object) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Decode half of a strategy: payload in, reconstructed value out.
pub type UnpackFn = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

pub fn pack_fn<F>(f: F) -> PackFn
where
    F: Fn(&Object) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn unpack_fn<F>(f: F) -> UnpackFn
where
    F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Both halves registered for one qualified name; either may be absent.
#[derive(Clone, Default)]
pub struct Strategy {
    pub pack: Option<PackFn>,
    pub unpack: Option<UnpackFn>,
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("pack", &self.pack.is_some())
            .field("unpack", &self.unpack.is_some())
            .finish()
    }
}

/// Qualified name -> strategy, remembering first-registration order.
#[derive(Clone, Default, Debug)]
pub struct StrategyTable {
    entries: HashMap<String, Strategy>,
    order: Vec<String>,
}

impl StrategyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the present halves; absent halves keep what was there before.
    pub fn register(&mut self, name: String, pack: Option<PackFn>, unpack: Option<UnpackFn>) {
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        let entry = self.entries.entry(name).or_default();
        if pack.is_some() {
            entry.pack = pack;
        }
        if unpack.is_some() {
            entry.unpack = unpack;
        }
    }

    pub fn get(&self, name: &str) -> Option<&Strategy> {
        self.entries.get(name)
    }

    pub fn pack(&self, name: &str) -> Option<&PackFn> {
        self.entries.get(name)?.pack.as_ref()
    }

    pub fn unpack(&self, name: &str) -> Option<&UnpackFn> {
        self.entries.get(name)?.unpack.as_ref()
    }

    /// Registered names in first-registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Untyped encode fallback, tried in registration order.
pub trait GenericHandler: Send + Sync {
    /// Produce a payload, or `Ok(None)` to let the next handler try
    fn pack(&self, object: &Object) -> anyhow::Result<Option<Value>>;
}

impl<F> GenericHandler for F
where
    F: Fn(&Object) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    fn pack(&self, object: &Object) -> anyhow::Result<Option<Value>> {
        self(object)
    }
}

/// Untyped decode fallback, tried in registration order.
pub trait GenericHook: Send + Sync {
    /// Rebuild an instance of `descriptor`, or `Ok(None)` to let the next hook try
    fn unpack(&self, descriptor: &TypeDescriptor, payload: &Value)
        -> anyhow::Result<Option<Value>>;
}

impl<F> GenericHook for F
where
    F: Fn(&TypeDescriptor, &Value) -> anyhow::Result<Option<Value>> + Send + Sync,
{
    fn unpack(
        &self,
        descriptor: &TypeDescriptor,
        payload: &Value,
    ) -> anyhow::Result<Option<Value>> {
        self(descriptor, payload)
    }
}
