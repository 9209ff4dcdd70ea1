//! Type registry: resolves qualified names to types and functions.
//!
//! Decoding an envelope that has no explicitly registered unpack strategy
//! asks a [`TypeRegistry`] for the symbol behind the envelope's qualified
//! name. This is the trust boundary of the crate: only what was registered
//! can ever be constructed from wire data, so a restricted [`TypeTable`] is
//! the way to limit what untrusted input can reach.

use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::{FromValueError, LookupError};
use crate::object::{Describe, Importable, Object};
use crate::structure::{StructuralCodec, Structure};
use crate::value::Value;

/// Module that built-in values live in; the generic object adapter never
/// handles it.
pub const BUILTIN_MODULE: &str = "builtins";

/// `module` + `name` pair identifying a type or function.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypePath {
    module: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl TypePath {
    pub fn new(module: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Split a qualified name on its last `.`
    pub fn parse(qualified: &str) -> Option<Self> {
        let (module, name) = qualified.rsplit_once('.')?;
        if module.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(module.to_string(), name.to_string()))
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    pub fn is_builtin(&self) -> bool {
        self.module == BUILTIN_MODULE
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

/// Rebuilds a value from the payload produced by its [`crate::Exportable`]
pub type ImportFn = fn(Value) -> anyhow::Result<Value>;

/// Rebuilds a value from a structural description
pub type BuildFn = fn(Structure) -> Result<Value, FromValueError>;

/// What a registry knows about one type.
#[derive(Clone)]
pub struct TypeDescriptor {
    path: TypePath,
    type_id: TypeId,
    import: Option<ImportFn>,
    build: Option<BuildFn>,
    slots: Option<&'static [&'static str]>,
}

impl TypeDescriptor {
    /// Descriptor with no capabilities; add them with the `with_*` builders
    pub fn of<T: Describe>() -> Self {
        Self {
            path: T::path(),
            type_id: TypeId::of::<T>(),
            import: None,
            build: None,
            slots: None,
        }
    }

    pub fn with_import<T: Describe + Importable>(mut self) -> Self {
        // Mono-morphise a concrete import function and store it.
        fn import_impl<T: Describe + Importable>(payload: Value) -> anyhow::Result<Value> {
            Ok(Value::Object(Object::new(T::import(payload)?)))
        }

        self.import = Some(import_impl::<T> as ImportFn);
        self
    }

    pub fn with_structure<T: Describe + StructuralCodec>(mut self) -> Self {
        fn build_impl<T: Describe + StructuralCodec>(
            structure: Structure,
        ) -> Result<Value, FromValueError> {
            Ok(Value::Object(Object::new(T::from_structure(structure)?)))
        }

        self.build = Some(build_impl::<T> as BuildFn);
        self.slots = T::SLOTS;
        self
    }

    pub fn path(&self) -> &TypePath {
        &self.path
    }

    pub fn qualified_name(&self) -> String {
        self.path.qualified_name()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn slots(&self) -> Option<&'static [&'static str]> {
        self.slots
    }

    pub fn is_importable(&self) -> bool {
        self.import.is_some()
    }

    pub fn is_structural(&self) -> bool {
        self.build.is_some()
    }

    /// The import capability, if the type has one
    pub fn importer(&self) -> Option<ImportFn> {
        self.import
    }

    /// Run the structural constructor; `None` when the type has none
    pub fn build(&self, structure: Structure) -> Option<Result<Value, FromValueError>> {
        self.build.map(|build| build(structure))
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("path", &self.path)
            .field("import", &self.import.is_some())
            .field("build", &self.build.is_some())
            .field("slots", &self.slots)
            .finish()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.type_id == other.type_id
    }
}

type FunctionBody = dyn Fn(Vec<Value>) -> anyhow::Result<Value> + Send + Sync;

/// A named function that can be looked up by its path.
pub struct Function {
    path: TypePath,
    body: Box<FunctionBody>,
}

impl Function {
    pub fn new<F>(
        module: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        body: F,
    ) -> Arc<Self>
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Arc::new(Self {
            path: TypePath::new(module, name),
            body: Box::new(body),
        })
    }

    /// An anonymous function local to `module`; never resolvable by name
    pub fn closure<F>(module: impl Into<Cow<'static, str>>, body: F) -> Arc<Self>
    where
        F: Fn(Vec<Value>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self::new(module, "<closure>", body)
    }

    pub fn path(&self) -> &TypePath {
        &self.path
    }

    pub fn call(&self, args: Vec<Value>) -> anyhow::Result<Value> {
        (self.body)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.path)
    }
}

/// Anything a registry can hand back for a qualified name
#[derive(Clone, Debug)]
pub enum Symbol {
    Type(Arc<TypeDescriptor>),
    Function(Arc<Function>),
}

impl Symbol {
    pub fn path(&self) -> &TypePath {
        match self {
            Symbol::Type(descriptor) => descriptor.path(),
            Symbol::Function(function) => function.path(),
        }
    }
}

/// Resolves qualified names to symbols.
pub trait TypeRegistry: Send + Sync {
    fn resolve(&self, path: &TypePath) -> Result<Symbol, LookupError>;
}

/// Concurrent registry of types and functions.
#[derive(Default)]
pub struct TypeTable {
    symbols: DashMap<TypePath, Symbol>,
    /// Module name -> number of symbols registered under it
    modules: DashMap<String, usize>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` using its own [`Describe::descriptor`]
    pub fn register_type<T: Describe>(&self) {
        self.register_descriptor(T::descriptor());
    }

    pub fn register_descriptor(&self, descriptor: TypeDescriptor) {
        self.insert(Symbol::Type(Arc::new(descriptor)));
    }

    pub fn register_function(&self, function: Arc<Function>) {
        self.insert(Symbol::Function(function));
    }

    fn insert(&self, symbol: Symbol) {
        let path = symbol.path().clone();
        if self.symbols.insert(path.clone(), symbol).is_none() {
            *self.modules.entry(path.module().to_string()).or_insert(0) += 1;
        }
    }

    pub fn contains(&self, path: &TypePath) -> bool {
        self.symbols.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl TypeRegistry for TypeTable {
    fn resolve(&self, path: &TypePath) -> Result<Symbol, LookupError> {
        if let Some(symbol) = self.symbols.get(path) {
            return Ok(symbol.value().clone());
        }
        if self.modules.contains_key(path.module()) {
            Err(LookupError::NameNotFound {
                module: path.module().to_string(),
                name: path.name().to_string(),
            })
        } else {
            Err(LookupError::ModuleNotFound(path.module().to_string()))
        }
    }
}

impl<R: TypeRegistry + ?Sized> TypeRegistry for Arc<R> {
    fn resolve(&self, path: &TypePath) -> Result<Symbol, LookupError> {
        self.as_ref().resolve(path)
    }
}

/// Global, thread-safe table used by serializers built without an explicit registry.
static GLOBAL_TYPES: Lazy<Arc<TypeTable>> = Lazy::new(|| Arc::new(TypeTable::new()));

pub fn global_types() -> Arc<TypeTable> {
    GLOBAL_TYPES.clone()
}
