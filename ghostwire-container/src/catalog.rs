//! Class and function metadata consumed by the container.
//!
//! There is no runtime reflection to ask "what does this constructor
//! take?", so the host application describes its classes up front in a
//! [`Catalog`]: kinds, supertypes, marker attributes, declared properties
//! and methods with their parameters and bodies. Free functions live in
//! the same catalog under their display names.
//!
//! # Examples
//! ```
//! use ghostwire_container::catalog::{Catalog, ClassInfo, Parameter};
//!
//! let catalog = Catalog::new()
//!     .with_class(ClassInfo::interface("Logger"))
//!     .with_class(
//!         ClassInfo::class("FileLogger")
//!             .implements("Logger")
//!             .property("path")
//!             .constructor([Parameter::new("path", "string")], |this, args| {
//!                 this.set("path", args.value("path"))?;
//!                 Ok(())
//!             }),
//!     );
//!
//! assert!(catalog.is_subtype("FileLogger", "Logger"));
//! assert!(catalog.class("Logger").is_ok_and(|class| !class.is_instantiable()));
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, ContainerError, Result};
use crate::object::Object;
use crate::types::TypeDescriptor;
use crate::value::{Arguments, Value};

/// Name of the constructor method.
pub const CONSTRUCTOR: &str = "__construct";

/// Contract implemented by every marker that selects a resolver.
pub const RESOLVABLE: &str = "Resolvable";
/// Contract implemented by qualifier marker classes.
pub const QUALIFIER: &str = "Qualifier";
/// Marker requesting a ghost for a parameter.
pub const GHOST: &str = "Ghost";
/// Marker for ephemeral singletons, on parameters or on classes.
pub const LIMINAL: &str = "Liminal";

/// Body of a method: optional receiver plus collected arguments.
pub type MethodBody =
    Arc<dyn Fn(Option<&Object>, &Arguments) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// Body of a free function.
pub type FunctionBody =
    Arc<dyn Fn(&Arguments) -> std::result::Result<Value, BoxError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Concrete,
    Abstract,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// An attribute attached to a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    /// `#[Named("...")]` picks a named sub-binding.
    Named(String),
    /// An attribute class, e.g. `Ghost` or a qualifier.
    Marker(String),
}

/// A declared parameter of a method or function.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
    pub optional: bool,
    pub default: Option<Value>,
    pub variadic: bool,
    pub attributes: Vec<Attribute>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            optional: false,
            default: None,
            variadic: false,
            attributes: Vec::new(),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, TypeDescriptor::None)
    }

    /// Optional without a default value.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Optional with a default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(value.into());
        self
    }

    pub fn variadic(mut self) -> Self {
        self.optional = true;
        self.variadic = true;
        self
    }

    /// Adds `#[Named(name)]`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(Attribute::Named(name.into()));
        self
    }

    /// Adds a marker attribute such as `Ghost`, `Liminal` or a qualifier class.
    pub fn marker(mut self, class: impl Into<String>) -> Self {
        self.attributes.push(Attribute::Marker(class.into()));
        self
    }

    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().filter_map(|attribute| match attribute {
            Attribute::Marker(class) => Some(class.as_str()),
            Attribute::Named(_) => None,
        })
    }

    pub fn binding_name(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attribute| match attribute {
            Attribute::Named(name) => Some(name.as_str()),
            Attribute::Marker(_) => None,
        })
    }
}

/// A method declared on a class.
#[derive(Clone)]
pub struct MethodInfo {
    name: String,
    visibility: Visibility,
    is_static: bool,
    parameters: Vec<Parameter>,
    body: MethodBody,
}

impl MethodInfo {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(Option<&Object>, &Arguments) -> std::result::Result<Value, BoxError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            parameters: Vec::new(),
            body: Arc::new(body),
        }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn parameters(mut self, parameters: impl IntoIterator<Item = Parameter>) -> Self {
        self.parameters.extend(parameters);
        self
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[inline]
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR
    }

    pub fn declared_parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn call(
        &self,
        receiver: Option<&Object>,
        arguments: &Arguments,
    ) -> std::result::Result<Value, BoxError> {
        (self.body)(receiver, arguments)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Metadata for one class or interface.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    name: String,
    kind: ClassKind,
    supertypes: Vec<String>,
    attributes: Vec<String>,
    properties: Vec<String>,
    methods: HashMap<String, MethodInfo>,
}

impl ClassInfo {
    fn with_kind(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            attributes: Vec::new(),
            properties: Vec::new(),
            methods: HashMap::new(),
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Concrete)
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Abstract)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, ClassKind::Interface)
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.supertypes.push(parent.into());
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.supertypes.push(interface.into());
        self
    }

    /// Class-level marker attribute, e.g. `Liminal`.
    pub fn attribute(mut self, marker: impl Into<String>) -> Self {
        self.attributes.push(marker.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    /// Declares the constructor. The body receives the object under
    /// construction.
    pub fn constructor(
        self,
        parameters: impl IntoIterator<Item = Parameter>,
        body: impl Fn(&Object, &Arguments) -> std::result::Result<(), BoxError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        let method = MethodInfo::new(CONSTRUCTOR, move |this, args| {
            let this = this.ok_or_else(|| BoxError::from("constructor called without a receiver"))?;
            body(this, args).map(|()| Value::Null)
        })
        .parameters(parameters);
        self.method(method)
    }

    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    #[inline]
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Concrete
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Method declared directly on this class.
    pub fn own_method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.get(name)
    }
}

/// A free function registered under a display name.
#[derive(Clone)]
pub struct Callable {
    name: String,
    parameters: Vec<Parameter>,
    body: FunctionBody,
}

impl Callable {
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&Arguments) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), parameters: Vec::new(), body: Arc::new(body) }
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub(crate) fn call(&self, arguments: &Arguments) -> std::result::Result<Value, BoxError> {
        (self.body)(arguments)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Every class and function the container may be asked about.
///
/// [`Catalog::new`] comes preloaded with the built-in contracts
/// (`Resolvable`, `Qualifier`) and markers (`Ghost`, `Liminal`).
#[derive(Debug, Clone)]
pub struct Catalog {
    classes: HashMap<String, ClassInfo>,
    functions: HashMap<String, Callable>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        let mut catalog = Self { classes: HashMap::new(), functions: HashMap::new() };
        catalog.register(ClassInfo::interface(RESOLVABLE));
        catalog.register(ClassInfo::interface(QUALIFIER));
        catalog.register(ClassInfo::class(GHOST).implements(RESOLVABLE));
        catalog.register(ClassInfo::class(LIMINAL).implements(RESOLVABLE));
        catalog
    }

    pub fn with_class(mut self, class: ClassInfo) -> Self {
        self.register(class);
        self
    }

    pub fn with_function(mut self, function: Callable) -> Self {
        self.register_function(function);
        self
    }

    /// Adds or replaces a class.
    pub fn register(&mut self, class: ClassInfo) {
        self.classes.insert(class.name.clone(), class);
    }

    /// Adds or replaces a function.
    pub fn register_function(&mut self, function: Callable) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Looks up a class.
    ///
    /// # Errors
    /// [`ContainerError::InvalidClass`] if the class is unknown.
    pub fn class(&self, name: &str) -> Result<&ClassInfo> {
        self.classes
            .get(name)
            .ok_or_else(|| ContainerError::InvalidClass { class: name.to_string() })
    }

    #[inline]
    pub fn exists(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Reflexive, transitive subtype test over extended and implemented types.
    pub fn is_subtype(&self, class: &str, ancestor: &str) -> bool {
        self.ancestry(class).any(|name| name == ancestor)
    }

    /// `instanceof` for objects.
    pub fn is_instance(&self, object: &Object, class: &str) -> bool {
        self.is_subtype(object.class(), class)
    }

    /// Whether `marker` is attached directly to `class`.
    pub fn has_attribute(&self, class: &str, marker: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|info| info.attributes.iter().any(|a| a == marker))
    }

    /// Finds a method on the class or the nearest supertype declaring it.
    ///
    /// # Errors
    /// [`ContainerError::InvalidClass`] for an unknown class,
    /// [`ContainerError::InvalidMethod`] when no type in the hierarchy
    /// declares the method.
    pub fn method(&self, class: &str, name: &str) -> Result<&MethodInfo> {
        self.class(class)?;
        self.find_method(class, name).ok_or_else(|| ContainerError::InvalidMethod {
            class: class.to_string(),
            method: name.to_string(),
        })
    }

    /// The constructor, inherited if need be.
    pub fn constructor(&self, class: &str) -> Option<&MethodInfo> {
        self.find_method(class, CONSTRUCTOR)
    }

    /// Looks up a free function by display name.
    ///
    /// # Errors
    /// [`ContainerError::InvalidFunction`] if nothing is registered under `name`.
    pub fn function(&self, name: &str) -> Result<&Callable> {
        self.functions
            .get(name)
            .ok_or_else(|| ContainerError::InvalidFunction { function: name.to_string() })
    }

    fn find_method(&self, class: &str, name: &str) -> Option<&MethodInfo> {
        self.ancestry(class)
            .filter_map(|ty| self.classes.get(ty))
            .find_map(|info| info.own_method(name))
    }

    /// Breadth-first walk of `class` and all its supertypes, each once.
    fn ancestry<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut seen: HashSet<&'a str> = HashSet::new();
        let mut queue: VecDeque<&'a str> = VecDeque::from([class]);

        std::iter::from_fn(move || {
            while let Some(current) = queue.pop_front() {
                if !seen.insert(current) {
                    continue;
                }
                if let Some(info) = self.classes.get(current) {
                    queue.extend(info.supertypes.iter().map(String::as_str));
                }
                return Some(current);
            }
            None
        })
    }
}
