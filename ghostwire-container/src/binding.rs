//! Bindings: declarative recipes for building an abstract type.
//!
//! A [`Binding`] says what to hand out when some abstract type is asked
//! for. The construction source is picked in this order:
//!
//! 1. a pre-built `instance`, handed out as-is
//! 2. a `factory` callable, invoked with auto-resolved parameters
//! 3. the `concrete` class, constructed through its constructor
//! 4. the abstract type itself
//!
//! A binding may carry named and qualified sub-bindings. These are flat:
//! a sub-binding's own sub-maps are never consulted.

use std::collections::{BTreeSet, HashMap};

use crate::catalog::Callable;
use crate::key::{Lookup, Selector};
use crate::lifetime::Lifetime;
use crate::object::Object;

/// Immutable construction recipe for one abstract type.
#[derive(Debug, Clone)]
pub struct Binding {
    scope: String,
    abstract_type: String,
    concrete: Option<String>,
    instance: Option<Object>,
    factory: Option<Callable>,
    name_map: HashMap<String, Binding>,
    qualifier_map: HashMap<String, Binding>,
    aliases: BTreeSet<String>,
    shared: bool,
    lazily: bool,
    liminal: bool,
}

impl Binding {
    /// An empty, shared binding with no construction source.
    pub fn new(scope: impl Into<String>, abstract_type: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            abstract_type: abstract_type.into(),
            concrete: None,
            instance: None,
            factory: None,
            name_map: HashMap::new(),
            qualifier_map: HashMap::new(),
            aliases: BTreeSet::new(),
            shared: true,
            lazily: false,
            liminal: false,
        }
    }

    #[inline]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[inline]
    pub fn abstract_type(&self) -> &str {
        &self.abstract_type
    }

    pub fn concrete(&self) -> Option<&str> {
        self.concrete.as_deref()
    }

    pub fn instance(&self) -> Option<&Object> {
        self.instance.as_ref()
    }

    pub fn factory(&self) -> Option<&Callable> {
        self.factory.as_ref()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.aliases.iter().map(String::as_str)
    }

    #[inline]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    #[inline]
    pub fn is_lazy(&self) -> bool {
        self.lazily
    }

    #[inline]
    pub fn is_liminal(&self) -> bool {
        self.liminal
    }

    #[inline]
    pub fn is_bound_to_instance(&self) -> bool {
        self.instance.is_some()
    }

    #[inline]
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// True when the binding has neither instance, factory nor concrete.
    pub fn has_no_source(&self) -> bool {
        self.instance.is_none() && self.factory.is_none() && self.concrete.is_none()
    }

    pub fn lifetime(&self) -> Lifetime {
        Lifetime::of(self.shared, self.liminal)
    }

    /// The class this binding constructs: the concrete if bound, else the
    /// abstract type.
    pub fn target_class(&self) -> &str {
        self.concrete.as_deref().unwrap_or(&self.abstract_type)
    }

    pub fn by_name(&self, name: &str) -> Option<&Binding> {
        self.name_map.get(name)
    }

    pub fn for_qualifier(&self, qualifier: &str) -> Option<&Binding> {
        self.qualifier_map.get(qualifier)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name_map.keys().map(String::as_str)
    }

    pub fn qualifiers(&self) -> impl Iterator<Item = &str> {
        self.qualifier_map.keys().map(String::as_str)
    }

    /// Picks the binding a lookup refers to: `self` for a bare lookup,
    /// otherwise the matching sub-binding.
    pub fn select(&self, lookup: &Lookup) -> Option<&Binding> {
        match lookup.selector() {
            None => Some(self),
            Some(Selector::Name(name)) => self.by_name(name),
            Some(Selector::Qualifier(qualifier)) => self.for_qualifier(qualifier),
        }
    }

    pub(crate) fn insert_named(&mut self, name: String, binding: Binding) {
        self.name_map.insert(name, binding);
    }

    pub(crate) fn insert_qualified(&mut self, qualifier: String, binding: Binding) {
        self.qualifier_map.insert(qualifier, binding);
    }

    pub(crate) fn add_aliases(&mut self, aliases: impl IntoIterator<Item = String>) {
        self.aliases.extend(aliases);
    }
}

/// What a binding points at: a class to construct or a ready instance.
#[derive(Debug, Clone)]
pub enum BindTarget {
    Class(String),
    Instance(Object),
}

impl From<&str> for BindTarget {
    fn from(class: &str) -> Self {
        BindTarget::Class(class.to_string())
    }
}

impl From<String> for BindTarget {
    fn from(class: String) -> Self {
        BindTarget::Class(class)
    }
}

impl From<Object> for BindTarget {
    fn from(instance: Object) -> Self {
        BindTarget::Instance(instance)
    }
}

impl From<&Object> for BindTarget {
    fn from(instance: &Object) -> Self {
        BindTarget::Instance(instance.clone())
    }
}

/// Fluent accumulator for a [`Binding`].
///
/// Nothing is validated here; problems surface when the container
/// resolves the binding.
///
/// # Examples
/// ```
/// use ghostwire_container::binding::BindingBuilder;
///
/// let mut builder = BindingBuilder::new("app", "Cache");
/// builder.to("RedisCache").alias("CacheInterface").lazily();
///
/// let binding = builder.build();
/// assert_eq!(binding.concrete(), Some("RedisCache"));
/// assert!(binding.is_lazy());
/// assert!(binding.is_shared());
/// ```
#[derive(Debug, Clone)]
pub struct BindingBuilder {
    scope: String,
    abstract_type: String,
    target: Option<BindTarget>,
    factory: Option<Callable>,
    name: Option<String>,
    qualifier: Option<String>,
    aliases: Vec<String>,
    shared: bool,
    lazily: bool,
    liminal: bool,
}

impl BindingBuilder {
    pub fn new(scope: impl Into<String>, abstract_type: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            abstract_type: abstract_type.into(),
            target: None,
            factory: None,
            name: None,
            qualifier: None,
            aliases: Vec::new(),
            shared: true,
            lazily: false,
            liminal: false,
        }
    }

    /// Binds to a class name or to a pre-built instance.
    pub fn to(&mut self, target: impl Into<BindTarget>) -> &mut Self {
        self.target = Some(target.into());
        self
    }

    /// Makes this a named sub-binding.
    pub fn named(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Makes this a sub-binding for a qualifier class.
    pub fn qualified_by(&mut self, qualifier: impl Into<String>) -> &mut Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Defers construction until the instance is first touched.
    pub fn lazily(&mut self) -> &mut Self {
        self.lazily = true;
        self
    }

    /// Caches resolutions through a weak handle only.
    pub fn liminal(&mut self) -> &mut Self {
        self.liminal = true;
        self
    }

    /// Adds another type name that resolves to this binding.
    pub fn alias(&mut self, alias: impl Into<String>) -> &mut Self {
        self.aliases.push(alias.into());
        self
    }

    /// Builds through a factory callable.
    pub fn using(&mut self, factory: Callable) -> &mut Self {
        self.factory = Some(factory);
        self
    }

    /// Builds a new instance on every resolution.
    pub fn transient(&mut self) -> &mut Self {
        self.shared = false;
        self
    }

    #[inline]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    #[inline]
    pub fn abstract_type(&self) -> &str {
        &self.abstract_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// True when neither a name nor a qualifier was given.
    pub fn is_base(&self) -> bool {
        self.name.is_none() && self.qualifier.is_none()
    }

    pub(crate) fn take_aliases(&mut self) -> Vec<String> {
        std::mem::take(&mut self.aliases)
    }

    pub fn build(&self) -> Binding {
        let (concrete, instance) = match &self.target {
            Some(BindTarget::Class(class)) => (Some(class.clone()), None),
            Some(BindTarget::Instance(object)) => (None, Some(object.clone())),
            None => (None, None),
        };

        Binding {
            scope: self.scope.clone(),
            abstract_type: self.abstract_type.clone(),
            concrete,
            instance,
            factory: self.factory.clone(),
            name_map: HashMap::new(),
            qualifier_map: HashMap::new(),
            aliases: self.aliases.iter().cloned().collect(),
            shared: self.shared,
            lazily: self.lazily,
            liminal: self.liminal,
        }
    }
}
