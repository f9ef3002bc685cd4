//! # The Container, heart of Ghostwire
//!
//! Turns declared parameter types into constructed object graphs.
//!
//! # Architecture
//! ```text
//! BindingRegistry ─┐
//! Catalog ─────────┼──> ContainerBuilder ──build()──> Container
//! resolver table ──┘                                     │
//!                                  resolve / invoke / call / lazy
//!                                                        │
//!                  Parameter ──> Dependency ──> Resolver ─┘ (recursive)
//! ```
//!
//! # Examples
//! ```rust
//! use ghostwire_container::prelude::*;
//!
//! let catalog = Catalog::new()
//!     .with_class(ClassInfo::interface("Logger"))
//!     .with_class(ClassInfo::class("StdoutLogger").implements("Logger"))
//!     .with_class(
//!         ClassInfo::class("UserService")
//!             .property("logger")
//!             .constructor([Parameter::new("logger", "Logger")], |this, args| {
//!                 this.set("logger", args.value("logger"))?;
//!                 Ok(())
//!             }),
//!     );
//!
//! let mut bindings = BindingCollector::new("app");
//! bindings.bind("Logger").to("StdoutLogger");
//!
//! let container = Container::builder()
//!     .bindings(BindingRegistry::builder().collector(bindings).build()?)
//!     .catalog(catalog)
//!     .with_standard_resolvers()
//!     .build()?;
//!
//! let service = container.resolve("UserService")?;
//! let logger = service.get("logger")?;
//! assert_eq!(logger.type_name(), "StdoutLogger");
//!
//! // Shared binding: the same logger every time.
//! assert!(container.resolve("Logger")?.same(logger.as_object().unwrap()));
//! # Ok::<(), ghostwire_container::ContainerError>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::{debug, info, instrument, trace};

use ghostwire_support::rendering::suggest_similar;

use crate::binding::Binding;
use crate::catalog::{CONSTRUCTOR, Callable, Catalog, GHOST, LIMINAL, MethodInfo, Parameter, RESOLVABLE};
use crate::dependency::Dependency;
use crate::error::{
    BindingNotFoundError, BoxError, ContainerError, InvalidInvocationError, InvalidResolverError,
    MissingBinding, Result,
};
use crate::graph::ResolutionPath;
use crate::key::{Lookup, Selector};
use crate::lifetime::Lifetime;
use crate::object::{Object, WeakObject};
use crate::registry::BindingRegistry;
use crate::resolver::{GenericResolver, GhostResolver, Resolver, ResolverFactory, ResolverSlot};
use crate::value::{Arguments, Value};

/// How many "did you mean" suggestions an error carries at most.
const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

struct ResolverEntry {
    marker: Option<String>,
    slot: ResolverSlot,
    is_default: bool,
}

/// Builds a [`Container`] from bindings, a catalog and a resolver table.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .bindings(registry)
///     .catalog(catalog)
///     .with_standard_resolvers()
///     .build()?;
/// ```
pub struct ContainerBuilder {
    registry: BindingRegistry,
    catalog: Catalog,
    resolvers: Vec<ResolverEntry>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registry: BindingRegistry::default(),
            catalog: Catalog::new(),
            resolvers: Vec::new(),
        }
    }

    pub fn bindings(mut self, registry: BindingRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Registers `R` for parameters carrying `marker`.
    ///
    /// `R` is only constructed when a dependency first needs it.
    pub fn resolver<R: Resolver + Default + 'static>(
        self,
        marker: impl Into<String>,
        is_default: bool,
    ) -> Self {
        let factory: ResolverFactory = Arc::new(|| Ok(Arc::new(R::default()) as Arc<dyn Resolver>));
        self.push_resolver(
            Some(marker.into()),
            ResolverSlot::new(std::any::type_name::<R>(), factory),
            is_default,
        )
    }

    /// Registers a resolver built by `factory` on first use.
    pub fn resolver_with(
        self,
        marker: impl Into<String>,
        name: impl Into<String>,
        factory: impl Fn() -> std::result::Result<Arc<dyn Resolver>, BoxError> + Send + Sync + 'static,
        is_default: bool,
    ) -> Self {
        self.push_resolver(
            Some(marker.into()),
            ResolverSlot::new(name, Arc::new(factory)),
            is_default,
        )
    }

    /// Sets the resolver used for parameters without a registered marker.
    pub fn default_resolver(self, resolver: impl Resolver + 'static) -> Self {
        self.push_resolver(None, ResolverSlot::ready(Arc::new(resolver)), true)
    }

    /// [`GenericResolver`] as the default plus [`GhostResolver`] for `Ghost`.
    pub fn with_standard_resolvers(self) -> Self {
        let generic: ResolverFactory = Arc::new(|| Ok(Arc::new(GenericResolver) as Arc<dyn Resolver>));
        self.push_resolver(None, ResolverSlot::new("GenericResolver", generic), true)
            .resolver::<GhostResolver>(GHOST, false)
    }

    fn push_resolver(mut self, marker: Option<String>, slot: ResolverSlot, is_default: bool) -> Self {
        self.resolvers.push(ResolverEntry { marker, slot, is_default });
        self
    }

    /// Validates the resolver table and builds the container.
    ///
    /// A missing default resolver is not an error here; it surfaces when a
    /// dependency first needs it.
    ///
    /// # Errors
    /// - [`InvalidResolverError::Resolvable`]: a marker that is not a
    ///   class implementing `Resolvable`
    /// - [`InvalidResolverError::MultipleDefaults`]: more than one default
    #[instrument(skip(self), name = "ghostwire::container::build")]
    pub fn build(self) -> Result<Container> {
        info!(
            bindings = self.registry.len(),
            resolvers = self.resolvers.len(),
            "Building container"
        );

        let mut resolvers: HashMap<String, Arc<ResolverSlot>> = HashMap::new();
        let mut default: Option<Arc<ResolverSlot>> = None;

        for entry in self.resolvers {
            if let Some(marker) = &entry.marker {
                if marker == RESOLVABLE || !self.catalog.is_subtype(marker, RESOLVABLE) {
                    return Err(ContainerError::InvalidResolver(InvalidResolverError::Resolvable {
                        marker: marker.clone(),
                    }));
                }
            }

            let slot = Arc::new(entry.slot);
            if entry.is_default {
                if let Some(first) = &default {
                    return Err(ContainerError::InvalidResolver(
                        InvalidResolverError::MultipleDefaults {
                            first: first.name().to_string(),
                            second: slot.name().to_string(),
                        },
                    ));
                }
                default = Some(slot.clone());
            }

            if let Some(marker) = entry.marker {
                debug!(marker = %marker, resolver = slot.name(), "Registered resolver");
                resolvers.insert(marker, slot);
            }
        }

        if default.is_none() {
            debug!("No default resolver configured");
        }

        info!("Container built successfully ✓");
        Ok(Container {
            inner: Arc::new(ContainerInner {
                registry: self.registry,
                catalog: self.catalog,
                resolvers,
                default_resolver: default,
                shared: DashMap::new(),
                named: DashMap::new(),
                qualified: DashMap::new(),
                liminal: DashMap::new(),
                path: ResolutionPath::new(),
            }),
        })
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

struct ContainerInner {
    registry: BindingRegistry,
    catalog: Catalog,
    resolvers: HashMap<String, Arc<ResolverSlot>>,
    default_resolver: Option<Arc<ResolverSlot>>,
    shared: DashMap<String, Object>,
    named: DashMap<(String, String), Object>,
    qualified: DashMap<(String, String), Object>,
    liminal: DashMap<Lookup, WeakObject>,
    path: ResolutionPath,
}

/// The dependency injection container.
///
/// Created by [`ContainerBuilder::build()`]. Cloning is cheap: clones
/// share bindings, resolvers and caches.
///
/// A container may be shared across threads. Cycle detection tracks each
/// thread's construction path on its own, so concurrent resolutions of the
/// same class do not see each other as cycles.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

/// Non-owning handle to a [`Container`], held by lazy objects.
#[derive(Clone)]
pub struct WeakContainer(Weak<ContainerInner>);

impl WeakContainer {
    pub fn upgrade(&self) -> Option<Container> {
        self.0.upgrade().map(|inner| Container { inner })
    }
}

impl fmt::Debug for WeakContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakContainer")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

/// A class-addressed or object-addressed call target.
#[derive(Debug, Clone)]
pub enum Target {
    Class(String),
    Object(Object),
}

impl From<&str> for Target {
    fn from(class: &str) -> Self {
        Target::Class(class.to_string())
    }
}

impl From<String> for Target {
    fn from(class: String) -> Self {
        Target::Class(class)
    }
}

impl From<Object> for Target {
    fn from(object: Object) -> Self {
        Target::Object(object)
    }
}

impl From<&Object> for Target {
    fn from(object: &Object) -> Self {
        Target::Object(object.clone())
    }
}

/// Everything [`Container::resolve_with`] accepts besides the class.
///
/// # Examples
/// ```
/// use ghostwire_container::container::ResolveRequest;
/// use ghostwire_container::key::Lookup;
///
/// let request = ResolveRequest::new(Lookup::qualified("Cache", "Primary"))
///     .argument("ttl", 60)
///     .liminal(true);
/// assert_eq!(request.lookup().qualifier(), Some("Primary"));
/// ```
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    lookup: Lookup,
    arguments: Arguments,
    liminal: bool,
}

impl ResolveRequest {
    pub fn new(lookup: impl Into<Lookup>) -> Self {
        Self { lookup: lookup.into(), arguments: Arguments::new(), liminal: false }
    }

    /// Explicit constructor arguments, used instead of resolving.
    pub fn arguments(mut self, arguments: Arguments) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(name, value);
        self
    }

    /// Cache the result through a weak handle only.
    pub fn liminal(mut self, liminal: bool) -> Self {
        self.liminal = liminal;
        self
    }

    pub fn lookup(&self) -> &Lookup {
        &self.lookup
    }
}

impl Container {
    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.inner.registry
    }

    pub fn downgrade(&self) -> WeakContainer {
        WeakContainer(Arc::downgrade(&self.inner))
    }

    // ── Bindings ──

    /// Finds the binding a lookup refers to.
    ///
    /// A bare lookup without a binding is `Ok(None)`.
    ///
    /// # Errors
    /// [`ContainerError::BindingNotFound`] when a name or qualifier was
    /// given and no matching sub-binding exists.
    pub fn binding(&self, lookup: &Lookup) -> Result<Option<&Binding>> {
        let class = lookup.class();

        let Some(binding) = self.inner.registry.get(class) else {
            if lookup.selector().is_none() {
                return Ok(None);
            }
            let bound = self.inner.registry.bound_types();
            return Err(not_found(class, MissingBinding::Class, suggest_similar(class, &bound, MAX_SUGGESTIONS)));
        };

        if let Some(selected) = binding.select(lookup) {
            return Ok(Some(selected));
        }

        let (missing, available): (MissingBinding, Vec<&str>) = match lookup.selector() {
            Some(Selector::Name(name)) => (MissingBinding::Named(name.clone()), binding.names().collect()),
            Some(Selector::Qualifier(qualifier)) => {
                (MissingBinding::Qualified(qualifier.clone()), binding.qualifiers().collect())
            }
            None => (MissingBinding::Class, Vec::new()),
        };
        let requested = match &missing {
            MissingBinding::Named(requested) | MissingBinding::Qualified(requested) => requested.as_str(),
            MissingBinding::Class => class,
        };
        let suggestions = suggest_similar(requested, &available, MAX_SUGGESTIONS);
        Err(not_found(class, missing, suggestions))
    }

    /// Whether `class` is bound directly or through an alias.
    pub fn bound(&self, class: &str) -> bool {
        self.inner.registry.has(class)
    }

    /// The class a lookup would construct: the binding's target class
    /// (followed through aliases), else the requested class.
    fn true_class(&self, lookup: &Lookup) -> Result<String> {
        Ok(self
            .binding(lookup)?
            .map_or(lookup.class(), Binding::target_class)
            .to_string())
    }

    // ── Caches ──

    /// Whether a live instance for the lookup is cached.
    pub fn has_resolved(&self, lookup: &Lookup) -> Result<bool> {
        Ok(self.get_resolved(lookup)?.is_some())
    }

    /// Returns the cached instance for the lookup, if any.
    ///
    /// The liminal cache is consulted first; a liminal entry whose object
    /// was dropped counts as not resolved.
    pub fn get_resolved(&self, lookup: &Lookup) -> Result<Option<Object>> {
        let key = lookup.with_class(self.true_class(lookup)?);
        Ok(self.cached(&key))
    }

    fn cached(&self, key: &Lookup) -> Option<Object> {
        let live = self.inner.liminal.get(key).map(|weak| weak.upgrade());
        match live {
            Some(Some(instance)) => return Some(instance),
            Some(None) => {
                trace!(key = %key, "Dropping stale liminal entry");
                self.inner.liminal.remove_if(key, |_, weak| !weak.is_alive());
            }
            None => {}
        }

        match key.selector() {
            None => self.inner.shared.get(key.class()).map(|entry| entry.value().clone()),
            Some(Selector::Name(name)) => self
                .inner
                .named
                .get(&(key.class().to_string(), name.clone()))
                .map(|entry| entry.value().clone()),
            Some(Selector::Qualifier(qualifier)) => self
                .inner
                .qualified
                .get(&(key.class().to_string(), qualifier.clone()))
                .map(|entry| entry.value().clone()),
        }
    }

    /// Stores an instance according to its lifetime; returns whichever
    /// instance ends up cached.
    fn store(&self, key: Lookup, instance: Object, lifetime: Lifetime) -> Object {
        if !lifetime.is_cached() {
            return instance;
        }
        if lifetime == Lifetime::Liminal {
            self.inner.liminal.retain(|_, weak| weak.is_alive());
            debug!(key = %key, id = instance.id(), %lifetime, "Stored instance");
            self.inner.liminal.insert(key, instance.downgrade());
            return instance;
        }

        debug!(key = %key, id = instance.id(), %lifetime, "Stored instance");
        let class = key.class().to_string();
        match key.selector() {
            None => self.inner.shared.entry(class).or_insert(instance).value().clone(),
            Some(Selector::Name(name)) => self
                .inner
                .named
                .entry((class, name.clone()))
                .or_insert(instance)
                .value()
                .clone(),
            Some(Selector::Qualifier(qualifier)) => self
                .inner
                .qualified
                .entry((class, qualifier.clone()))
                .or_insert(instance)
                .value()
                .clone(),
        }
    }

    // ── Resolution ──

    /// Resolves `class` without arguments or refinements.
    pub fn resolve(&self, class: &str) -> Result<Object> {
        self.resolve_with(ResolveRequest::new(Lookup::of(class)))
    }

    /// Resolves an instance.
    ///
    /// 1. a cached instance for the true class wins
    /// 2. otherwise the binding's instance, factory or class is used, in
    ///    that order; without a binding the requested class is constructed
    /// 3. shared bindings store the result, liminal ones through a weak
    ///    handle only
    ///
    /// # Errors
    /// - [`ContainerError::BindingNotFound`]: missing named/qualified binding
    /// - [`ContainerError::InvalidClass`]: class unknown to the catalog
    /// - [`ContainerError::NotInstantiable`]: abstract class or interface
    /// - [`ContainerError::CircularDependency`]: class already under construction
    /// - any error from resolving constructor parameters
    pub fn resolve_with(&self, request: ResolveRequest) -> Result<Object> {
        let ResolveRequest { lookup, arguments, mut liminal } = request;
        trace!(lookup = %lookup, "Resolving");

        let binding = self.binding(&lookup)?;
        let true_class = binding
            .map_or(lookup.class(), Binding::target_class)
            .to_string();
        let key = lookup.with_class(&true_class);

        if let Some(instance) = self.cached(&key) {
            trace!(key = %key, id = instance.id(), "Cache hit");
            return Ok(instance);
        }

        let mut lifetime = binding.map_or(Lifetime::Transient, Binding::lifetime);
        let mut provided = None;
        if let Some(binding) = binding {
            if let Some(instance) = binding.instance() {
                provided = Some(instance.clone());
            } else if let Some(factory) = binding.factory() {
                provided = Some(self.call_factory(binding.abstract_type(), factory, &arguments)?);
            }
        }

        let instance = match provided {
            Some(instance) => instance,
            None => {
                let instance = if binding.is_some_and(Binding::is_lazy) {
                    self.ghost(&true_class, arguments)?
                } else {
                    self.instantiate(&true_class, &arguments)?
                };
                liminal = liminal || self.catalog().has_attribute(&true_class, LIMINAL);
                instance
            }
        };

        lifetime = lifetime.with_liminal(liminal);
        Ok(self.store(key, instance, lifetime))
    }

    /// Returns a proxy that resolves `class` in full on first touch.
    ///
    /// Unlike a ghost, the proxy is not the instance: field access and
    /// method calls are forwarded to whatever the resolution returns. A
    /// class without properties is resolved right away.
    pub fn lazy(&self, class: &str) -> Result<Object> {
        let true_class = self.true_class(&Lookup::of(class))?;
        let info = self.catalog().class(&true_class)?;

        if !info.is_instantiable() {
            return Err(ContainerError::NotInstantiable { class: true_class });
        }
        if info.properties().is_empty() {
            return self.resolve(&true_class);
        }

        let container = self.downgrade();
        debug!(class = %true_class, "Created lazy proxy");
        Ok(Object::proxy(true_class, move |proxy: &Object| {
            let container = container
                .upgrade()
                .ok_or_else(|| ContainerError::Detached { class: proxy.class().to_string() })?;
            container.resolve(proxy.class())
        }))
    }

    /// Creates a ghost of `class` whose constructor runs on first touch
    /// with `arguments`.
    pub(crate) fn ghost(&self, class: &str, arguments: Arguments) -> Result<Object> {
        let info = self.catalog().class(class)?;

        if !info.is_instantiable() {
            return Err(ContainerError::NotInstantiable { class: class.to_string() });
        }
        if info.properties().is_empty() {
            return Ok(Object::new(class));
        }

        let container = self.downgrade();
        debug!(class, "Created ghost");
        Ok(Object::ghost(class, move |this: &Object| {
            let container = container
                .upgrade()
                .ok_or_else(|| ContainerError::Detached { class: this.class().to_string() })?;
            if container.catalog().constructor(this.class()).is_some() {
                container.invoke(this, CONSTRUCTOR, arguments.clone())?;
            }
            Ok(())
        }))
    }

    /// Allocates `class` and runs its constructor with collected arguments.
    fn instantiate(&self, class: &str, arguments: &Arguments) -> Result<Object> {
        let info = self.catalog().class(class)?;
        if !info.is_instantiable() {
            return Err(ContainerError::NotInstantiable { class: class.to_string() });
        }

        let _guard = self.inner.path.enter(class)?;
        let object = Object::new(class);

        if let Some(constructor) = self.catalog().constructor(class) {
            if !constructor.is_public() {
                return Err(not_public(class, CONSTRUCTOR));
            }
            let collected = self.collect_dependencies(constructor.declared_parameters(), arguments)?;
            self.call_method(class, constructor, Some(&object), &collected)?;
        }

        debug!(class, id = object.id(), depth = self.inner.path.depth(), "Constructed instance");
        Ok(object)
    }

    fn call_factory(&self, abstract_type: &str, factory: &Callable, arguments: &Arguments) -> Result<Object> {
        match self.call(factory, arguments.clone())? {
            Value::Object(instance) => Ok(instance),
            other => Err(ContainerError::MethodCall {
                class: abstract_type.to_string(),
                method: factory.name().to_string(),
                source: format!("factory produced {} instead of an object", other.type_name()).into(),
            }),
        }
    }

    // ── Invocation ──

    /// Calls `method` on a class or an object.
    ///
    /// - static methods run without a receiver
    /// - a constructor addressed by class builds a fresh instance, bypassing
    ///   the caches
    /// - any other method addressed by class runs on `resolve(class)`
    /// - a constructor addressed by object is only legal while the object
    ///   is a ghost that has not finished initializing
    ///
    /// # Errors
    /// - [`ContainerError::InvalidClass`] / [`ContainerError::InvalidMethod`]
    /// - [`InvalidInvocationError::NotPublic`]
    /// - [`InvalidInvocationError::AlreadyInitialised`]
    /// - [`ContainerError::MethodCall`] when the body fails
    pub fn invoke(&self, target: impl Into<Target>, method: &str, arguments: Arguments) -> Result<Value> {
        match target.into() {
            Target::Class(class) => self.invoke_on_class(&class, method, &arguments),
            Target::Object(object) => self.invoke_on_object(&object, method, &arguments),
        }
    }

    fn invoke_on_class(&self, class: &str, method: &str, arguments: &Arguments) -> Result<Value> {
        let true_class = self.true_class(&Lookup::of(class))?;
        if method == CONSTRUCTOR && !self.catalog().class(&true_class)?.is_instantiable() {
            return Err(ContainerError::NotInstantiable { class: true_class });
        }

        let info = self.catalog().method(&true_class, method)?;
        if !info.is_public() {
            return Err(not_public(&true_class, method));
        }
        if info.is_constructor() {
            return self.instantiate(&true_class, arguments).map(Value::Object);
        }

        let collected = self.collect_dependencies(info.declared_parameters(), arguments)?;
        if info.is_static() {
            return self.call_method(&true_class, info, None, &collected);
        }

        let receiver = self.resolve(class)?.receiver()?;
        self.call_method(&true_class, info, Some(&receiver), &collected)
    }

    fn invoke_on_object(&self, object: &Object, method: &str, arguments: &Arguments) -> Result<Value> {
        let class = object.class();
        let info = self.catalog().method(class, method)?;

        if !info.is_public() {
            return Err(not_public(class, method));
        }
        if info.is_constructor() && !object.accepts_constructor() {
            return Err(ContainerError::InvalidInvocation(
                InvalidInvocationError::AlreadyInitialised { class: class.to_string() },
            ));
        }

        let collected = self.collect_dependencies(info.declared_parameters(), arguments)?;
        if info.is_static() {
            return self.call_method(class, info, None, &collected);
        }

        // A constructor writes into the raw lazy object; everything else
        // goes through initialization or proxy forwarding first.
        let receiver = if info.is_constructor() { object.clone() } else { object.receiver()? };
        self.call_method(class, info, Some(&receiver), &collected)
    }

    fn call_method(
        &self,
        class: &str,
        method: &MethodInfo,
        receiver: Option<&Object>,
        arguments: &Arguments,
    ) -> Result<Value> {
        trace!(class, method = method.name(), "Calling method");
        method.call(receiver, arguments).map_err(|source| ContainerError::MethodCall {
            class: class.to_string(),
            method: method.name().to_string(),
            source,
        })
    }

    /// Calls a free function, resolving every parameter not given in
    /// `arguments`.
    pub fn call(&self, callable: &Callable, arguments: Arguments) -> Result<Value> {
        let collected = self.collect_dependencies(callable.parameters(), &arguments)?;
        trace!(function = callable.name(), "Calling function");
        callable.call(&collected).map_err(|source| ContainerError::FunctionCall {
            function: callable.name().to_string(),
            source,
        })
    }

    /// Calls a function registered in the catalog.
    ///
    /// # Errors
    /// [`ContainerError::InvalidFunction`] if no function has that name.
    pub fn call_function(&self, name: &str, arguments: Arguments) -> Result<Value> {
        let callable = self.catalog().function(name)?;
        self.call(callable, arguments)
    }

    /// Builds the argument list for a call.
    ///
    /// Explicit arguments win by name. A variadic parameter only ever takes
    /// an explicit value and is empty otherwise. Every other parameter is
    /// resolved through its resolver.
    fn collect_dependencies(&self, parameters: &[Parameter], arguments: &Arguments) -> Result<Arguments> {
        let mut collected = Arguments::new();

        for parameter in parameters {
            if let Some(value) = arguments.get(&parameter.name) {
                let value = match value {
                    Value::List(_) => value.clone(),
                    other if parameter.variadic => Value::List(vec![other.clone()]),
                    other => other.clone(),
                };
                collected.insert(parameter.name.clone(), value);
                continue;
            }

            // Variadics come last, nothing after them to resolve.
            if parameter.variadic {
                collected.insert(parameter.name.clone(), Value::List(Vec::new()));
                break;
            }

            let dependency = Dependency::from_parameter(parameter, self.catalog());
            let value = self.resolve_dependency(&dependency)?;
            collected.insert(parameter.name.clone(), value);
        }

        Ok(collected)
    }

    fn resolve_dependency(&self, dependency: &Dependency) -> Result<Value> {
        let slot = dependency
            .resolvable
            .as_deref()
            .and_then(|marker| self.inner.resolvers.get(marker))
            .or(self.inner.default_resolver.as_ref())
            .ok_or(ContainerError::InvalidResolver(InvalidResolverError::NoDefault))?;

        trace!(
            parameter = %dependency.parameter,
            ty = %dependency.ty,
            resolver = slot.name(),
            "Resolving dependency"
        );
        slot.get()?.resolve(dependency, self, &Arguments::new())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.inner.registry.len())
            .field("resolvers", &self.inner.resolvers.len())
            .field("shared", &self.inner.shared.len())
            .field("named", &self.inner.named.len())
            .field("qualified", &self.inner.qualified.len())
            .field("liminal", &self.inner.liminal.len())
            .field("constructing", &self.inner.path.active_threads())
            .finish()
    }
}

fn not_found(class: &str, missing: MissingBinding, suggestions: Vec<String>) -> ContainerError {
    ContainerError::BindingNotFound(BindingNotFoundError {
        class: class.to_string(),
        missing,
        suggestions,
    })
}

fn not_public(class: &str, method: &str) -> ContainerError {
    ContainerError::InvalidInvocation(InvalidInvocationError::NotPublic {
        class: class.to_string(),
        method: method.to_string(),
    })
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ResolveRequest, Target, WeakContainer};
    pub use crate::binding::{Binding, BindingBuilder};
    pub use crate::catalog::{Callable, Catalog, ClassInfo, MethodInfo, Parameter, Visibility};
    pub use crate::error::{ContainerError, Result};
    pub use crate::key::Lookup;
    pub use crate::lazy::LazyState;
    pub use crate::lifetime::Lifetime;
    pub use crate::object::Object;
    pub use crate::provider::{BindingCollector, Provider};
    pub use crate::registry::BindingRegistry;
    pub use crate::resolver::{GenericResolver, GhostResolver, Resolver};
    pub use crate::types::TypeDescriptor;
    pub use crate::value::{Arguments, Value};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use super::*;
    use crate::error::{CircularDependencyError, InvalidInvocationError, InvalidResolverError};
    use crate::fixtures;

    fn container(register: impl FnOnce(&mut BindingCollector)) -> Container {
        let mut bindings = BindingCollector::new("test");
        register(&mut bindings);

        Container::builder()
            .bindings(BindingRegistry::builder().collector(bindings).build().unwrap())
            .catalog(fixtures::catalog())
            .with_standard_resolvers()
            .build()
            .unwrap()
    }

    fn text(value: Value) -> String {
        value.as_str().unwrap_or_default().to_string()
    }

    // ── Resolution ──

    #[test]
    fn unbound_class_is_built_fresh_each_time() {
        let container = container(|_| {});

        let first = container.resolve("FileLogger").unwrap();
        let second = container.resolve("FileLogger").unwrap();

        assert!(!first.same(&second));
        assert_eq!(text(first.get("path").unwrap()), "/var/log/app.log");
        assert!(container.get_resolved(&Lookup::of("FileLogger")).unwrap().is_none());
    }

    #[test]
    fn shared_binding_returns_same_instance() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger");
        });

        let first = container.resolve("Logger").unwrap();
        let second = container.resolve("Logger").unwrap();

        assert_eq!(first.class(), "FileLogger");
        assert!(first.same(&second));
        assert!(container.has_resolved(&Lookup::of("Logger")).unwrap());
    }

    #[test]
    fn transient_binding_returns_new_instances() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger").transient();
        });

        let first = container.resolve("Logger").unwrap();
        let second = container.resolve("Logger").unwrap();
        assert!(!first.same(&second));
    }

    #[test]
    fn interface_without_binding_is_not_instantiable() {
        let container = container(|_| {});

        match container.resolve("Logger") {
            Err(ContainerError::NotInstantiable { class }) => assert_eq!(class, "Logger"),
            other => panic!("Expected NotInstantiable, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_class_is_invalid() {
        let container = container(|_| {});
        assert!(matches!(
            container.resolve("Nope"),
            Err(ContainerError::InvalidClass { .. })
        ));
    }

    #[test]
    fn instance_binding_wins() {
        let cache = Object::new("MemoryCache");
        let container = container(|b| {
            b.bind("Cache").to(&cache);
        });

        assert!(container.resolve("Cache").unwrap().same(&cache));
    }

    #[test]
    fn factory_binding_is_called_once_when_shared() {
        let container = container(|b| {
            b.bind("Cache").using(Callable::new("make_cache", |_| {
                Ok(Object::new("MemoryCache").into())
            }));
        });

        let first = container.resolve("Cache").unwrap();
        assert_eq!(first.class(), "MemoryCache");
        assert!(first.same(&container.resolve("Cache").unwrap()));
    }

    #[test]
    fn factory_returning_a_scalar_fails() {
        let container = container(|b| {
            b.bind("Cache").using(Callable::new("make_cache", |_| Ok(Value::Int(1))));
        });

        match container.resolve("Cache") {
            Err(ContainerError::MethodCall { class, method, .. }) => {
                assert_eq!(class, "Cache");
                assert_eq!(method, "make_cache");
            }
            other => panic!("Expected MethodCall, got: {other:?}"),
        }
    }

    #[test]
    fn explicit_arguments_win() {
        let container = container(|_| {});

        let logger = container
            .resolve_with(ResolveRequest::new("FileLogger").argument("path", "/tmp/app.log"))
            .unwrap();
        assert_eq!(text(logger.get("path").unwrap()), "/tmp/app.log");
    }

    #[test]
    fn constructor_dependencies_are_resolved() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger");
        });

        let service = container.resolve("ConcreteService").unwrap();
        let logger = service.get("logger").unwrap();

        assert_eq!(logger.type_name(), "FileLogger");
        assert!(container.resolve("Logger").unwrap().same(logger.as_object().unwrap()));
    }

    #[test]
    fn alias_resolves_the_aliased_binding() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger").alias("log");
        });

        assert!(container.bound("log"));
        let via_alias = container.resolve("log").unwrap();
        assert!(via_alias.same(&container.resolve("Logger").unwrap()));
    }

    #[test]
    fn alias_to_self_binding_constructs_the_bound_class() {
        let container = container(|b| {
            b.bind("FileLogger").alias("Log");
        });

        let via_alias = container.resolve("Log").unwrap();
        assert_eq!(via_alias.class(), "FileLogger");
        assert!(via_alias.same(&container.resolve("FileLogger").unwrap()));
        assert!(container.has_resolved(&Lookup::of("Log")).unwrap());
    }

    #[test]
    fn named_binding_is_selected() {
        let container = container(|b| {
            b.bind("Cache").to("MemoryCache");
            b.bind("Cache").named("redis").to("RedisCache");
        });

        let redis = container.resolve_with(ResolveRequest::new(Lookup::named("Cache", "redis"))).unwrap();
        assert_eq!(redis.class(), "RedisCache");
        assert_eq!(container.resolve("Cache").unwrap().class(), "MemoryCache");
    }

    #[test]
    fn missing_named_binding_suggests_alternatives() {
        let container = container(|b| {
            b.bind("Cache").named("redis").to("RedisCache");
        });

        match container.resolve_with(ResolveRequest::new(Lookup::named("Cache", "memcached"))) {
            Err(ContainerError::BindingNotFound(err)) => {
                assert_eq!(err.class, "Cache");
                assert_eq!(err.missing, MissingBinding::Named("memcached".into()));
            }
            other => panic!("Expected BindingNotFound, got: {other:?}"),
        }
    }

    #[test]
    fn qualified_binding_is_shared_per_qualifier() {
        let container = container(|b| {
            b.bind("Cache").qualified_by("Primary").to("RedisCache");
        });

        let lookup = Lookup::qualified("Cache", "Primary");
        let first = container.resolve_with(ResolveRequest::new(lookup.clone())).unwrap();
        let second = container.resolve_with(ResolveRequest::new(lookup.clone())).unwrap();

        assert_eq!(first.class(), "RedisCache");
        assert!(first.same(&second));
        assert!(container.get_resolved(&lookup).unwrap().is_some_and(|cached| cached.same(&first)));
    }

    #[test]
    fn cycle_reports_the_chain() {
        let container = container(|_| {});

        match container.resolve("CycleA") {
            Err(ContainerError::CircularDependency(CircularDependencyError { chain })) => {
                assert_eq!(chain, vec!["CycleA", "CycleB", "CycleA"]);
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn nullable_unknown_type_gets_null() {
        let container = container(|_| {});
        let nullable = container.resolve("Nullable").unwrap();
        assert!(nullable.get("cache").unwrap().is_null());
    }

    #[test]
    fn variadic_parameters() {
        let container = container(|_| {});

        let empty = container.resolve("Collection").unwrap();
        assert_eq!(empty.get("items").unwrap(), Value::List(vec![]));

        let single = container
            .resolve_with(ResolveRequest::new("Collection").argument("items", "a"))
            .unwrap();
        assert_eq!(single.get("items").unwrap(), Value::List(vec!["a".into()]));

        let many = container
            .resolve_with(ResolveRequest::new("Collection").argument("items", vec![Value::Int(1), Value::Int(2)]))
            .unwrap();
        assert_eq!(many.get("items").unwrap().as_list().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn liminal_class_is_held_weakly() {
        let container = container(|b| {
            b.bind("RequestContext");
        });
        let lookup = Lookup::of("RequestContext");

        let context = container.resolve("RequestContext").unwrap();
        assert!(container.get_resolved(&lookup).unwrap().is_some_and(|cached| cached.same(&context)));

        drop(context);
        assert!(!container.has_resolved(&lookup).unwrap());
    }

    #[test]
    fn liminal_binding_flag_is_held_weakly() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger").liminal();
        });

        let logger = container.resolve("Logger").unwrap();
        assert!(container.resolve("Logger").unwrap().same(&logger));

        drop(logger);
        assert!(container.get_resolved(&Lookup::of("Logger")).unwrap().is_none());
    }

    #[test]
    fn storing_liminal_sweeps_dead_entries() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger").liminal();
            b.bind("RequestContext");
        });

        drop(container.resolve("Logger").unwrap());
        let context = container.resolve("RequestContext").unwrap();

        assert!(format!("{container:?}").contains("liminal: 1"));
        assert!(container.has_resolved(&Lookup::of("RequestContext")).unwrap());
        drop(context);
    }

    // ── Lazy objects ──

    #[test]
    fn ghost_parameter_defers_construction() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger");
        });

        let report = container.resolve("Report").unwrap();
        let mailer = report.get("mailer").unwrap().into_object().unwrap();

        assert!(mailer.is_ghost());
        assert_eq!(mailer.lazy_state(), Some(LazyState::Uninitialized));

        let sent = container
            .invoke(&mailer, "send", Arguments::new().with("to", "bob@example.com"))
            .unwrap();
        assert_eq!(text(sent), "noreply@example.com -> bob@example.com");
        assert_eq!(mailer.lazy_state(), Some(LazyState::Initialized));
    }

    #[test]
    fn constructor_on_initialized_object_is_rejected() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger").lazily();
        });

        let logger = container.resolve("Logger").unwrap();
        assert!(logger.is_uninitialized());
        logger.initialize().unwrap();

        match container.invoke(&logger, CONSTRUCTOR, Arguments::new()) {
            Err(ContainerError::InvalidInvocation(InvalidInvocationError::AlreadyInitialised { class })) => {
                assert_eq!(class, "FileLogger");
            }
            other => panic!("Expected AlreadyInitialised, got: {other:?}"),
        }

        let plain = Object::new("FileLogger");
        assert!(container.invoke(&plain, CONSTRUCTOR, Arguments::new()).is_err());
    }

    #[test]
    fn lazily_bound_ghost_initializes_on_first_read() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger").lazily();
        });

        let logger = container.resolve("Logger").unwrap();
        assert!(logger.is_ghost());
        assert!(logger.same(&container.resolve("Logger").unwrap()));

        assert_eq!(text(logger.get("path").unwrap()), "/var/log/app.log");
        assert!(logger.is_initialized());
    }

    #[test]
    fn lazy_proxy_forwards_to_the_resolved_instance() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger");
        });

        let proxy = container.lazy("Mailer").unwrap();
        assert!(proxy.is_proxy());
        assert!(proxy.is_uninitialized());

        assert_eq!(text(proxy.get("from").unwrap()), "noreply@example.com");
        assert!(proxy.is_initialized());
    }

    #[test]
    fn lazy_without_properties_resolves_eagerly() {
        let container = container(|_| {});
        let cache = container.lazy("MemoryCache").unwrap();
        assert!(!cache.is_proxy());
    }

    #[test]
    fn lazy_object_outliving_its_container_is_detached() {
        let proxy = container(|_| {}).lazy("FileLogger").unwrap();

        assert!(matches!(proxy.get("path"), Err(ContainerError::Detached { .. })));
        assert!(proxy.is_uninitialized());
    }

    // ── Invocation ──

    #[test]
    fn class_method_runs_on_resolved_instance() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger");
        });

        let logged = container
            .invoke("FileLogger", "log", Arguments::new().with("message", "hi"))
            .unwrap();
        assert_eq!(text(logged), "/var/log/app.log: hi");
    }

    #[test]
    fn static_method_runs_without_resolving() {
        // Mailer itself is not resolvable here: Logger is unbound.
        let container = container(|_| {});
        assert_eq!(text(container.invoke("Mailer", "version", Arguments::new()).unwrap()), "1.0");
    }

    #[test]
    fn private_method_is_rejected() {
        let container = container(|_| {});

        match container.invoke("Mailer", "secret", Arguments::new()) {
            Err(ContainerError::InvalidInvocation(InvalidInvocationError::NotPublic { method, .. })) => {
                assert_eq!(method, "secret");
            }
            other => panic!("Expected NotPublic, got: {other:?}"),
        }
    }

    #[test]
    fn constructor_by_class_builds_a_fresh_instance() {
        let container = container(|b| {
            b.bind("FileLogger");
        });
        let shared = container.resolve("FileLogger").unwrap();

        let fresh = container
            .invoke("FileLogger", CONSTRUCTOR, Arguments::new().with("path", "/tmp/x.log"))
            .unwrap()
            .into_object()
            .unwrap();

        assert!(!fresh.same(&shared));
        assert_eq!(text(fresh.get("path").unwrap()), "/tmp/x.log");
    }

    #[test]
    fn failing_constructor_is_a_method_call_error() {
        let container = container(|_| {});

        match container.resolve("Failing") {
            Err(ContainerError::MethodCall { class, method, source }) => {
                assert_eq!(class, "Failing");
                assert_eq!(method, CONSTRUCTOR);
                assert_eq!(source.to_string(), "boom");
            }
            other => panic!("Expected MethodCall, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_method_is_invalid() {
        let container = container(|_| {});
        assert!(matches!(
            container.invoke("FileLogger", "flush", Arguments::new()),
            Err(ContainerError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn functions_get_defaults_and_explicit_arguments() {
        let container = container(|_| {});

        assert_eq!(text(container.call_function("greet", Arguments::new()).unwrap()), "Hello, world!");
        assert_eq!(
            text(container.call_function("greet", Arguments::new().with("name", "Ada")).unwrap()),
            "Hello, Ada!"
        );
        assert!(matches!(
            container.call_function("farewell", Arguments::new()),
            Err(ContainerError::InvalidFunction { .. })
        ));
    }

    #[test]
    fn failing_function_is_a_function_call_error() {
        let container = container(|_| {});
        let broken = Callable::new("broken", |_| Err("nope".into()));

        match container.call(&broken, Arguments::new()) {
            Err(ContainerError::FunctionCall { function, .. }) => assert_eq!(function, "broken"),
            other => panic!("Expected FunctionCall, got: {other:?}"),
        }
    }

    // ── Resolver table ──

    #[test]
    fn marker_must_implement_resolvable() {
        let result = Container::builder()
            .catalog(fixtures::catalog())
            .resolver::<GhostResolver>("Mailer", false)
            .build();

        match result {
            Err(ContainerError::InvalidResolver(InvalidResolverError::Resolvable { marker })) => {
                assert_eq!(marker, "Mailer");
            }
            other => panic!("Expected Resolvable error, got: {other:?}"),
        }
    }

    #[test]
    fn only_one_default_resolver() {
        let result = Container::builder()
            .catalog(fixtures::catalog())
            .with_standard_resolvers()
            .default_resolver(GenericResolver)
            .build();

        assert!(matches!(
            result,
            Err(ContainerError::InvalidResolver(InvalidResolverError::MultipleDefaults { .. }))
        ));
    }

    #[test]
    fn missing_default_resolver_surfaces_on_use() {
        let container = Container::builder().catalog(fixtures::catalog()).build().unwrap();

        assert!(container.resolve("MemoryCache").is_ok());
        assert!(matches!(
            container.resolve("FileLogger"),
            Err(ContainerError::InvalidResolver(InvalidResolverError::NoDefault))
        ));
    }

    #[test]
    fn failing_resolver_factory_is_reported() {
        let container = Container::builder()
            .catalog(fixtures::catalog())
            .default_resolver(GenericResolver)
            .resolver_with(GHOST, "broken", || Err("misconfigured".into()), false)
            .build()
            .unwrap();

        match container.resolve("Report") {
            Err(ContainerError::InvalidResolver(InvalidResolverError::Resolver { resolver, .. })) => {
                assert_eq!(resolver, "broken");
            }
            other => panic!("Expected Resolver error, got: {other:?}"),
        }
    }

    #[test]
    fn debug_shows_counts() {
        let container = container(|b| {
            b.bind("Logger").to("FileLogger");
        });
        container.resolve("Logger").unwrap();

        let debug = format!("{container:?}");
        assert!(debug.contains("bindings: 1"));
        assert!(debug.contains("shared: 1"));
    }
}
