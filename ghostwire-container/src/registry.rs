//! Binding registry: the immutable index the container resolves from.
//!
//! Built once, from bindings keyed by abstract type. Bindings grouped by
//! scope and the flattened alias map are derived at construction time;
//! afterwards the registry is read-only.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument, trace, warn};

use crate::binding::{Binding, BindingBuilder};
use crate::error::{ContainerError, DuplicateBindingError, Result};
use crate::key::Lookup;
use crate::provider::{BindingCollector, Provider};

/// Index of bindings by abstract type, with alias indirection.
///
/// # Examples
/// ```
/// use ghostwire_container::binding::BindingBuilder;
/// use ghostwire_container::registry::BindingRegistry;
///
/// let mut cache = BindingBuilder::new("app", "Cache");
/// cache.to("RedisCache").alias("Store");
///
/// let registry: BindingRegistry = [cache.build()].into_iter().collect();
/// assert!(registry.has("Store"));
/// assert_eq!(registry.get("Store").and_then(|b| b.concrete()), Some("RedisCache"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, Binding>,
    scoped: BTreeMap<String, Vec<String>>,
    aliases: HashMap<String, String>,
}

impl BindingRegistry {
    /// Indexes `bindings`, deriving the scope groups and the alias map.
    ///
    /// When two bindings claim the same alias, the one whose abstract
    /// type sorts first keeps it.
    pub fn new(bindings: HashMap<String, Binding>) -> Self {
        let mut abstract_types: Vec<&String> = bindings.keys().collect();
        abstract_types.sort();

        let mut scoped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut aliases: HashMap<String, String> = HashMap::new();

        for abstract_type in abstract_types {
            let binding = &bindings[abstract_type];
            scoped
                .entry(binding.scope().to_string())
                .or_default()
                .push(abstract_type.clone());

            for alias in binding.aliases() {
                match aliases.get(alias) {
                    Some(existing) => warn!(
                        alias,
                        kept = %existing,
                        ignored = %abstract_type,
                        "Alias claimed by two bindings"
                    ),
                    None => {
                        aliases.insert(alias.to_string(), abstract_type.clone());
                    }
                }
            }
        }

        debug!(
            bindings = bindings.len(),
            aliases = aliases.len(),
            scopes = scoped.len(),
            "Built binding registry"
        );

        Self { bindings, scoped, aliases }
    }

    /// Starts collecting builders and providers.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Looks up a binding directly, then through an alias.
    pub fn get(&self, abstract_type: &str) -> Option<&Binding> {
        if let Some(binding) = self.bindings.get(abstract_type) {
            return Some(binding);
        }
        let canonical = self.aliases.get(abstract_type)?;
        trace!(from = abstract_type, to = %canonical, "Following alias");
        self.bindings.get(canonical)
    }

    /// Whether `abstract_type` is bound directly or through an alias whose
    /// target is bound.
    pub fn has(&self, abstract_type: &str) -> bool {
        self.get(abstract_type).is_some()
    }

    /// Abstract types registered from `scope`, in name order.
    pub fn scoped(&self, scope: &str) -> Vec<&Binding> {
        self.scoped
            .get(scope)
            .map(|types| types.iter().filter_map(|t| self.bindings.get(t)).collect())
            .unwrap_or_default()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scoped.keys().map(String::as_str)
    }

    /// Alias type → canonical abstract type.
    pub fn aliases(&self) -> &HashMap<String, String> {
        &self.aliases
    }

    /// Every bound abstract type plus every alias.
    pub fn bound_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self
            .bindings
            .keys()
            .chain(self.aliases.keys())
            .map(String::as_str)
            .collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<Binding> for BindingRegistry {
    fn from_iter<I: IntoIterator<Item = Binding>>(iter: I) -> Self {
        let bindings = iter
            .into_iter()
            .map(|binding| (binding.abstract_type().to_string(), binding))
            .collect();
        BindingRegistry::new(bindings)
    }
}

/// Merges builders from collectors and providers into a [`BindingRegistry`].
///
/// Per abstract type, the builder with neither a name nor a qualifier is
/// the base binding; named and qualified builders become its sub-bindings,
/// and aliases from all of them accumulate on the base.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    builders: Vec<BindingBuilder>,
    allow_override: bool,
}

impl RegistryBuilder {
    pub fn collector(mut self, collector: BindingCollector) -> Self {
        self.builders.extend(collector.into_builders());
        self
    }

    pub fn provider(self, provider: &dyn Provider) -> Self {
        let mut collector = BindingCollector::new(provider.scope());
        provider.register(&mut collector);
        debug!(scope = provider.scope(), builders = collector.len(), "Registered provider");
        self.collector(collector)
    }

    /// Lets a later registration replace an earlier one for the same key.
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Merges all builders.
    ///
    /// # Errors
    /// [`ContainerError::DuplicateBinding`] when one key (abstract type,
    /// optionally refined by name or qualifier) is registered twice and
    /// overriding is not allowed.
    #[instrument(skip(self), name = "ghostwire::registry::build")]
    pub fn build(self) -> Result<BindingRegistry> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<BindingBuilder>> = HashMap::new();

        for builder in self.builders {
            let abstract_type = builder.abstract_type().to_string();
            if !groups.contains_key(&abstract_type) {
                order.push(abstract_type.clone());
            }
            groups.entry(abstract_type).or_default().push(builder);
        }

        let mut bindings = HashMap::with_capacity(order.len());
        for abstract_type in order {
            let group = groups.remove(&abstract_type).unwrap_or_default();
            let binding = merge(&abstract_type, group, self.allow_override)?;
            bindings.insert(abstract_type, binding);
        }

        Ok(BindingRegistry::new(bindings))
    }
}

fn merge(abstract_type: &str, group: Vec<BindingBuilder>, allow_override: bool) -> Result<Binding> {
    let fallback_scope = group
        .first()
        .map(|builder| builder.scope().to_string())
        .unwrap_or_default();

    let mut base: Option<Binding> = None;
    let mut named: HashMap<String, Binding> = HashMap::new();
    let mut qualified: HashMap<String, Binding> = HashMap::new();
    let mut aliases: Vec<String> = Vec::new();

    for mut builder in group {
        aliases.extend(builder.take_aliases());
        let key = Lookup::refined(abstract_type, builder.name(), builder.qualifier());
        let binding = builder.build();

        let previous = match (builder.name(), builder.qualifier()) {
            (Some(name), _) => named.insert(name.to_string(), binding),
            (None, Some(qualifier)) => qualified.insert(qualifier.to_string(), binding),
            (None, None) => base.replace(binding),
        };

        if previous.is_some() {
            if !allow_override {
                return Err(ContainerError::DuplicateBinding(DuplicateBindingError {
                    abstract_type: key.to_string(),
                    scope: builder.scope().to_string(),
                }));
            }
            warn!(key = %key, scope = builder.scope(), "Overriding existing binding");
        } else {
            debug!(key = %key, scope = builder.scope(), "Registered binding");
        }
    }

    let mut binding = base.unwrap_or_else(|| Binding::new(fallback_scope, abstract_type));
    for (name, sub) in named {
        binding.insert_named(name, sub);
    }
    for (qualifier, sub) in qualified {
        binding.insert_qualified(qualifier, sub);
    }
    binding.add_aliases(aliases);
    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector(scope: &str, register: impl FnOnce(&mut BindingCollector)) -> BindingCollector {
        let mut collector = BindingCollector::new(scope);
        register(&mut collector);
        collector
    }

    #[test]
    fn merges_sub_bindings_into_base() {
        let registry = BindingRegistry::builder()
            .collector(collector("app", |b| {
                b.bind("Cache").to("RedisCache");
                b.bind("Cache").named("local").to("MemoryCache").alias("LocalStore");
                b.bind("Cache").qualified_by("Primary").to("PrimaryCache");
            }))
            .build()
            .unwrap();

        let cache = registry.get("Cache").unwrap();
        assert_eq!(cache.concrete(), Some("RedisCache"));
        assert_eq!(cache.by_name("local").and_then(Binding::concrete), Some("MemoryCache"));
        assert_eq!(
            cache.for_qualifier("Primary").and_then(Binding::concrete),
            Some("PrimaryCache")
        );
        // aliases from sub-builders land on the base
        assert!(registry.has("LocalStore"));
    }

    #[test]
    fn synthesises_empty_base() {
        let registry = BindingRegistry::builder()
            .collector(collector("app", |b| {
                b.bind("Logger").named("file").to("FileLogger");
            }))
            .build()
            .unwrap();

        let logger = registry.get("Logger").unwrap();
        assert!(logger.has_no_source());
        assert!(logger.is_shared());
        assert_eq!(logger.scope(), "app");
    }

    #[test]
    fn duplicate_base_fails() {
        let result = BindingRegistry::builder()
            .collector(collector("app", |b| {
                b.bind("Cache").to("RedisCache");
            }))
            .collector(collector("tests", |b| {
                b.bind("Cache").to("MemoryCache");
            }))
            .build();

        match result {
            Err(ContainerError::DuplicateBinding(err)) => {
                assert_eq!(err.abstract_type, "Cache");
                assert_eq!(err.scope, "tests");
            }
            other => panic!("Expected DuplicateBinding, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_with_override_keeps_latest() {
        let registry = BindingRegistry::builder()
            .collector(collector("app", |b| {
                b.bind("Cache").to("RedisCache");
            }))
            .collector(collector("tests", |b| {
                b.bind("Cache").to("MemoryCache");
            }))
            .allow_override(true)
            .build()
            .unwrap();

        assert_eq!(registry.get("Cache").and_then(Binding::concrete), Some("MemoryCache"));
    }

    #[test]
    fn duplicate_named_fails() {
        let result = BindingRegistry::builder()
            .collector(collector("app", |b| {
                b.bind("Cache").named("redis").to("RedisCache");
                b.bind("Cache").named("redis").to("RedisCluster");
            }))
            .build();

        assert!(matches!(result, Err(ContainerError::DuplicateBinding(_))));
    }

    #[test]
    fn alias_needs_bound_target() {
        let mut builder = BindingBuilder::new("app", "Cache");
        builder.alias("Store");
        let registry: BindingRegistry = [builder.build()].into_iter().collect();

        assert!(registry.has("Cache"));
        assert!(registry.has("Store"));
        assert!(!registry.has("Other"));
        assert_eq!(registry.aliases().get("Store").map(String::as_str), Some("Cache"));
    }

    #[test]
    fn groups_by_scope() {
        let registry = BindingRegistry::builder()
            .collector(collector("app", |b| {
                b.bind("Cache");
                b.bind("Logger");
            }))
            .collector(collector("mail", |b| {
                b.bind("Mailer");
            }))
            .build()
            .unwrap();

        let app: Vec<&str> = registry.scoped("app").iter().map(|b| b.abstract_type()).collect();
        assert_eq!(app, vec!["Cache", "Logger"]);
        assert_eq!(registry.scopes().collect::<Vec<_>>(), vec!["app", "mail"]);
        assert!(registry.scoped("missing").is_empty());
        assert_eq!(registry.len(), 3);
    }
}
