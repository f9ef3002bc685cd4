//! Providers and binding collectors.
//!
//! A [`BindingCollector`] gathers [`BindingBuilder`]s that share one
//! registration origin (the *scope*). A [`Provider`] is a reusable module
//! of bindings that fills a collector.
//!
//! # Examples
//! ```
//! use ghostwire_container::provider::{BindingCollector, Provider};
//! use ghostwire_container::registry::BindingRegistry;
//!
//! struct CacheProvider;
//!
//! impl Provider for CacheProvider {
//!     fn register(&self, bindings: &mut BindingCollector) {
//!         bindings.bind("Cache").to("RedisCache");
//!         bindings.bind("Cache").named("local").to("MemoryCache");
//!     }
//! }
//!
//! let registry = BindingRegistry::builder().provider(&CacheProvider).build().unwrap();
//! assert!(registry.has("Cache"));
//! ```

use crate::binding::BindingBuilder;

/// A module that registers related bindings.
///
/// Split bindings by concern, one provider each, and hand them all to the
/// [`RegistryBuilder`](crate::registry::RegistryBuilder).
pub trait Provider: Send + Sync {
    /// Adds this provider's bindings to the collector.
    ///
    /// Called once while the registry is built.
    fn register(&self, bindings: &mut BindingCollector);

    /// Registration origin recorded on every binding; used in diagnostics.
    fn scope(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Builders registered under one scope.
#[derive(Debug, Clone)]
pub struct BindingCollector {
    scope: String,
    builders: Vec<BindingBuilder>,
}

impl BindingCollector {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { scope: scope.into(), builders: Vec::new() }
    }

    #[inline]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Starts a new builder for `abstract_type` tagged with this scope.
    pub fn bind(&mut self, abstract_type: impl Into<String>) -> &mut BindingBuilder {
        let index = self.builders.len();
        self.builders
            .push(BindingBuilder::new(self.scope.clone(), abstract_type));
        &mut self.builders[index]
    }

    pub fn builders(&self) -> &[BindingBuilder] {
        &self.builders
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    pub(crate) fn into_builders(self) -> Vec<BindingBuilder> {
        self.builders
    }
}
