//! Resolver strategies.
//!
//! A resolver turns a [`Dependency`] into a value. Which one runs is
//! decided per parameter: a parameter carrying a `Resolvable` marker uses
//! the resolver registered for that marker, everything else goes to the
//! default resolver.
//!
//! ```text
//! Parameter ──markers──> Dependency ──marker?──> ResolverSlot ──> Resolver::resolve
//!                                      └─none──> default slot
//! ```
//!
//! Strategies are built on first dispatch, not when the container is.

mod generic;
mod ghost;

pub use generic::GenericResolver;
pub use ghost::GhostResolver;

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::container::Container;
use crate::dependency::Dependency;
use crate::error::{BoxError, ContainerError, InvalidResolverError, Result};
use crate::value::{Arguments, Value};

/// A strategy for satisfying one dependency.
///
/// Implementations may call back into the container, e.g. through
/// [`Container::resolve_with`].
pub trait Resolver: Send + Sync {
    fn resolve(
        &self,
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Value>;

    /// Human-readable name for logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Builds a resolver on first use.
pub type ResolverFactory =
    Arc<dyn Fn() -> std::result::Result<Arc<dyn Resolver>, BoxError> + Send + Sync>;

/// A registered resolver, constructed lazily.
pub(crate) struct ResolverSlot {
    name: String,
    factory: ResolverFactory,
    cell: OnceCell<Arc<dyn Resolver>>,
}

impl ResolverSlot {
    pub fn new(name: impl Into<String>, factory: ResolverFactory) -> Self {
        Self { name: name.into(), factory, cell: OnceCell::new() }
    }

    /// A slot holding an already built resolver.
    pub fn ready(resolver: Arc<dyn Resolver>) -> Self {
        let name = resolver.name().to_string();
        let cell = OnceCell::with_value(resolver.clone());
        Self { name, factory: Arc::new(move || Ok(resolver.clone())), cell }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resolver, building it on first call.
    ///
    /// # Errors
    /// [`InvalidResolverError::Resolver`] if the factory fails. A failed
    /// build is retried on the next call.
    pub fn get(&self) -> Result<&Arc<dyn Resolver>> {
        self.cell.get_or_try_init(|| {
            debug!(resolver = %self.name, "Constructing resolver");
            (self.factory)().map_err(|source| {
                ContainerError::InvalidResolver(InvalidResolverError::Resolver {
                    resolver: self.name.clone(),
                    source,
                })
            })
        })
    }

    pub fn is_constructed(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl fmt::Debug for ResolverSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverSlot")
            .field("name", &self.name)
            .field("constructed", &self.is_constructed())
            .finish()
    }
}
