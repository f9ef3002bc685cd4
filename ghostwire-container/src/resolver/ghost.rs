//! Resolver behind the `Ghost` marker.

use crate::binding::Binding;
use crate::container::Container;
use crate::dependency::Dependency;
use crate::error::{ContainerError, ResolutionFailure, Result};
use crate::resolver::Resolver;
use crate::value::{Arguments, Value};

/// Hands out a ghost of the bound concrete class.
///
/// The ghost is the real instance with its constructor deferred: the
/// first field access or method call runs the constructor through
/// [`Container::invoke`] with the arguments given here.
#[derive(Debug, Default, Clone, Copy)]
pub struct GhostResolver;

impl Resolver for GhostResolver {
    fn resolve(
        &self,
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Value> {
        let class = match dependency.ty.name() {
            Some(name) if container.catalog().exists(name) => name,
            _ => {
                return Err(ContainerError::resolution(
                    ResolutionFailure::Ghost,
                    dependency.ty.to_string(),
                ));
            }
        };

        let concrete = container
            .binding(&dependency.lookup(class))?
            .and_then(Binding::concrete)
            .unwrap_or(class)
            .to_string();

        container.ghost(&concrete, arguments.clone()).map(Value::Object)
    }
}
