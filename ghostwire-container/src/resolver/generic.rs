//! The default resolver.

use tracing::trace;

use crate::binding::Binding;
use crate::container::{Container, ResolveRequest};
use crate::dependency::Dependency;
use crate::error::{ContainerError, DependencyResolutionError, ResolutionFailure, Result};
use crate::key::Lookup;
use crate::object::Object;
use crate::resolver::Resolver;
use crate::types::TypeDescriptor;
use crate::value::{Arguments, Value};

/// Resolves single, union and intersection types through the container.
///
/// Stateless: every call works only from the dependency it is given.
///
/// - **single** `A`: resolve `A` with the dependency's name, qualifier and
///   liminal flag; a non-class type falls back to the default, then `null`
///   if allowed
/// - **intersection** `A&B`: try the bindings of the members in order and
///   take the first instance satisfying every member
/// - **union** `A|B`: only resolved when exactly one member is a class or
///   an intersection; ambiguous unions are never guessed
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericResolver;

impl Resolver for GenericResolver {
    fn resolve(
        &self,
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Value> {
        match &dependency.ty {
            TypeDescriptor::Named { .. } => {
                self.resolve_named(&dependency.ty, dependency, container, arguments)
            }
            TypeDescriptor::Intersection(members) => {
                self.resolve_intersection(&dependency.ty, members, dependency, container, arguments)
            }
            TypeDescriptor::Union(members) => {
                self.resolve_union(&dependency.ty, members, dependency, container, arguments)
            }
            TypeDescriptor::None => dependency
                .default
                .clone()
                .ok_or_else(|| ContainerError::resolution(ResolutionFailure::CannotResolve, "unknown")),
        }
    }
}

impl GenericResolver {
    fn resolve_named(
        &self,
        ty: &TypeDescriptor,
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Value> {
        let name = ty.name().unwrap_or_default();

        if !container.catalog().exists(name) {
            if let Some(default) = &dependency.default {
                return Ok(default.clone());
            }
            if ty.allows_null() {
                return Ok(Value::Null);
            }
            return Err(ContainerError::resolution(ResolutionFailure::CannotResolve, name));
        }

        let request = ResolveRequest::new(dependency.lookup(name))
            .arguments(arguments.clone())
            .liminal(dependency.liminal);
        container.resolve_with(request).map(Value::Object)
    }

    fn resolve_intersection(
        &self,
        ty: &TypeDescriptor,
        members: &[String],
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Value> {
        let mut bindings: Vec<&Binding> = Vec::new();
        for member in members {
            if let Some(binding) = container.binding(&dependency.lookup(member))? {
                bindings.push(binding);
            }
        }

        if bindings.is_empty() {
            return dependency.default.clone().ok_or_else(|| {
                ContainerError::resolution(ResolutionFailure::IntersectionNoBinding, ty.to_string())
            });
        }

        for binding in bindings {
            let Some(instance) = self.candidate(binding, dependency, container, arguments)? else {
                continue;
            };

            if members
                .iter()
                .all(|member| container.catalog().is_instance(&instance, member))
            {
                return Ok(Value::Object(instance));
            }
            trace!(
                candidate = instance.class(),
                ty = %ty,
                "Candidate does not satisfy every member"
            );
        }

        dependency
            .default
            .clone()
            .ok_or_else(|| ContainerError::resolution(ResolutionFailure::Intersection, ty.to_string()))
    }

    /// Builds the instance a binding stands for; `None` skips the candidate.
    fn candidate(
        &self,
        binding: &Binding,
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Option<Object>> {
        if let Some(instance) = binding.instance() {
            return Ok(Some(instance.clone()));
        }

        if let Some(factory) = binding.factory() {
            return Ok(container.call(factory, arguments.clone())?.into_object());
        }

        let Some(concrete) = binding.concrete() else {
            return Ok(None);
        };

        let request = ResolveRequest::new(Lookup::of(concrete))
            .arguments(arguments.clone())
            .liminal(dependency.liminal);
        match container.resolve_with(request) {
            Ok(instance) => Ok(Some(instance)),
            Err(ContainerError::InvalidClass { class }) => {
                trace!(class = %class, "Skipping candidate with an invalid class");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn resolve_union(
        &self,
        ty: &TypeDescriptor,
        members: &[TypeDescriptor],
        dependency: &Dependency,
        container: &Container,
        arguments: &Arguments,
    ) -> Result<Value> {
        let resolvable: Vec<&TypeDescriptor> = members
            .iter()
            .filter(|member| match member {
                TypeDescriptor::Named { name, .. } => container.catalog().exists(name),
                TypeDescriptor::Intersection(_) => true,
                _ => false,
            })
            .collect();

        if let [member] = resolvable.as_slice() {
            let resolved = match member {
                TypeDescriptor::Intersection(parts) => {
                    self.resolve_intersection(member, parts, dependency, container, arguments)
                }
                _ => self.resolve_named(member, dependency, container, arguments),
            };

            return resolved.map_err(|cause| {
                ContainerError::DependencyResolution(
                    DependencyResolutionError::new(ResolutionFailure::Union, ty.to_string())
                        .caused_by(cause),
                )
            });
        }

        if let Some(default) = &dependency.default {
            return Ok(default.clone());
        }
        if ty.allows_null() {
            return Ok(Value::Null);
        }

        Err(ContainerError::resolution(ResolutionFailure::Union, ty.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::provider::BindingCollector;
    use crate::registry::BindingRegistry;

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

    fn resolve(container: &Container, dependency: &Dependency) -> Result<Value> {
        GenericResolver.resolve(dependency, container, &Arguments::new())
    }

    fn countable_and_traversable() -> TypeDescriptor {
        TypeDescriptor::intersection(["Countable", "Traversable"])
    }

    #[test]
    fn scalar_uses_default() {
        let container = container(|_| {});
        let mut dependency = Dependency::of("retries", "int");
        dependency.default = Some(Value::Int(3));

        assert_eq!(resolve(&container, &dependency).unwrap(), Value::Int(3));
    }

    #[test]
    fn scalar_without_default_fails() {
        let container = container(|_| {});

        let err = resolve(&container, &Dependency::of("retries", "int")).unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionFailure::CannotResolve));
    }

    #[test]
    fn untyped_without_default_fails() {
        let container = container(|_| {});

        let err = resolve(&container, &Dependency::of("anything", TypeDescriptor::None)).unwrap_err();
        assert!(err.to_string().contains("unknown"));
    }

    #[test]
    fn intersection_takes_first_satisfying_candidate() {
        let container = container(|b| {
            b.bind("Countable").to("Counter");
            b.bind("Traversable").to("Collection");
        });

        let value = resolve(&container, &Dependency::of("items", countable_and_traversable())).unwrap();
        assert_eq!(value.type_name(), "Collection");
    }

    #[test]
    fn intersection_without_satisfying_candidate_fails() {
        let container = container(|b| {
            b.bind("Countable").to("Counter");
        });

        let err = resolve(&container, &Dependency::of("items", countable_and_traversable())).unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionFailure::Intersection));
    }

    #[test]
    fn intersection_without_bindings_fails() {
        let container = container(|_| {});

        let err = resolve(&container, &Dependency::of("items", countable_and_traversable())).unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionFailure::IntersectionNoBinding));
    }

    #[test]
    fn intersection_accepts_bound_instance() {
        let collection = Object::new("Collection");
        let container = container(|b| {
            b.bind("Countable").to(&collection);
        });

        let value = resolve(&container, &Dependency::of("items", countable_and_traversable())).unwrap();
        assert_eq!(value.as_object().map(|object| object.same(&collection)), Some(true));
    }

    #[test]
    fn union_with_one_class_resolves_it() {
        let container = container(|b| {
            b.bind("Cache").to("MemoryCache");
        });
        let ty = TypeDescriptor::union(["Cache".into(), "string".into()]);

        let value = resolve(&container, &Dependency::of("cache", ty)).unwrap();
        assert_eq!(value.type_name(), "MemoryCache");
    }

    #[test]
    fn union_member_failure_is_wrapped() {
        let container = container(|_| {});
        let ty = TypeDescriptor::union(["Cache".into(), "string".into()]);

        match resolve(&container, &Dependency::of("cache", ty)) {
            Err(ContainerError::DependencyResolution(err)) => {
                assert_eq!(err.kind, ResolutionFailure::Union);
                assert!(matches!(err.cause(), Some(ContainerError::NotInstantiable { .. })));
            }
            other => panic!("Expected DependencyResolution, got: {other:?}"),
        }
    }

    #[test]
    fn ambiguous_union_is_never_guessed() {
        let container = container(|b| {
            b.bind("Cache").to("MemoryCache");
            b.bind("Logger").to("FileLogger");
        });
        let ambiguous = TypeDescriptor::union(["Cache".into(), "Logger".into()]);

        let err = resolve(&container, &Dependency::of("dep", ambiguous.clone())).unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionFailure::Union));

        let mut with_default = Dependency::of("dep", ambiguous);
        with_default.default = Some("fallback".into());
        assert_eq!(resolve(&container, &with_default).unwrap(), Value::from("fallback"));

        let nullable = TypeDescriptor::union(["Cache".into(), "Logger".into(), "null".into()]);
        assert!(resolve(&container, &Dependency::of("dep", nullable)).unwrap().is_null());
    }

    #[test]
    fn named_dependency_uses_named_binding() {
        let container = container(|b| {
            b.bind("Cache").named("redis").to("RedisCache");
        });
        let mut dependency = Dependency::of("cache", "Cache");
        dependency.name = Some("redis".into());

        let value = resolve(&container, &dependency).unwrap();
        assert_eq!(value.type_name(), "RedisCache");
    }
}
