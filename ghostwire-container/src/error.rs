//! Error types for Ghostwire container operations.
//!
//! Every failure is returned synchronously to the immediate caller. Where a
//! failure was caused by another one (a union member that could not be
//! resolved, a method body that failed), the original cause stays reachable
//! through [`std::error::Error::source`].

use std::error::Error as StdError;
use std::fmt;

use ghostwire_support::rendering::{render_alternatives, render_chain};

/// Error type returned by method, constructor and factory bodies.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Main error type for all Ghostwire operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// A named or qualified binding was explicitly requested and is missing.
    #[error("{0}")]
    BindingNotFound(BindingNotFoundError),

    /// A resolver strategy exhausted all of its options.
    #[error(transparent)]
    DependencyResolution(DependencyResolutionError),

    /// The catalog does not know the referenced class.
    #[error("The provided class {class} is not a valid class")]
    InvalidClass { class: String },

    /// The class has no method with the given name, not even inherited.
    #[error("The provided method {class}::{method} is not a valid method")]
    InvalidMethod { class: String, method: String },

    /// The catalog does not know the referenced function.
    #[error("The provided function {function} does not exist")]
    InvalidFunction { function: String },

    /// The call was rejected before anything ran.
    #[error(transparent)]
    InvalidInvocation(InvalidInvocationError),

    /// Resolver registration or configuration problem.
    #[error(transparent)]
    InvalidResolver(InvalidResolverError),

    /// The body of a method, constructor or function failed.
    #[error("Unable to call the provided method {class}::{method}: {source}")]
    MethodCall {
        class: String,
        method: String,
        #[source]
        source: BoxError,
    },

    /// The body of a free function or factory failed.
    #[error("Unable to call the provided function {function}: {source}")]
    FunctionCall {
        function: String,
        #[source]
        source: BoxError,
    },

    /// The target is abstract or an interface and nothing concrete is bound.
    #[error("Class {class} is not instantiable")]
    NotInstantiable { class: String },

    /// A class was requested again while it was still being constructed.
    #[error("{0}")]
    CircularDependency(CircularDependencyError),

    /// Two base bindings were registered for the same abstract type.
    #[error("{0}")]
    DuplicateBinding(DuplicateBindingError),

    /// A lazy object was touched after the container that created it was dropped.
    #[error("Lazy object of {class} was touched after its container was dropped")]
    Detached { class: String },
}

impl ContainerError {
    /// Shorthand for a [`DependencyResolutionError`] without a cause.
    pub fn resolution(kind: ResolutionFailure, ty: impl Into<String>) -> Self {
        ContainerError::DependencyResolution(DependencyResolutionError::new(kind, ty))
    }

    /// Returns the resolution failure kind, if this is a resolution error.
    pub fn resolution_kind(&self) -> Option<ResolutionFailure> {
        match self {
            ContainerError::DependencyResolution(err) => Some(err.kind),
            _ => None,
        }
    }
}

/// Which part of a binding lookup came up empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingBinding {
    /// No binding at all for the class.
    Class,
    /// The binding exists but has no sub-binding with this name.
    Named(String),
    /// The binding exists but has no sub-binding for this qualifier.
    Qualified(String),
}

/// Error when a binding that was explicitly asked for does not exist.
///
/// Includes "did you mean?" suggestions when something close is bound.
#[derive(Debug)]
pub struct BindingNotFoundError {
    /// The class whose binding was requested
    pub class: String,
    /// What exactly was missing
    pub missing: MissingBinding,
    /// Close matches that ARE registered
    pub suggestions: Vec<String>,
}

impl fmt::Display for BindingNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.missing {
            MissingBinding::Class => write!(f, "No binding found for {}", self.class)?,
            MissingBinding::Named(name) => {
                write!(f, "No binding found for {} with name {name}", self.class)?
            }
            MissingBinding::Qualified(qualifier) => {
                write!(f, "No binding found for {} qualified by {qualifier}", self.class)?
            }
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean {}?", render_alternatives(&self.suggestions))?;
        }

        Ok(())
    }
}

/// The way a resolver strategy gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionFailure {
    CannotResolve,
    Intersection,
    IntersectionNoBinding,
    Union,
    Ghost,
}

/// Error raised when a dependency cannot be satisfied.
#[derive(Debug)]
pub struct DependencyResolutionError {
    pub kind: ResolutionFailure,
    /// Rendered type of the dependency, e.g. `A&B` or `?string`
    pub ty: String,
    cause: Option<Box<ContainerError>>,
}

impl DependencyResolutionError {
    pub fn new(kind: ResolutionFailure, ty: impl Into<String>) -> Self {
        Self { kind, ty: ty.into(), cause: None }
    }

    /// Attaches the error that made this resolution fail.
    pub fn caused_by(mut self, cause: ContainerError) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// The underlying failure, if any.
    pub fn cause(&self) -> Option<&ContainerError> {
        self.cause.as_deref()
    }
}

impl fmt::Display for DependencyResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ResolutionFailure::CannotResolve => {
                write!(f, "Cannot resolve a dependency of type \"{}\"", self.ty)
            }
            ResolutionFailure::Intersection => {
                write!(f, "Cannot resolve the intersection dependency \"{}\"", self.ty)
            }
            ResolutionFailure::IntersectionNoBinding => write!(
                f,
                "Cannot resolve the intersection dependency \"{}\" without a binding",
                self.ty
            ),
            ResolutionFailure::Union => {
                write!(f, "Cannot resolve the union dependency \"{}\"", self.ty)
            }
            ResolutionFailure::Ghost => {
                write!(f, "Cannot create a ghost object for \"{}\"", self.ty)
            }
        }
    }
}

impl StdError for DependencyResolutionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Policy violations detected before a method is called.
#[derive(Debug, thiserror::Error)]
pub enum InvalidInvocationError {
    #[error("Method {class}::{method} is not public")]
    NotPublic { class: String, method: String },

    #[error("Cannot call the constructor of {class} because it is already initialised")]
    AlreadyInitialised { class: String },
}

/// Resolver table problems.
#[derive(Debug, thiserror::Error)]
pub enum InvalidResolverError {
    /// The marker is not a class implementing the `Resolvable` contract.
    #[error("\"{marker}\" is not a valid resolvable")]
    Resolvable { marker: String },

    /// The resolver strategy could not be constructed.
    #[error("\"{resolver}\" is not a valid resolver: {source}")]
    Resolver {
        resolver: String,
        #[source]
        source: BoxError,
    },

    /// A dependency needed the default resolver and none was configured.
    #[error("There is no default resolver")]
    NoDefault,

    /// More than one resolver was flagged as the default.
    #[error("Only one default resolver may be registered, found {first} and {second}")]
    MultipleDefaults { first: String, second: String },
}

/// Error when a construction chain loops back onto itself.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Example: ["A", "B", "A"]
    pub chain: Vec<String>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: mark one of the parameters #[Ghost] or inject a Container::lazy proxy"
        )
    }
}

/// Error when an abstract type receives two base bindings.
#[derive(Debug)]
pub struct DuplicateBindingError {
    pub abstract_type: String,
    /// Scope of the registration that was rejected
    pub scope: String,
}

impl fmt::Display for DuplicateBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Binding already registered: {} (again from scope {:?})",
            self.abstract_type, self.scope,
        )?;
        write!(
            f,
            "\n  Hint: use .named() or .qualified_by() for alternatives, or enable allow_override"
        )
    }
}

/// Convenient Result type for Ghostwire operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_not_found_named_display() {
        let err = ContainerError::BindingNotFound(BindingNotFoundError {
            class: "Cache".into(),
            missing: MissingBinding::Named("redis".into()),
            suggestions: vec!["redis_cluster".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("No binding found for Cache with name redis"));
        assert!(msg.contains("Did you mean \"redis_cluster\"?"));
    }

    #[test]
    fn binding_not_found_without_suggestions() {
        let err = BindingNotFoundError {
            class: "Cache".into(),
            missing: MissingBinding::Qualified("Primary".into()),
            suggestions: vec![],
        };

        assert_eq!(err.to_string(), "No binding found for Cache qualified by Primary");
    }

    #[test]
    fn resolution_error_chains_cause() {
        let cause = ContainerError::NotInstantiable { class: "Cache".into() };
        let err = ContainerError::DependencyResolution(
            DependencyResolutionError::new(ResolutionFailure::Union, "Cache|string")
                .caused_by(cause),
        );

        assert_eq!(err.to_string(), "Cannot resolve the union dependency \"Cache|string\"");
        let source = err.source().expect("union error keeps its cause");
        assert!(source.to_string().contains("not instantiable"));
        assert_eq!(err.resolution_kind(), Some(ResolutionFailure::Union));
    }

    #[test]
    fn circular_dependency_display() {
        let err = ContainerError::CircularDependency(CircularDependencyError {
            chain: vec!["A".into(), "B".into(), "A".into()],
        });

        let msg = err.to_string();
        assert!(msg.contains("Circular"));
        assert!(msg.contains("A → B → A"));
    }

    #[test]
    fn method_call_keeps_source() {
        let err = ContainerError::MethodCall {
            class: "Mailer".into(),
            method: "send".into(),
            source: "smtp down".into(),
        };

        assert!(err.to_string().contains("Mailer::send"));
        assert_eq!(err.source().map(|s| s.to_string()), Some("smtp down".to_string()));
    }

    #[test]
    fn invalid_resolver_messages() {
        let err = ContainerError::InvalidResolver(InvalidResolverError::NoDefault);
        assert_eq!(err.to_string(), "There is no default resolver");

        let err = ContainerError::InvalidResolver(InvalidResolverError::Resolvable {
            marker: "Mailer".into(),
        });
        assert!(err.to_string().contains("\"Mailer\" is not a valid resolvable"));
    }
}
