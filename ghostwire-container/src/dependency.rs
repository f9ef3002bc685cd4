//! Per-parameter resolution requests.

use crate::catalog::{Catalog, LIMINAL, Parameter, QUALIFIER, RESOLVABLE};
use crate::key::Lookup;
use crate::types::TypeDescriptor;
use crate::value::Value;

/// What the container needs to know to fill one parameter.
///
/// Built fresh from a [`Parameter`] on every call and dropped afterwards.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub parameter: String,
    pub ty: TypeDescriptor,
    pub optional: bool,
    /// From `#[Named(...)]`
    pub name: Option<String>,
    /// First marker that implements `Qualifier`
    pub qualifier: Option<String>,
    /// First marker that implements `Resolvable`; selects the resolver
    pub resolvable: Option<String>,
    pub default: Option<Value>,
    /// Set by a `Liminal` marker
    pub liminal: bool,
}

impl Dependency {
    /// Reads markers and defaults off a declared parameter.
    ///
    /// Markers unknown to the catalog are ignored.
    pub fn from_parameter(parameter: &Parameter, catalog: &Catalog) -> Self {
        let qualifier = parameter
            .markers()
            .find(|marker| catalog.is_subtype(marker, QUALIFIER) && *marker != QUALIFIER);
        let resolvable = parameter
            .markers()
            .find(|marker| catalog.is_subtype(marker, RESOLVABLE) && *marker != RESOLVABLE);
        let liminal = parameter.markers().any(|marker| marker == LIMINAL);

        Self {
            parameter: parameter.name.clone(),
            ty: parameter.ty.clone(),
            optional: parameter.optional,
            name: parameter.binding_name().map(str::to_string),
            qualifier: qualifier.map(str::to_string),
            resolvable: resolvable.map(str::to_string),
            default: parameter.default.clone(),
            liminal,
        }
    }

    /// A plain request for `ty`, no markers.
    pub fn of(parameter: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            parameter: parameter.into(),
            ty: ty.into(),
            optional: false,
            name: None,
            qualifier: None,
            resolvable: None,
            default: None,
            liminal: false,
        }
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Binding lookup for `class` refined by this dependency's name or
    /// qualifier.
    pub fn lookup(&self, class: &str) -> Lookup {
        Lookup::refined(class, self.name.as_deref(), self.qualifier.as_deref())
    }
}
