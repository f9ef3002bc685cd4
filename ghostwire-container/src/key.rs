//! Binding and cache lookup keys.
//!
//! A [`Lookup`] identifies what a caller asks the container for: a class
//! name, optionally refined by a binding name or a qualifier class. When
//! both a name and a qualifier are supplied, the name wins.

use std::fmt;

/// Picks one sub-binding of an abstract type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// `#[Named("...")]` sub-binding
    Name(String),
    /// Sub-binding keyed by a qualifier class
    Qualifier(String),
}

/// Identifies a binding or a cached instance.
///
/// # Examples
/// ```
/// use ghostwire_container::key::Lookup;
///
/// let key = Lookup::of("Cache");
/// assert_eq!(key.class(), "Cache");
/// assert_eq!(key.name(), None);
///
/// let key = Lookup::named("Cache", "redis");
/// assert_eq!(key.name(), Some("redis"));
/// assert_ne!(key, Lookup::of("Cache"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Lookup {
    class: String,
    selector: Option<Selector>,
}

impl Lookup {
    /// Creates a bare lookup for `class`.
    #[inline]
    pub fn of(class: impl Into<String>) -> Self {
        Self { class: class.into(), selector: None }
    }

    /// Creates a lookup for the sub-binding named `name`.
    #[inline]
    pub fn named(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self { class: class.into(), selector: Some(Selector::Name(name.into())) }
    }

    /// Creates a lookup for the sub-binding qualified by `qualifier`.
    #[inline]
    pub fn qualified(class: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            selector: Some(Selector::Qualifier(qualifier.into())),
        }
    }

    /// Builds a lookup from optional refinements; a name takes precedence
    /// over a qualifier.
    pub fn refined(
        class: impl Into<String>,
        name: Option<&str>,
        qualifier: Option<&str>,
    ) -> Self {
        let selector = match (name, qualifier) {
            (Some(name), _) => Some(Selector::Name(name.to_string())),
            (None, Some(qualifier)) => Some(Selector::Qualifier(qualifier.to_string())),
            (None, None) => None,
        };
        Self { class: class.into(), selector }
    }

    /// Same refinement, different class.
    pub fn with_class(&self, class: impl Into<String>) -> Self {
        Self { class: class.into(), selector: self.selector.clone() }
    }

    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    /// Returns the binding name, if this is a named lookup.
    pub fn name(&self) -> Option<&str> {
        match &self.selector {
            Some(Selector::Name(name)) => Some(name),
            _ => None,
        }
    }

    /// Returns the qualifier class, if this is a qualified lookup.
    pub fn qualifier(&self) -> Option<&str> {
        match &self.selector {
            Some(Selector::Qualifier(qualifier)) => Some(qualifier),
            _ => None,
        }
    }
}

impl fmt::Debug for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(Selector::Name(name)) => write!(f, "Lookup({}, name={name:?})", self.class),
            Some(Selector::Qualifier(q)) => write!(f, "Lookup({}, qualifier={q})", self.class),
            None => write!(f, "Lookup({})", self.class),
        }
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(Selector::Name(name)) => write!(f, "{} (name={name:?})", self.class),
            Some(Selector::Qualifier(q)) => write!(f, "{} (qualifier={q})", self.class),
            None => write!(f, "{}", self.class),
        }
    }
}

impl From<&str> for Lookup {
    fn from(class: &str) -> Self {
        Lookup::of(class)
    }
}

impl From<String> for Lookup {
    fn from(class: String) -> Self {
        Lookup::of(class)
    }
}
