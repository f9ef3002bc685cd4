//! Declared parameter types.
//!
//! A [`TypeDescriptor`] is what the catalog reports for a parameter: no
//! type at all, a single named type, a union of alternatives or an
//! intersection of class/interface names.

use std::fmt;

/// Type names that permit `null` on their own.
const NULL_ACCEPTING: [&str; 2] = ["null", "mixed"];

/// The declared type of a parameter.
///
/// # Examples
/// ```
/// use ghostwire_container::types::TypeDescriptor;
///
/// let ty = TypeDescriptor::union([
///     TypeDescriptor::intersection(["Countable", "Traversable"]),
///     TypeDescriptor::named("string"),
///     TypeDescriptor::named("null"),
/// ]);
/// assert_eq!(ty.to_string(), "(Countable&Traversable)|string|null");
/// assert!(ty.allows_null());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeDescriptor {
    /// Untyped parameter.
    #[default]
    None,
    /// A single class, interface or primitive name.
    Named { name: String, nullable: bool },
    /// `A|B|...`; members are named types or intersections.
    Union(Vec<TypeDescriptor>),
    /// `A&B&...`; members are class or interface names.
    Intersection(Vec<String>),
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        TypeDescriptor::Named { name: name.into(), nullable: false }
    }

    /// `?name`
    pub fn nullable(name: impl Into<String>) -> Self {
        TypeDescriptor::Named { name: name.into(), nullable: true }
    }

    pub fn union(members: impl IntoIterator<Item = TypeDescriptor>) -> Self {
        TypeDescriptor::Union(members.into_iter().collect())
    }

    pub fn intersection<S: Into<String>>(members: impl IntoIterator<Item = S>) -> Self {
        TypeDescriptor::Intersection(members.into_iter().map(Into::into).collect())
    }

    /// Whether `null` is an acceptable value for this type.
    pub fn allows_null(&self) -> bool {
        match self {
            TypeDescriptor::None => true,
            TypeDescriptor::Named { name, nullable } => {
                *nullable || NULL_ACCEPTING.contains(&name.as_str())
            }
            TypeDescriptor::Union(members) => members.iter().any(TypeDescriptor::allows_null),
            TypeDescriptor::Intersection(_) => false,
        }
    }

    /// The type name of a single named type.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::None => write!(f, "unknown"),
            TypeDescriptor::Named { name, nullable: true } => write!(f, "?{name}"),
            TypeDescriptor::Named { name, nullable: false } => write!(f, "{name}"),
            TypeDescriptor::Intersection(members) => write!(f, "{}", members.join("&")),
            TypeDescriptor::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    match member {
                        TypeDescriptor::Intersection(_) => write!(f, "({member})")?,
                        _ => write!(f, "{member}")?,
                    }
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        TypeDescriptor::named(name)
    }
}
