//! How long a resolved instance is kept by the container.
//!
//! - [`Lifetime::Shared`]: cached for as long as the container lives
//! - [`Lifetime::Liminal`]: cached through a weak handle, gone once the
//!   last outside reference is dropped
//! - [`Lifetime::Transient`]: never cached
//!
//! # Ordering
//! `Shared > Liminal > Transient`: a shared instance outlives a liminal
//! one, which outlives a transient one.

use std::fmt;

/// Caching policy derived from a binding's `shared` and `liminal` flags.
///
/// # Examples
/// ```
/// use ghostwire_container::lifetime::Lifetime;
///
/// assert_eq!(Lifetime::of(true, false), Lifetime::Shared);
/// assert_eq!(Lifetime::of(true, true), Lifetime::Liminal);
/// assert_eq!(Lifetime::of(false, true), Lifetime::Transient);
/// assert!(Lifetime::Shared > Lifetime::Liminal);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per container.
    Shared,
    /// One instance while something outside the container holds it.
    Liminal,
    /// A new instance on every resolution.
    Transient,
}

impl Lifetime {
    /// A non-shared binding is transient whatever its liminal flag says.
    #[inline]
    pub fn of(shared: bool, liminal: bool) -> Self {
        match (shared, liminal) {
            (false, _) => Lifetime::Transient,
            (true, true) => Lifetime::Liminal,
            (true, false) => Lifetime::Shared,
        }
    }

    /// Narrows a shared lifetime to liminal when the resolution asked for it.
    #[inline]
    pub fn with_liminal(self, liminal: bool) -> Self {
        match self {
            Lifetime::Shared if liminal => Lifetime::Liminal,
            other => other,
        }
    }

    /// Returns `true` if resolutions are stored at all.
    #[inline]
    pub fn is_cached(&self) -> bool {
        !matches!(self, Lifetime::Transient)
    }

    #[inline]
    fn ordering(&self) -> u8 {
        match self {
            Lifetime::Shared => 2,
            Lifetime::Liminal => 1,
            Lifetime::Transient => 0,
        }
    }
}

impl PartialOrd for Lifetime {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Lifetime {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ordering().cmp(&other.ordering())
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Shared => write!(f, "Shared"),
            Lifetime::Liminal => write!(f, "Liminal"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifetime_ordering() {
        assert!(Lifetime::Shared > Lifetime::Liminal);
        assert!(Lifetime::Liminal > Lifetime::Transient);
    }

    #[test]
    fn lifetime_is_cached() {
        assert!(Lifetime::Shared.is_cached());
        assert!(Lifetime::Liminal.is_cached());
        assert!(!Lifetime::Transient.is_cached());
    }

    #[test]
    fn with_liminal_only_narrows_shared() {
        assert_eq!(Lifetime::Shared.with_liminal(true), Lifetime::Liminal);
        assert_eq!(Lifetime::Shared.with_liminal(false), Lifetime::Shared);
        assert_eq!(Lifetime::Transient.with_liminal(true), Lifetime::Transient);
        assert_eq!(Lifetime::Liminal.with_liminal(false), Lifetime::Liminal);
    }

    #[test]
    fn lifetime_display() {
        assert_eq!(Lifetime::Liminal.to_string(), "Liminal");
    }
}
