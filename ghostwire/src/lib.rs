//! # Ghostwire: dependency injection for described object graphs
//!
//! Ghostwire builds object graphs from declared constructor signatures.
//! Classes are described once in a [`Catalog`](container::catalog::Catalog),
//! bound in a [`BindingRegistry`](container::registry::BindingRegistry) and
//! resolved through a [`Container`](container::Container), with support for
//! named and qualified bindings, union and intersection types, ghost
//! objects and lazy proxies.

pub use ghostwire_container as container;
pub use ghostwire_container::*;
pub use ghostwire_support as support;
