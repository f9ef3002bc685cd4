//! Core container implementation for Ghostwire.
//!
//! Start at [`container::Container`]; the [`prelude`] pulls in everything a
//! host application needs to describe its classes, bind them and resolve
//! object graphs.

pub mod binding;
pub mod catalog;
pub mod container;
pub mod dependency;
pub mod error;
mod graph;
pub mod key;
pub mod lazy;
pub mod lifetime;
pub mod object;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod value;

#[cfg(test)]
mod fixtures;

pub use container::prelude;
pub use container::{Container, ContainerBuilder, ResolveRequest, Target};
pub use error::{ContainerError, Result};
pub use key::Lookup;
pub use lifetime::Lifetime;
pub use object::Object;
pub use value::{Arguments, Value};
