//! A dependency-injection object-graph resolver.
//!
//! `weave_core` builds a directed graph of providers and lazily constructs
//! requested objects by resolving their transitive dependencies on demand:
//!
//! - [`tags`] - Tag sets that disambiguate providers of the same type
//! - [`key`] - Type tokens and declared dependencies
//! - [`node`] - Nodes and their compilation strategies (alias, constructor, group)
//! - [`registry`] - Lookup, memoized construction and cycle detection
//! - [`param`] - Factory parameters
//! - [`factory`] - Conversion of plain functions into factories
//! - [`provider`] - Provider registrations
//! - [`inject`] - Field injection for structs
//! - [`module`] - Grouped registrations with dependency ordering
//! - [`container`] - Typed registration and resolution API
//! - [`shared`] - Thread-safe container handle
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//!
//! trait Plugin: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//!
//! struct Named(&'static str);
//! impl Plugin for Named {
//!     fn name(&self) -> &'static str {
//!         self.0
//!     }
//! }
//!
//! let mut container = Container::new();
//! for name in ["a", "b", "c"] {
//!     container.provide(
//!         Provider::value(Arc::new(Named(name)) as Arc<dyn Plugin>).tagged(name),
//!     );
//! }
//!
//! let all = container.resolve_group::<Arc<dyn Plugin>>(&Tags::new()).unwrap();
//! assert_eq!(all.iter().map(|p| p.name()).collect::<Vec<_>>(), ["a", "b", "c"]);
//!
//! let only_a = container.resolve_group::<Arc<dyn Plugin>>(&Tags::from(["a"])).unwrap();
//! assert_eq!(only_a.len(), 1);
//! ```

// Self-reference so that `#[derive(Inject)]` output can use `weave_core::` paths
// within this crate.
extern crate self as weave_core;

/// Typed registration and resolution API.
pub mod container;

/// Resolution errors.
pub mod error;

/// Function-to-factory conversion.
pub mod factory;

/// Field injection.
pub mod inject;

/// Type tokens and dependencies.
pub mod key;

/// Module lifecycle.
pub mod module;

/// Nodes and compilers.
pub mod node;

/// Factory parameters.
pub mod param;

/// Provider registrations.
pub mod provider;

/// The node registry.
pub mod registry;

/// Thread-safe container handle.
pub mod shared;

/// Tag sets.
pub mod tags;

/// Re-export the `#[derive(Inject)]` macro.
pub use weave_inject_macros::Inject;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::container::{Container, ContainerConfig};
    pub use crate::error::{BoxError, Error};
    pub use crate::factory::Factory;
    pub use crate::Inject;
    pub use crate::inject::{Fields, Inject};
    pub use crate::key::{Dependency, TypeKey};
    pub use crate::module::{Module, ModuleGroupBuilder, ModuleId, Modules};
    pub use crate::param::{Injected, Param, Tagged};
    pub use crate::provider::Provider;
    pub use crate::registry::Validation;
    pub use crate::shared::SharedContainer;
    pub use crate::tags::{Tag, Tags};
}
