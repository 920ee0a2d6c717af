//! A dependency-injection object-graph resolver for Rust.
//!
//! Providers are registered by type and tags, dependencies are resolved on
//! demand and every value is constructed once. See [`weave_core`] for the
//! resolution engine, [`weave_graph`] for graph export and
//! [`weave_modules`] for ready-made modules.

pub use weave_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use weave_internal::prelude::*;
}
