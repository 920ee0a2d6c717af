//! # Weave Internal Library
//!
//! Re-exports the core Weave crates for convenience.

/// Registry, nodes, cycle checker and the container API.
pub use weave_core;

/// Dependency graph export.
pub use weave_graph;

/// Ready-made modules.
pub use weave_modules;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use weave_core::prelude::*;
    pub use weave_graph::prelude::*;
    pub use weave_modules::{TracingConfig, TracingFormat, TracingModule};
}
