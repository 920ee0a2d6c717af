//! Ready-made modules for Weave containers.
//!
//! - [`TracingModule`] - Installs a `tracing` subscriber and exposes its
//!   configuration as [`TracingConfig`]
//!
//! # Example
//!
//! ```
//! use weave_core::prelude::*;
//! use weave_modules::TracingModule;
//! use tracing::Level;
//!
//! let mut container = Container::new();
//! container
//!     .add_modules(TracingModule::default().with_level(Level::DEBUG))
//!     .unwrap();
//! container.finish().unwrap();
//! ```

mod tracing_module;

pub use tracing_module::{TracingConfig, TracingFormat, TracingModule};
