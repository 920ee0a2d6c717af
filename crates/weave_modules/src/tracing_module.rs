//! Tracing subscriber installation.
//!
//! [`TracingModule`] provides its [`TracingConfig`] while the container is
//! built, and installs the subscriber once every module is ready, so that
//! other modules can read the configuration first.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tracing::Level;
//! use weave_core::prelude::*;
//! use weave_modules::{TracingConfig, TracingFormat, TracingModule};
//!
//! struct Verbose(bool);
//!
//! let mut container = Container::new();
//! container
//!     .add_modules(
//!         TracingModule::new()
//!             .with_level(Level::DEBUG)
//!             .with_format(TracingFormat::Compact),
//!     )
//!     .unwrap();
//! container.provide(Provider::new(|config: Arc<TracingConfig>| {
//!     Arc::new(Verbose(config.level >= Level::DEBUG))
//! }));
//!
//! assert!(container.resolve::<Arc<Verbose>>().unwrap().0);
//! ```

use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};
use weave_core::container::Container;
use weave_core::module::Module;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// Single-line output.
    Compact,
    /// JSON lines for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing configuration, provided to the container as `Arc<TracingConfig>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured maximum log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingModule
// ─────────────────────────────────────────────────────────────────────────────

/// Installs a `tracing` subscriber for the process.
///
/// | Provides | Description |
/// |----------|-------------|
/// | `Arc<TracingConfig>` | Level and format of the installed subscriber |
///
/// A subscriber that is already installed is left in place.
///
/// ```
/// use tracing::Level;
/// use weave_modules::{TracingFormat, TracingModule};
///
/// // Weave internals at debug, everything else at warn.
/// let module = TracingModule::new()
///     .with_level(Level::WARN)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("warn,weave_core=debug")
///     .with_span_events(true);
/// ```
#[derive(Debug, Clone)]
pub struct TracingModule {
    level: Level,
    format: TracingFormat,
    /// Directives such as `weave_core=debug,warn`; replaces `level` when valid.
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingModule {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingModule {
    /// Creates a module with default settings: `INFO`, pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets target-specific filter directives (`target=level,...`).
    ///
    /// Invalid directives fall back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in the output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// Returns the configuration this module provides.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        self.env_filter
            .as_deref()
            .and_then(|filter| EnvFilter::try_new(filter).ok())
            .unwrap_or_else(|| EnvFilter::new(self.level.as_str()))
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer();
        match self.format {
            TracingFormat::Pretty => layer.pretty().with_span_events(span_events).boxed(),
            TracingFormat::Compact => layer.compact().with_span_events(span_events).boxed(),
            TracingFormat::Json => layer.json().with_span_events(span_events).boxed(),
        }
    }
}

impl Module for TracingModule {
    fn build(&self, container: &mut Container) {
        container.provide_value(Arc::new(self.config()));
    }

    fn ready(&self, _container: &mut Container) {
        // Fails only when a global subscriber already exists.
        let installed = tracing_subscriber::registry()
            .with(self.fmt_layer())
            .with(self.env_filter())
            .try_init()
            .is_ok();

        tracing::info!(
            level = %self.level,
            format = ?self.format,
            installed,
            "tracing module ready"
        );
    }
}
