//! Resolution errors.
//!
//! Every failure is a configuration error: it is reported synchronously,
//! aborts the enclosing resolution and is never retried.

/// Boxed error returned by user factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while registering or resolving dependencies.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The type has no provider and no group or field-injection fallback.
    #[error("type {key} is not registered in the container")]
    NotRegistered {
        /// The rendered type and tags.
        key: String,
    },

    /// The type has providers, but none carries the requested tags.
    #[error("{key} not found")]
    NotFound {
        /// The rendered type and tags.
        key: String,
    },

    /// More than one provider matches the requested tags.
    #[error("multiple definitions of {key}, request the group type {group} instead")]
    Ambiguous {
        /// The rendered type and tags.
        key: String,
        /// The group type that aggregates every matching provider.
        group: String,
    },

    /// Field injection was requested through a pointer type.
    #[error("field injection into {requested} is not supported, use {pointee}")]
    UnsupportedInjection {
        /// The rendered pointer type and tags.
        requested: String,
        /// The rendered pointee type and tags to request instead.
        pointee: String,
    },

    /// A node transitively depends on itself.
    #[error("dependency cycle detected: {}", .path.join(" -> "))]
    Cycle {
        /// Identity of the node found on the cycle.
        node: String,
        /// The cycle, starting and ending at `node`.
        path: Vec<String>,
    },

    /// A resolved value did not have the expected handle type.
    #[error("resolved value is not a {expected}")]
    TypeMismatch {
        /// The handle type that was expected.
        expected: &'static str,
    },

    /// A compiler received fewer values than it declared.
    #[error("missing resolved value for {expected}")]
    MissingArgument {
        /// The parameter or field type that had no value.
        expected: &'static str,
    },

    /// A unique module was added twice.
    #[error("module '{0}' is unique and was already added")]
    DuplicateModule(String),

    /// A module depends on a module that was never added.
    #[error("module '{module}' requires '{dependency}' which was not added")]
    MissingModule {
        /// The dependent module.
        module: String,
        /// The missing dependency.
        dependency: &'static str,
    },

    /// Modules depend on each other in a cycle.
    #[error("circular dependency detected among modules: {0:?}")]
    ModuleCycle(Vec<String>),

    /// A factory reported a failure. Displayed and sourced as the original error.
    #[error(transparent)]
    Factory(BoxError),
}

impl Error {
    /// Returns `true` for both flavours of "no such provider".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NotRegistered { .. })
    }

    /// Returns the original factory error, if this is a factory failure.
    #[must_use]
    pub fn factory_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Factory(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}
