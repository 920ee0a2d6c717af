//! Modules: grouped provider registrations.
//!
//! A [`Module`] registers related providers on a [`Container`]. Modules may
//! depend on other modules; the container builds them in dependency order
//! when it is [finished](Container::finish).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//!
//! struct Config {
//!     url: &'static str,
//! }
//! struct Database {
//!     url: &'static str,
//! }
//!
//! struct ConfigModule;
//!
//! impl Module for ConfigModule {
//!     fn build(&self, container: &mut Container) {
//!         container.provide_value(Arc::new(Config { url: "postgres://" }));
//!     }
//! }
//!
//! struct DatabaseModule;
//!
//! impl Module for DatabaseModule {
//!     fn build(&self, container: &mut Container) {
//!         container.provide(Provider::new(|config: Arc<Config>| {
//!             Arc::new(Database { url: config.url })
//!         }));
//!     }
//!
//!     fn dependencies(&self) -> Vec<ModuleId> {
//!         vec![ModuleId::of::<ConfigModule>()]
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.add_modules(DatabaseModule).unwrap();
//! container.add_modules(ConfigModule).unwrap();
//! container.finish().unwrap();
//!
//! assert_eq!(container.resolve::<Arc<Database>>().unwrap().url, "postgres://");
//! ```

use core::any::{TypeId, type_name};

use crate::container::Container;
use crate::error::Error;

/// Unique identifier of a module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ModuleId {
    /// Creates the id of module type `M`.
    #[must_use]
    pub fn of<M: Module>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Module Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A set of registrations added to a container together.
pub trait Module: Send + Sync + 'static {
    /// Registers the module's providers.
    fn build(&self, container: &mut Container);

    /// Runs after every module was built. Values may be resolved here.
    fn ready(&self, _container: &mut Container) {}

    /// Name used in diagnostics. Defaults to the type name.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Modules that must be built before this one.
    fn dependencies(&self) -> Vec<ModuleId> {
        Vec::new()
    }

    /// Whether adding the module twice is an error.
    fn is_unique(&self) -> bool {
        true
    }
}

/// Types that can be passed to [`Container::add_modules`]: single modules
/// and [`ModuleGroupBuilder`]s.
pub trait Modules {
    /// Adds the modules to `container`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateModule`] if a unique module was already added.
    fn add_to_container(self, container: &mut Container) -> Result<(), Error>;
}

impl<M: Module> Modules for M {
    fn add_to_container(self, container: &mut Container) -> Result<(), Error> {
        container.add_module_boxed(ModuleId::of::<M>(), Box::new(self))
    }
}

impl Modules for ModuleGroupBuilder {
    fn add_to_container(self, container: &mut Container) -> Result<(), Error> {
        for BoxedModule { id, module } in self.modules {
            container.add_module_boxed(id, module)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModuleGroupBuilder
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) struct BoxedModule {
    pub(crate) id: ModuleId,
    pub(crate) module: Box<dyn Module>,
}

/// An ordered bundle of modules.
///
/// ```
/// use weave_core::prelude::*;
///
/// struct Logging;
/// impl Module for Logging {
///     fn build(&self, _container: &mut Container) {}
/// }
///
/// struct Storage;
/// impl Module for Storage {
///     fn build(&self, _container: &mut Container) {}
/// }
///
/// let defaults = ModuleGroupBuilder::new().add(Logging).add(Storage);
/// let without_logging = defaults.disable::<Logging>();
/// assert_eq!(without_logging.len(), 1);
/// ```
#[derive(Default)]
pub struct ModuleGroupBuilder {
    modules: Vec<BoxedModule>,
}

impl ModuleGroupBuilder {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<M: Module>(mut self, module: M) -> Self {
        self.modules.push(BoxedModule {
            id: ModuleId::of::<M>(),
            module: Box::new(module),
        });
        self
    }

    /// Removes every module of type `M`.
    #[must_use]
    pub fn disable<M: Module>(mut self) -> Self {
        let id = ModuleId::of::<M>();
        self.modules.retain(|boxed| boxed.id != id);
        self
    }

    /// Returns the number of modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if the group holds no module.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
