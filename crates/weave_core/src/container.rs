//! The container: registration and typed resolution.
//!
//! The [`Container`] wraps a [`Registry`] with a typed API and a module
//! lifecycle:
//!
//! 1. **Registration** - [`provide`](Container::provide) providers directly,
//!    or [`add_modules`](Container::add_modules) that provide them
//! 2. **Finish** - sort modules by dependency, `build` and `ready` them in
//!    that order, then validate the graph (see [`Validation`])
//! 3. **Resolution** - [`resolve`](Container::resolve) and friends construct
//!    values on demand; resolving before `finish` finishes implicitly
//! 4. **Cleanup** - [`cleanup`](Container::cleanup) runs the cleanup
//!    callbacks emitted by factories, newest first
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//!
//! struct Logger;
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .provide(Provider::new(|| Arc::new(Logger)))
//!     .provide(Provider::new(|logger: Arc<Logger>| Arc::new(Service { logger })));
//!
//! let service = container.resolve::<Arc<Service>>().unwrap();
//! let logger = container.resolve::<Arc<Logger>>().unwrap();
//! assert!(Arc::ptr_eq(&service.logger, &logger));
//! ```

use hashbrown::{HashMap, HashSet};
use tracing::debug;

use crate::error::Error;
use crate::factory::Factory;
use crate::inject::Inject;
use crate::key::{Dependency, TypeKey};
use crate::module::{Module, ModuleId, Modules};
use crate::param::Param;
use crate::node::{Instance, downcast};
use crate::provider::Provider;
use crate::registry::{Registry, Validation};
use crate::tags::Tags;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Container settings.
///
/// ```
/// use weave_core::prelude::*;
///
/// let config = ContainerConfig::default().with_validation(Validation::Reachable);
/// let container = Container::with_config(config);
/// assert_eq!(container.config().validation(), Validation::Reachable);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContainerConfig {
    validation: Validation,
}

impl ContainerConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how much of the graph is validated before the first construction.
    #[must_use]
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    /// Returns the validation mode.
    #[must_use]
    pub fn validation(&self) -> Validation {
        self.validation
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container
// ─────────────────────────────────────────────────────────────────────────────

/// Progresses linearly: `NotStarted` → `Building` → `Built`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum BuildState {
    #[default]
    NotStarted,
    /// Modules are being built or readied.
    Building,
    Built,
}

struct ModuleEntry {
    id: ModuleId,
    module: Box<dyn Module>,
    name: String,
}

/// Registration and resolution session.
pub struct Container {
    registry: Registry,
    config: ContainerConfig,
    /// Modules waiting for [`finish`](Self::finish), in insertion order.
    pending_modules: Vec<ModuleEntry>,
    /// Modules already built, in build order.
    built_modules: Vec<ModuleEntry>,
    module_ids: HashSet<ModuleId>,
    build_state: BuildState,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    /// Creates an empty container with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty container.
    #[must_use]
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: Registry::new(config.validation()),
            config,
            pending_modules: Vec::new(),
            built_modules: Vec::new(),
            module_ids: HashSet::new(),
            build_state: BuildState::NotStarted,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns the underlying registry mutably.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Module Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a module or a [`ModuleGroupBuilder`](crate::module::ModuleGroupBuilder).
    ///
    /// Modules added while the container is finishing, or after it finished,
    /// are built immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateModule`] if a unique module was already added.
    pub fn add_modules<M: Modules>(&mut self, modules: M) -> Result<&mut Self, Error> {
        modules.add_to_container(self)?;
        Ok(self)
    }

    pub(crate) fn add_module_boxed(
        &mut self,
        id: ModuleId,
        module: Box<dyn Module>,
    ) -> Result<(), Error> {
        let name = module.name().to_string();
        if module.is_unique() && self.module_ids.contains(&id) {
            return Err(Error::DuplicateModule(name));
        }
        self.module_ids.insert(id);

        let entry = ModuleEntry { id, module, name };
        match self.build_state {
            BuildState::NotStarted => self.pending_modules.push(entry),
            BuildState::Building => {
                entry.module.build(self);
                self.built_modules.push(entry);
            }
            BuildState::Built => {
                entry.module.build(self);
                entry.module.ready(self);
                self.built_modules.push(entry);
            }
        }
        Ok(())
    }

    /// Returns `true` if a module of type `M` was added.
    #[must_use]
    pub fn has_module<M: Module>(&self) -> bool {
        self.module_ids.contains(&ModuleId::of::<M>())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a provider.
    pub fn provide<H: Clone + Send + Sync + 'static>(&mut self, provider: Provider<H>) -> &mut Self {
        provider.register(&mut self.registry);
        self
    }

    /// Registers an already constructed handle.
    pub fn provide_value<H: Clone + Send + Sync + 'static>(&mut self, handle: H) -> &mut Self {
        self.provide(Provider::value(handle))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Builds and readies pending modules in dependency order, then
    /// validates the graph when the configuration asks for
    /// [`Validation::Whole`].
    ///
    /// Calling it again has no effect.
    ///
    /// # Errors
    ///
    /// Returns module ordering errors, in which case nothing was built, or
    /// the validation error.
    pub fn finish(&mut self) -> Result<(), Error> {
        if self.build_state != BuildState::NotStarted {
            return Ok(());
        }

        let order = self.sort_modules_by_dependencies()?;
        let mut pending: Vec<Option<ModuleEntry>> =
            core::mem::take(&mut self.pending_modules).into_iter().map(Some).collect();

        self.build_state = BuildState::Building;
        for index in order {
            if let Some(entry) = pending[index].take() {
                debug!(module = %entry.name, "building module");
                entry.module.build(self);
                self.built_modules.push(entry);
            }
        }

        let built = core::mem::take(&mut self.built_modules);
        for entry in &built {
            entry.module.ready(self);
        }
        // Modules added during `ready` were built in the meantime.
        let added = core::mem::replace(&mut self.built_modules, built);
        self.built_modules.extend(added);

        self.build_state = BuildState::Built;
        debug!(
            modules = self.built_modules.len(),
            nodes = self.registry.len(),
            "container finished"
        );

        match self.config.validation() {
            Validation::Whole => self.validate(),
            Validation::Reachable => Ok(()),
        }
    }

    /// Proves that the whole graph is acyclic and every dependency can be
    /// found, without constructing any value.
    ///
    /// # Errors
    ///
    /// Returns the first cycle or lookup error.
    pub fn validate(&mut self) -> Result<(), Error> {
        self.registry.check_acyclic(None)
    }

    /// Runs the collected cleanup callbacks, newest first, and forgets them.
    pub fn cleanup(&mut self) {
        let cleanups = self.registry.take_cleanups();
        debug!(count = cleanups.len(), "running cleanups");
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }

    fn ensure_finished(&mut self) -> Result<(), Error> {
        match self.build_state {
            BuildState::NotStarted => self.finish(),
            BuildState::Building | BuildState::Built => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves `P` the way a factory parameter of that type would be.
    ///
    /// `Arc<T>` resolves the single provider of `Arc<T>`, `Vec<Arc<T>>` the
    /// group of every `Arc<T>` provider and [`Injected<S>`](crate::param::Injected)
    /// the field-injected struct `S`.
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve<P: Param>(&mut self) -> Result<P, Error> {
        self.resolve_tagged(&Tags::new())
    }

    /// Like [`resolve`](Self::resolve), with `tags` added to the lookup.
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve_tagged<P: Param>(&mut self, tags: &Tags) -> Result<P, Error> {
        let mut dependency = P::dependency();
        for tag in tags.iter() {
            dependency = dependency.tagged(tag);
        }
        let instance = self.resolve_dependency(&dependency)?;
        P::extract(&instance)
    }

    /// Resolves every provider of handle `H` carrying `tags`, in
    /// registration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no provider matches, or the first
    /// member's error.
    pub fn resolve_group<H: Clone + Send + Sync + 'static>(
        &mut self,
        tags: &Tags,
    ) -> Result<Vec<H>, Error> {
        let instance = self.resolve_key(&TypeKey::group::<H>(), tags)?;
        downcast(&instance)
    }

    /// Resolves the field-injectable struct `S`.
    ///
    /// # Errors
    ///
    /// Returns the first field's error.
    pub fn resolve_injected<S: Inject>(&mut self) -> Result<S, Error> {
        let instance = self.resolve_key(&TypeKey::injectable::<S>(), &Tags::new())?;
        downcast(&instance)
    }

    /// Resolves a dependency without downcasting it.
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve_dependency(&mut self, dependency: &Dependency) -> Result<Instance, Error> {
        self.resolve_key(dependency.key(), dependency.tags())
    }

    fn resolve_key(&mut self, key: &TypeKey, tags: &Tags) -> Result<Instance, Error> {
        self.ensure_finished()?;
        self.registry.resolve(key, tags)
    }

    /// Returns `true` if handle `H` has an explicit provider carrying `tags`.
    #[must_use]
    pub fn has<H: Send + Sync + 'static>(&self, tags: &Tags) -> bool {
        self.registry.contains(&TypeKey::of::<H>(), tags)
    }

    /// Calls `factory` with its arguments resolved from the container and
    /// returns its output. The output itself is not registered.
    ///
    /// # Errors
    ///
    /// Returns the first argument's error.
    pub fn invoke<M, F: Factory<M>>(&mut self, factory: F) -> Result<F::Output, Error> {
        let args = factory
            .dependencies()
            .iter()
            .map(|dependency| self.resolve_dependency(dependency))
            .collect::<Result<Vec<_>, _>>()?;
        factory.call(&args)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal: Module Ordering
    // ─────────────────────────────────────────────────────────────────────────

    /// Orders pending modules so that dependencies come first.
    fn sort_modules_by_dependencies(&self) -> Result<Vec<usize>, Error> {
        let mut id_to_index: HashMap<ModuleId, usize> = HashMap::new();
        for (index, entry) in self.pending_modules.iter().enumerate() {
            id_to_index.entry(entry.id).or_insert(index);
        }

        let n = self.pending_modules.len();
        let mut in_degree = vec![0_usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (index, entry) in self.pending_modules.iter().enumerate() {
            for dependency in entry.module.dependencies() {
                if let Some(&dependency_index) = id_to_index.get(&dependency) {
                    dependents[dependency_index].push(index);
                    in_degree[index] += 1;
                } else if !self.built_modules.iter().any(|built| built.id == dependency) {
                    return Err(Error::MissingModule {
                        module: entry.name.clone(),
                        dependency: dependency.type_name(),
                    });
                }
            }
        }

        // Kahn's algorithm, taking modules in insertion order when free.
        let mut queue: Vec<usize> = (0..n).rev().filter(|&i| in_degree[i] == 0).collect();
        let mut sorted = Vec::with_capacity(n);
        while let Some(index) = queue.pop() {
            sorted.push(index);
            for &dependent in dependents[index].iter().rev() {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push(dependent);
                }
            }
        }

        if sorted.len() != n {
            let in_cycle = in_degree
                .iter()
                .enumerate()
                .filter(|(_, degree)| **degree > 0)
                .map(|(index, _)| self.pending_modules[index].name.clone())
                .collect();
            return Err(Error::ModuleCycle(in_cycle));
        }
        Ok(sorted)
    }
}

impl core::fmt::Debug for Container {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let modules: Vec<&str> = self
            .built_modules
            .iter()
            .chain(&self.pending_modules)
            .map(|entry| entry.name.as_str())
            .collect();
        f.debug_struct("Container")
            .field("config", &self.config)
            .field("build_state", &self.build_state)
            .field("modules", &modules)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct Journal(Mutex<Vec<&'static str>>);

    impl Journal {
        fn record(&self, entry: &'static str) {
            self.0.lock().push(entry);
        }

        fn entries(&self) -> Vec<&'static str> {
            self.0.lock().clone()
        }
    }

    struct First(Arc<Journal>);
    impl Module for First {
        fn build(&self, _container: &mut Container) {
            self.0.record("first.build");
        }

        fn ready(&self, _container: &mut Container) {
            self.0.record("first.ready");
        }
    }

    struct Second(Arc<Journal>);
    impl Module for Second {
        fn build(&self, _container: &mut Container) {
            self.0.record("second.build");
        }

        fn ready(&self, _container: &mut Container) {
            self.0.record("second.ready");
        }

        fn dependencies(&self) -> Vec<ModuleId> {
            vec![ModuleId::of::<First>()]
        }
    }

    struct Cyclic;
    impl Module for Cyclic {
        fn build(&self, _container: &mut Container) {}

        fn dependencies(&self) -> Vec<ModuleId> {
            vec![ModuleId::of::<Cyclic>()]
        }
    }

    #[test]
    fn modules_build_in_dependency_order() {
        let journal = Arc::new(Journal::default());
        let mut container = Container::new();
        container
            .add_modules(Second(Arc::clone(&journal)))
            .unwrap()
            .add_modules(First(Arc::clone(&journal)))
            .unwrap();

        assert!(container.has_module::<First>());
        container.finish().unwrap();
        assert_eq!(
            journal.entries(),
            vec!["first.build", "second.build", "first.ready", "second.ready"]
        );
    }

    #[test]
    fn unique_modules_reject_duplicates() {
        let journal = Arc::new(Journal::default());
        let mut container = Container::new();
        container.add_modules(First(Arc::clone(&journal))).unwrap();

        let result = container.add_modules(First(journal));
        assert!(matches!(result, Err(Error::DuplicateModule(name)) if name.ends_with("First")));
    }

    #[test]
    fn missing_module_dependency_is_reported() {
        let mut container = Container::new();
        container
            .add_modules(Second(Arc::new(Journal::default())))
            .unwrap();

        assert!(matches!(
            container.finish(),
            Err(Error::MissingModule { dependency, .. }) if dependency.ends_with("First")
        ));
    }

    #[test]
    fn module_cycles_are_reported() {
        let mut container = Container::new();
        container.add_modules(Cyclic).unwrap();

        assert!(matches!(container.finish(), Err(Error::ModuleCycle(names)) if names.len() == 1));
    }

    #[test]
    fn finish_is_idempotent() {
        let journal = Arc::new(Journal::default());
        let mut container = Container::new();
        container.add_modules(First(Arc::clone(&journal))).unwrap();

        container.finish().unwrap();
        container.finish().unwrap();
        assert_eq!(journal.entries(), vec!["first.build", "first.ready"]);
    }

    #[test]
    fn resolving_finishes_implicitly() {
        let journal = Arc::new(Journal::default());
        let mut container = Container::new();
        container
            .add_modules(First(Arc::clone(&journal)))
            .unwrap()
            .provide_value(Arc::new(1_u32));

        assert_eq!(*container.resolve::<Arc<u32>>().unwrap(), 1);
        assert_eq!(journal.entries(), vec!["first.build", "first.ready"]);
    }

    #[test]
    fn has_checks_explicit_providers() {
        let mut container = Container::new();
        container.provide(Provider::value(Arc::new(1_u32)).tagged("a"));

        assert!(container.has::<Arc<u32>>(&Tags::new()));
        assert!(container.has::<Arc<u32>>(&Tags::from(["a"])));
        assert!(!container.has::<Arc<u32>>(&Tags::from(["b"])));
        assert!(!container.has::<Arc<String>>(&Tags::new()));
    }

    #[test]
    fn cleanup_runs_newest_first() {
        let journal = Arc::new(Journal::default());
        let mut container = Container::new();
        let first = Arc::clone(&journal);
        let second = Arc::clone(&journal);
        container
            .provide(Provider::with_cleanup(move || {
                let first = Arc::clone(&first);
                Ok::<_, Error>((Arc::new(1_u32), move || first.record("u32")))
            }))
            .provide(Provider::with_cleanup(move |_: Arc<u32>| {
                let second = Arc::clone(&second);
                Ok::<_, Error>((Arc::new(2_u64), move || second.record("u64")))
            }));

        container.resolve::<Arc<u64>>().unwrap();
        container.cleanup();
        assert_eq!(journal.entries(), vec!["u64", "u32"]);

        container.cleanup();
        assert_eq!(journal.entries().len(), 2);
    }
}
