//! Thread-safe handle to a container.
//!
//! The registry memoizes values and collects cleanups in place, so it needs
//! exclusive access. [`SharedContainer`] serializes every operation behind a
//! single lock; concurrent resolutions of the same node still construct it
//! exactly once.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::container::Container;
use crate::error::Error;
use crate::factory::Factory;
use crate::inject::Inject;
use crate::param::Param;
use crate::tags::Tags;

/// A cloneable, lockable [`Container`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use weave_core::prelude::*;
///
/// struct Pool;
///
/// let mut container = Container::new();
/// container.provide(Provider::new(|| Arc::new(Pool)));
/// let shared = SharedContainer::new(container);
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let shared = shared.clone();
///         thread::spawn(move || shared.resolve::<Arc<Pool>>().unwrap())
///     })
///     .collect();
///
/// let pools: Vec<Arc<Pool>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
/// assert!(pools.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
/// ```
#[derive(Debug, Clone)]
pub struct SharedContainer {
    inner: Arc<Mutex<Container>>,
}

impl SharedContainer {
    /// Wraps a container.
    #[must_use]
    pub fn new(container: Container) -> Self {
        Self {
            inner: Arc::new(Mutex::new(container)),
        }
    }

    /// Locks the container for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, Container> {
        self.inner.lock()
    }

    /// See [`Container::resolve`].
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve<P: Param>(&self) -> Result<P, Error> {
        self.inner.lock().resolve()
    }

    /// See [`Container::resolve_tagged`].
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve_tagged<P: Param>(&self, tags: &Tags) -> Result<P, Error> {
        self.inner.lock().resolve_tagged(tags)
    }

    /// See [`Container::resolve_group`].
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve_group<H: Clone + Send + Sync + 'static>(
        &self,
        tags: &Tags,
    ) -> Result<Vec<H>, Error> {
        self.inner.lock().resolve_group(tags)
    }

    /// See [`Container::resolve_injected`].
    ///
    /// # Errors
    ///
    /// Returns the first field's error.
    pub fn resolve_injected<S: Inject>(&self) -> Result<S, Error> {
        self.inner.lock().resolve_injected()
    }

    /// See [`Container::invoke`]. The lock is held while `factory` runs.
    ///
    /// # Errors
    ///
    /// Returns the first argument's error.
    pub fn invoke<M, F: Factory<M>>(&self, factory: F) -> Result<F::Output, Error> {
        self.inner.lock().invoke(factory)
    }

    /// See [`Container::cleanup`].
    pub fn cleanup(&self) {
        self.inner.lock().cleanup();
    }
}

impl From<Container> for SharedContainer {
    fn from(container: Container) -> Self {
        Self::new(container)
    }
}
