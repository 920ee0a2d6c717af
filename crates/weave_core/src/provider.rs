//! Provider registrations.
//!
//! A [`Provider`] describes how to construct one handle type `H`: a factory
//! (or literal value), the tags it is registered under, and the interface
//! handles it should also be reachable as.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//!
//! trait Store: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//!
//! struct Memory;
//! impl Store for Memory {
//!     fn name(&self) -> &str {
//!         "memory"
//!     }
//! }
//!
//! let mut container = Container::new();
//! container.provide(
//!     Provider::new(|| Arc::new(Memory))
//!         .tagged("default")
//!         .bind(|memory: Arc<Memory>| memory as Arc<dyn Store>),
//! );
//!
//! let store = container.resolve::<Arc<dyn Store>>().unwrap();
//! assert_eq!(store.name(), "memory");
//! ```

use core::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::error::{BoxError, Error};
use crate::factory::Factory;
use crate::key::{Dependency, TypeKey};
use crate::node::{CastFn, Compiler, ConstructFn, Instance, Node, NodeId, Produced, downcast};
use crate::registry::Registry;
use crate::tags::Tags;

/// An alias node registered next to the provider's own node.
struct Binding {
    key: TypeKey,
    cast: CastFn,
}

/// Registration of a handle type `H`.
///
/// The factory runs at most once per container: its result is memoized and
/// every consumer receives a clone of the same handle.
pub struct Provider<H> {
    tags: Tags,
    params: Vec<Dependency>,
    construct: ConstructFn,
    bindings: Vec<Binding>,
    _handle: PhantomData<fn() -> H>,
}

impl<H: Clone + Send + Sync + 'static> Provider<H> {
    fn from_parts(params: Vec<Dependency>, construct: ConstructFn) -> Self {
        Self {
            tags: Tags::new(),
            params,
            construct,
            bindings: Vec::new(),
            _handle: PhantomData,
        }
    }

    /// Provides the result of an infallible factory.
    pub fn new<M, F>(factory: F) -> Self
    where
        F: Factory<M, Output = H>,
    {
        let params = factory.dependencies();
        Self::from_parts(
            params,
            Box::new(move |args| {
                let handle = factory.call(args.params())?;
                Ok(Produced::new(Arc::new(handle)))
            }),
        )
    }

    /// Provides the result of a fallible factory.
    ///
    /// A factory error aborts the resolution and is returned to the caller
    /// as [`Error::Factory`], unchanged.
    pub fn try_new<M, F, E>(factory: F) -> Self
    where
        F: Factory<M, Output = Result<H, E>>,
        E: Into<BoxError>,
    {
        let params = factory.dependencies();
        Self::from_parts(
            params,
            Box::new(move |args| {
                let handle = factory
                    .call(args.params())?
                    .map_err(|error| Error::Factory(error.into()))?;
                Ok(Produced::new(Arc::new(handle)))
            }),
        )
    }

    /// Provides the result of a fallible factory that also returns a cleanup
    /// callback.
    ///
    /// Cleanups are collected in construction order and run by
    /// [`Container::cleanup`](crate::container::Container::cleanup).
    pub fn with_cleanup<M, F, C, E>(factory: F) -> Self
    where
        F: Factory<M, Output = Result<(H, C), E>>,
        C: FnOnce() + Send + 'static,
        E: Into<BoxError>,
    {
        let params = factory.dependencies();
        Self::from_parts(
            params,
            Box::new(move |args| {
                let (handle, cleanup) = factory
                    .call(args.params())?
                    .map_err(|error| Error::Factory(error.into()))?;
                Ok(Produced::new(Arc::new(handle)).with_cleanup(cleanup))
            }),
        )
    }

    /// Provides an already constructed handle.
    pub fn value(handle: H) -> Self {
        Self::from_parts(
            Vec::new(),
            Box::new(move |_| Ok(Produced::new(Arc::new(handle.clone())))),
        )
    }

    /// Registers the provider under an additional tag.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Also makes the provider resolvable as handle `I`.
    ///
    /// The alias shares the provider's tags and its memoized value, so
    /// `Arc<Impl>` and the `Arc<dyn Trait>` bound from it point to the same
    /// object.
    #[must_use]
    pub fn bind<I>(mut self, cast: impl Fn(H) -> I + Send + Sync + 'static) -> Self
    where
        I: Send + Sync + 'static,
    {
        self.bindings.push(Binding {
            key: TypeKey::of::<I>(),
            cast: Box::new(move |instance| {
                let handle = downcast::<H>(instance)?;
                Ok(Arc::new(cast(handle)) as Instance)
            }),
        });
        self
    }

    /// Tags the provider is registered under.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Declared factory dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.params
    }

    /// Registers the provider and its bindings, returning the provider's node.
    pub(crate) fn register(self, registry: &mut Registry) -> NodeId {
        let key = TypeKey::of::<H>();
        debug!(
            provider = %key.render(&self.tags),
            bindings = self.bindings.len(),
            "registering provider"
        );

        let node = Node::new(
            key,
            self.tags.clone(),
            Compiler::constructor(self.params, self.construct),
        );
        let id = registry.register(node);
        for Binding { key, cast } in self.bindings {
            registry.register(Node::new(key, self.tags.clone(), Compiler::alias(id, cast)));
        }
        id
    }
}
