//! Factory parameters.
//!
//! Every argument of a factory and every field of an injectable struct is a
//! [`Param`]: it declares the [`Dependency`] the registry must resolve for it,
//! and knows how to extract itself from the resolved [`Instance`].
//!
//! | Parameter | Resolves |
//! |-----------|----------|
//! | `Arc<T>` | the single provider of `Arc<T>` |
//! | `Vec<Arc<T>>` | every provider of `Arc<T>`, in registration order |
//! | [`Injected<S>`] | the field-injected struct `S` |
//! | [`Tagged<P, G>`] | `P`, restricted to providers tagged [`G::NAME`](Tag::NAME) |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//!
//! struct Primary;
//! impl Tag for Primary {
//!     const NAME: &'static str = "primary";
//! }
//!
//! struct Pool(&'static str);
//!
//! let mut container = Container::new();
//! container
//!     .provide(Provider::value(Arc::new(Pool("primary"))).tagged("primary"))
//!     .provide(Provider::value(Arc::new(Pool("replica"))).tagged("replica"));
//!
//! let name = container
//!     .invoke(|pool: Tagged<Arc<Pool>, Primary>| pool.0)
//!     .unwrap();
//! assert_eq!(name, "primary");
//! ```

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;
use std::sync::Arc;

use crate::error::Error;
use crate::inject::Inject;
use crate::key::Dependency;
use crate::node::{Instance, downcast};
use crate::tags::Tag;

/// A value that can be injected into a factory or struct field.
pub trait Param: Sized + Send + 'static {
    /// The dependency resolved for this parameter.
    fn dependency() -> Dependency;

    /// Extracts the parameter from its resolved value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the value has the wrong type.
    fn extract(instance: &Instance) -> Result<Self, Error>;
}

impl<T: ?Sized + Send + Sync + 'static> Param for Arc<T> {
    fn dependency() -> Dependency {
        Dependency::of::<Arc<T>>()
    }

    fn extract(instance: &Instance) -> Result<Self, Error> {
        downcast::<Arc<T>>(instance)
    }
}

impl<T: ?Sized + Send + Sync + 'static> Param for Vec<Arc<T>> {
    fn dependency() -> Dependency {
        Dependency::group::<Arc<T>>()
    }

    fn extract(instance: &Instance) -> Result<Self, Error> {
        downcast::<Vec<Arc<T>>>(instance)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Injected
// ─────────────────────────────────────────────────────────────────────────────

/// A field-injected struct, resolved from its fields.
#[derive(Debug, Clone)]
pub struct Injected<S>(pub S);

impl<S> Injected<S> {
    /// Unwraps the struct.
    pub fn into_inner(self) -> S {
        self.0
    }
}

impl<S> Deref for Injected<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.0
    }
}

impl<S: Inject> Param for Injected<S> {
    fn dependency() -> Dependency {
        Dependency::injectable::<S>()
    }

    fn extract(instance: &Instance) -> Result<Self, Error> {
        downcast::<S>(instance).map(Injected)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tagged
// ─────────────────────────────────────────────────────────────────────────────

/// Parameter `P` restricted to providers tagged with `G::NAME`.
///
/// Nest `Tagged` to require several tags.
pub struct Tagged<P, G> {
    inner: P,
    _tag: PhantomData<fn() -> G>,
}

impl<P, G> Tagged<P, G> {
    /// Unwraps the parameter.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: Clone, G> Clone for Tagged<P, G> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _tag: PhantomData,
        }
    }
}

impl<P: fmt::Debug, G: Tag> fmt::Debug for Tagged<P, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tagged")
            .field("tag", &G::NAME)
            .field("inner", &self.inner)
            .finish()
    }
}

impl<P, G> Deref for Tagged<P, G> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.inner
    }
}

impl<P: Param, G: Tag> Param for Tagged<P, G> {
    fn dependency() -> Dependency {
        P::dependency().tagged(G::NAME)
    }

    fn extract(instance: &Instance) -> Result<Self, Error> {
        Ok(Self {
            inner: P::extract(instance)?,
            _tag: PhantomData,
        })
    }
}
