//! Type tokens and declared dependencies.
//!
//! A [`TypeKey`] identifies a static type the way [`TypeId`] does, and
//! additionally records the *shape* the registry should fall back to when no
//! explicit provider of that type exists:
//!
//! | Constructor | Shape | Fallback in [`Registry::find`](crate::registry::Registry::find) |
//! |-------------|-------|----------------------------------------|
//! | [`TypeKey::of`] | plain | none, lookup fails |
//! | [`TypeKey::group`] | sequence of `H` | aggregate every matching `H` provider |
//! | [`TypeKey::injectable`] | field-injectable struct | synthesize a node from its fields |
//! | [`TypeKey::pointer`] | pointer to an injectable struct | rejected, request the pointee |
//!
//! Two keys are equal iff they denote the same type, regardless of shape.

use core::any::{TypeId, type_name};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Deref;
use std::sync::Arc;

use crate::error::Error;
use crate::inject::{Inject, assemble};
use crate::node::{Instance, downcast};
use crate::tags::Tags;

/// Builds the value of a group node from its members' values.
pub type Collect = fn(Vec<Instance>) -> Result<Instance, Error>;

/// Builds the value of a field-injected node from its field values.
pub type Assemble = fn(Vec<Instance>) -> Result<Instance, Error>;

/// Fallback behavior of a type that has no explicit provider.
#[derive(Clone, Copy)]
pub(crate) enum Shape {
    Plain,
    Group {
        element: TypeId,
        element_name: &'static str,
        collect: Collect,
    },
    Injectable {
        fields: fn() -> Vec<Dependency>,
        assemble: Assemble,
    },
    Pointer {
        pointee: &'static str,
    },
}

/// Comparable, hashable token for a static type.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weave_core::key::TypeKey;
///
/// struct Logger;
///
/// assert_eq!(TypeKey::of::<Arc<Logger>>(), TypeKey::of::<Arc<Logger>>());
/// assert_ne!(TypeKey::of::<Arc<Logger>>(), TypeKey::group::<Arc<Logger>>());
/// assert!(TypeKey::group::<Arc<Logger>>().is_group());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    shape: Shape,
}

impl TypeKey {
    /// Creates a plain key for handle type `H`.
    #[must_use]
    pub fn of<H: Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<H>(),
            name: type_name::<H>(),
            shape: Shape::Plain,
        }
    }

    /// Creates the key of `Vec<H>`, resolved as a group of every matching
    /// `H` provider when `Vec<H>` itself has no provider.
    #[must_use]
    pub fn group<H: Clone + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<Vec<H>>(),
            name: type_name::<Vec<H>>(),
            shape: Shape::Group {
                element: TypeId::of::<H>(),
                element_name: type_name::<H>(),
                collect: collect_group::<H>,
            },
        }
    }

    /// Creates the key of a field-injectable struct.
    #[must_use]
    pub fn injectable<S: Inject>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: type_name::<S>(),
            shape: Shape::Injectable {
                fields: S::dependencies,
                assemble: assemble::<S>,
            },
        }
    }

    /// Creates the key of a pointer `P` to a field-injectable struct.
    ///
    /// Field injection never fills a pointer: unless `P` has an explicit
    /// provider, resolving this key fails with
    /// [`Error::UnsupportedInjection`].
    #[must_use]
    pub fn pointer<P>() -> Self
    where
        P: Deref + Send + Sync + 'static,
        P::Target: Inject,
    {
        Self {
            id: TypeId::of::<P>(),
            name: type_name::<P>(),
            shape: Shape::Pointer {
                pointee: type_name::<P::Target>(),
            },
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the type name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if this key requests a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.shape, Shape::Group { .. })
    }

    /// Returns `true` if this key denotes a field-injectable struct.
    #[must_use]
    pub fn is_injectable(&self) -> bool {
        matches!(self.shape, Shape::Injectable { .. })
    }

    pub(crate) fn shape(&self) -> Shape {
        self.shape
    }

    /// Renders this key with `tags` the way error messages and graph
    /// vertices show it, e.g. `app::Logger[primary]`.
    #[must_use]
    pub fn render(&self, tags: &Tags) -> String {
        format!("{}{}", self.name, tags)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self.shape {
            Shape::Plain => "plain",
            Shape::Group { .. } => "group",
            Shape::Injectable { .. } => "injectable",
            Shape::Pointer { .. } => "pointer",
        };
        f.debug_struct("TypeKey")
            .field("name", &self.name)
            .field("shape", &shape)
            .finish()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

fn collect_group<H: Clone + Send + Sync + 'static>(
    members: Vec<Instance>,
) -> Result<Instance, Error> {
    let values = members
        .iter()
        .map(downcast::<H>)
        .collect::<Result<Vec<H>, Error>>()?;
    Ok(Arc::new(values))
}

// ─────────────────────────────────────────────────────────────────────────────
// Dependency
// ─────────────────────────────────────────────────────────────────────────────

/// A declared input of a node: the type to look up and the tags to match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    key: TypeKey,
    tags: Tags,
}

impl Dependency {
    /// Creates an untagged dependency on `key`.
    #[must_use]
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            tags: Tags::new(),
        }
    }

    /// Depends on the single provider of handle `H`.
    #[must_use]
    pub fn of<H: Send + Sync + 'static>() -> Self {
        Self::new(TypeKey::of::<H>())
    }

    /// Depends on every provider of `H`, collected into a `Vec<H>`.
    #[must_use]
    pub fn group<H: Clone + Send + Sync + 'static>() -> Self {
        Self::new(TypeKey::group::<H>())
    }

    /// Depends on the field-injected struct `S`.
    #[must_use]
    pub fn injectable<S: Inject>() -> Self {
        Self::new(TypeKey::injectable::<S>())
    }

    /// Depends on a pointer `P` to a field-injectable struct.
    #[must_use]
    pub fn pointer<P>() -> Self
    where
        P: Deref + Send + Sync + 'static,
        P::Target: Inject,
    {
        Self::new(TypeKey::pointer::<P>())
    }

    /// Adds a tag the provider must carry.
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag);
        self
    }

    /// Replaces the tag filter.
    #[must_use]
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Returns the requested type.
    #[must_use]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Returns the tag filter.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.key.name, self.tags)
    }
}
