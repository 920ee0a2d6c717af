//! Field injection for structs.
//!
//! A struct that implements [`Inject`] can be resolved without a registered
//! provider: the registry synthesizes a node whose dependencies are the
//! struct's fields, resolves each field independently, and assembles the
//! struct from the field values.
//!
//! Implement it with `#[derive(Inject)]`:
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//!
//! struct Database;
//! struct Cache;
//!
//! #[derive(Clone, Inject)]
//! struct Handlers {
//!     db: Arc<Database>,
//!     #[inject(tag = "hot")]
//!     cache: Arc<Cache>,
//! }
//!
//! let mut container = Container::new();
//! container
//!     .provide(Provider::new(|| Arc::new(Database)))
//!     .provide(Provider::new(|| Arc::new(Cache)).tagged("hot"));
//!
//! let handlers = container.resolve_injected::<Handlers>().unwrap();
//! assert!(Arc::ptr_eq(&handlers.db, &container.resolve::<Arc<Database>>().unwrap()));
//! ```
//!
//! Only the struct itself is injectable. Requesting a pointer to it, for
//! example through [`TypeKey::pointer`](crate::key::TypeKey::pointer), fails
//! with [`Error::UnsupportedInjection`](crate::error::Error::UnsupportedInjection).

use core::any::type_name;
use core::slice;
use std::sync::Arc;

use crate::error::Error;
use crate::key::Dependency;
use crate::node::Instance;
use crate::param::Param;

/// A struct whose value is assembled from independently resolved fields.
pub trait Inject: Clone + Send + Sync + 'static {
    /// Declared field dependencies, in field order.
    fn dependencies() -> Vec<Dependency>;

    /// Builds the struct from resolved field values.
    ///
    /// # Errors
    ///
    /// Returns an error if a field value is missing or has the wrong type.
    fn inject(fields: &mut Fields<'_>) -> Result<Self, Error>;
}

/// Cursor over resolved field values, consumed in declared order.
pub struct Fields<'a> {
    values: slice::Iter<'a, Instance>,
}

impl<'a> Fields<'a> {
    /// Creates a cursor over `values`.
    #[must_use]
    pub fn new(values: &'a [Instance]) -> Self {
        Self {
            values: values.iter(),
        }
    }

    /// Extracts the next field as `P`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] when no values remain, or the
    /// extraction error of `P`.
    pub fn next<P: Param>(&mut self) -> Result<P, Error> {
        let value = self.values.next().ok_or(Error::MissingArgument {
            expected: type_name::<P>(),
        })?;
        P::extract(value)
    }

    /// Number of values not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

pub(crate) fn assemble<S: Inject>(values: Vec<Instance>) -> Result<Instance, Error> {
    let mut fields = Fields::new(&values);
    let value = S::inject(&mut fields)?;
    Ok(Arc::new(value))
}
