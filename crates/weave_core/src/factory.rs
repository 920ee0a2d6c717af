//! Conversion of plain functions into factories.
//!
//! Any `Fn` of up to twelve [`Param`] arguments is a [`Factory`]. Its
//! argument types become the declared dependencies of the node it backs,
//! and calling it extracts each argument from the resolved values in
//! declared order.
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::factory::Factory;
//! use weave_core::key::Dependency;
//!
//! struct Logger;
//! struct Service {
//!     logger: Arc<Logger>,
//! }
//!
//! let factory = |logger: Arc<Logger>| Arc::new(Service { logger });
//! assert_eq!(factory.dependencies(), vec![Dependency::of::<Arc<Logger>>()]);
//! ```

use core::any::type_name;

use variadics_please::all_tuples;

use crate::error::Error;
use crate::key::Dependency;
use crate::node::Instance;
use crate::param::Param;

/// A function whose arguments are resolved from the container.
///
/// `Marker` disambiguates the blanket implementations for each arity and is
/// always inferred.
pub trait Factory<Marker>: Send + Sync + 'static {
    /// The value the function returns.
    type Output;

    /// Dependencies of the arguments, in argument order.
    fn dependencies(&self) -> Vec<Dependency>;

    /// Calls the function with arguments extracted from `args`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArgument`] if `args` does not hold exactly one
    /// value per argument, or the extraction error of an argument.
    fn call(&self, args: &[Instance]) -> Result<Self::Output, Error>;
}

macro_rules! impl_factory {
    ($(($P:ident, $p:ident)),*) => {
        impl<Func, Out, $($P: Param),*> Factory<fn($($P,)*) -> Out> for Func
        where
            Func: Fn($($P),*) -> Out + Send + Sync + 'static,
        {
            type Output = Out;

            fn dependencies(&self) -> Vec<Dependency> {
                vec![$($P::dependency()),*]
            }

            fn call(&self, args: &[Instance]) -> Result<Out, Error> {
                let [$($p),*] = args else {
                    return Err(Error::MissingArgument {
                        expected: type_name::<Func>(),
                    });
                };
                Ok((self)($($P::extract($p)?),*))
            }
        }
    };
}

// Functions of 0 to 12 arguments
all_tuples!(impl_factory, 0, 12, P, p);
