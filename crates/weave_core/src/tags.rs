//! Tag sets for disambiguating providers of the same type.
//!
//! A provider carries a set of string labels. A lookup carries a set of
//! labels too, and a provider matches when both sets are equal. An empty
//! lookup is unfiltered and matches every provider of the type.
//!
//! ```
//! use weave_core::tags::Tags;
//!
//! let provider = Tags::from(["primary", "postgres"]);
//!
//! assert!(provider.matches(&Tags::new()));
//! assert!(provider.matches(&Tags::from(["postgres", "primary"])));
//! assert!(!provider.matches(&Tags::from(["primary"])));
//! ```

use std::collections::BTreeSet;
use std::fmt;

/// Compile-time tag used with [`Tagged`](crate::param::Tagged).
///
/// ```
/// use weave_core::tags::Tag;
///
/// struct Primary;
///
/// impl Tag for Primary {
///     const NAME: &'static str = "primary";
/// }
/// ```
pub trait Tag: 'static {
    /// The label this marker stands for.
    const NAME: &'static str;
}

/// An unordered set of labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    /// Creates an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns this set with `tag` added.
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>) -> Self {
        self.insert(tag);
        self
    }

    /// Adds a tag. Returns `false` if it was already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        self.0.insert(tag.into())
    }

    /// Returns `true` if the set carries `tag`.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    /// Returns `true` if `query` is empty or equal to this set.
    #[must_use]
    pub fn matches(&self, query: &Tags) -> bool {
        query.0.is_empty() || self.0 == query.0
    }

    /// Iterates the tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Tags {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Tags {
    fn from(tags: [S; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        f.write_str("[")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(tag)?;
        }
        f.write_str("]")
    }
}
