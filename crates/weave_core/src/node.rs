//! Resolvable nodes and their compilation strategies.
//!
//! A [`Node`] is one unit of the dependency graph: a type, the tags it was
//! registered with, a [`Compiler`] describing what it depends on and how its
//! value is produced, and a memo slot for that value.
//!
//! The compiler separates *what a node depends on* ([`Requirements`]) from
//! *how its value is produced* ([`Compiler::produce`]), so the graph can be
//! walked without running user factories.

use core::any::{Any, type_name};
use core::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::key::{Collect, Dependency, TypeKey};
use crate::tags::Tags;

/// A constructed value, type-erased. Holds a handle of the node's type.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A deferred teardown procedure emitted by a factory.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// Produces a constructor node's value from its resolved inputs.
pub type ConstructFn = Box<dyn Fn(Arguments) -> Result<Produced, Error> + Send + Sync>;

/// Converts the value of an alias target into the alias' handle type.
pub type CastFn = Box<dyn Fn(&Instance) -> Result<Instance, Error> + Send + Sync>;

/// Downcasts an instance to handle `H` and clones the handle out.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] if the instance does not hold an `H`.
pub fn downcast<H: Clone + 'static>(instance: &Instance) -> Result<H, Error> {
    instance
        .downcast_ref::<H>()
        .cloned()
        .ok_or(Error::TypeMismatch {
            expected: type_name::<H>(),
        })
}

/// Index of a node in its [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Resolved inputs handed to a compiler.
pub struct Arguments {
    params: Vec<Instance>,
    fields: Vec<Instance>,
}

impl Arguments {
    /// Bundles resolved parameter and field values.
    #[must_use]
    pub fn new(params: Vec<Instance>, fields: Vec<Instance>) -> Self {
        Self { params, fields }
    }

    /// Values of the declared parameters, in declared order.
    #[must_use]
    pub fn params(&self) -> &[Instance] {
        &self.params
    }

    /// Values of the declared fields, in declared order.
    #[must_use]
    pub fn fields(&self) -> &[Instance] {
        &self.fields
    }

    /// Consumes the arguments, keeping the field values.
    #[must_use]
    pub fn into_fields(self) -> Vec<Instance> {
        self.fields
    }
}

/// Output of a compiler: the value and an optional cleanup callback.
pub struct Produced {
    pub(crate) value: Instance,
    pub(crate) cleanup: Option<Cleanup>,
}

impl Produced {
    /// Wraps a constructed value.
    #[must_use]
    pub fn new(value: Instance) -> Self {
        Self {
            value,
            cleanup: None,
        }
    }

    /// Attaches a cleanup callback to run at session teardown.
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: impl FnOnce() + Send + 'static) -> Self {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Compiler
// ─────────────────────────────────────────────────────────────────────────────

/// What a compiler needs resolved before it can produce a value.
pub enum Requirements<'a> {
    /// Nodes bound when the compiler was created.
    Nodes(&'a [NodeId]),
    /// Dependencies to look up in the registry.
    Lookups(&'a [Dependency]),
}

/// Strategy that produces a node's value.
///
/// | Variant | Requirements | Produced value |
/// |---------|--------------|----------------|
/// | `Alias` | the wrapped node | the wrapped node's value, cast to the alias handle |
/// | `Constructor` | one lookup per declared input | whatever the factory returns |
/// | `Group` | the member nodes | `Vec` of the members' values, in member order |
pub enum Compiler {
    /// Passthrough of another node, e.g. an interface binding.
    Alias {
        /// The wrapped node.
        target: NodeId,
        /// Conversion into the alias handle type.
        cast: CastFn,
    },
    /// Invocation of a registered factory.
    Constructor {
        /// Declared inputs, in call order.
        params: Vec<Dependency>,
        /// The factory.
        construct: ConstructFn,
    },
    /// Aggregation of several providers into a sequence.
    Group {
        /// Member nodes in registration order, fixed when the group is synthesized.
        members: Vec<NodeId>,
        /// Typed collector for the member values.
        #[doc(hidden)]
        collect: Collect,
    },
}

impl Compiler {
    /// Creates an alias of `target`.
    #[must_use]
    pub fn alias(target: NodeId, cast: CastFn) -> Self {
        Self::Alias { target, cast }
    }

    /// Creates a constructor over `params`.
    #[must_use]
    pub fn constructor(params: Vec<Dependency>, construct: ConstructFn) -> Self {
        Self::Constructor { params, construct }
    }

    pub(crate) fn group(members: Vec<NodeId>, collect: Collect) -> Self {
        Self::Group { members, collect }
    }

    /// Returns what must be resolved before [`produce`](Self::produce) runs.
    #[must_use]
    pub fn requirements(&self) -> Requirements<'_> {
        match self {
            Self::Alias { target, .. } => Requirements::Nodes(core::slice::from_ref(target)),
            Self::Constructor { params, .. } => Requirements::Lookups(params),
            Self::Group { members, .. } => Requirements::Nodes(members),
        }
    }

    /// Produces a value from resolved requirements and fields.
    ///
    /// # Errors
    ///
    /// Propagates factory failures unchanged, and reports
    /// [`Error::MissingArgument`] or [`Error::TypeMismatch`] if the
    /// arguments do not fit the compiler.
    pub fn produce(&self, args: Arguments) -> Result<Produced, Error> {
        match self {
            Self::Alias { cast, .. } => {
                let target = args.params.first().ok_or(Error::MissingArgument {
                    expected: "alias target",
                })?;
                Ok(Produced::new(cast(target)?))
            }
            Self::Constructor { construct, .. } => construct(args),
            Self::Group { collect, .. } => Ok(Produced::new(collect(args.params)?)),
        }
    }

    /// Short name of the strategy, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Alias { .. } => "alias",
            Self::Constructor { .. } => "constructor",
            Self::Group { .. } => "group",
        }
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias { target, .. } => f.debug_struct("Alias").field("target", target).finish(),
            Self::Constructor { params, .. } => f
                .debug_struct("Constructor")
                .field("params", params)
                .finish(),
            Self::Group { members, .. } => {
                f.debug_struct("Group").field("members", members).finish()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────────────────────────────────────

/// One resolvable unit: type, tags, compiler and memoized value.
pub struct Node {
    key: TypeKey,
    tags: Tags,
    compiler: Compiler,
    fields: Vec<Dependency>,
    pub(crate) value: Option<Instance>,
}

impl Node {
    /// Creates an uncomputed node.
    #[must_use]
    pub fn new(key: TypeKey, tags: Tags, compiler: Compiler) -> Self {
        Self {
            key,
            tags,
            compiler,
            fields: Vec::new(),
            value: None,
        }
    }

    /// Declares struct-field dependencies, resolved independently of the
    /// compiler's parameters and handed to it as [`Arguments::fields`].
    #[must_use]
    pub fn with_fields(mut self, fields: Vec<Dependency>) -> Self {
        self.fields = fields;
        self
    }

    /// The node's type.
    #[must_use]
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// The node's tags.
    #[must_use]
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// The node's compiler.
    #[must_use]
    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Declared field dependencies, possibly empty.
    #[must_use]
    pub fn fields(&self) -> &[Dependency] {
        &self.fields
    }

    /// Returns `true` once the value has been constructed.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.value.is_some()
    }

    /// Human-readable identity: type name followed by tags.
    #[must_use]
    pub fn identity(&self) -> String {
        self.key.render(&self.tags)
    }

    /// Appends `member` to a group node and forgets the memoized sequence.
    /// Returns `false` for other compilers.
    pub(crate) fn push_member(&mut self, member: NodeId) -> bool {
        let Compiler::Group { members, .. } = &mut self.compiler else {
            return false;
        };
        members.push(member);
        self.value = None;
        true
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.key.name(), self.tags)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("tags", &self.tags)
            .field("compiler", &self.compiler)
            .field("fields", &self.fields)
            .field("computed", &self.is_computed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(value: u32) -> Compiler {
        let instance: Instance = Arc::new(value);
        Compiler::constructor(
            Vec::new(),
            Box::new(move |_| Ok(Produced::new(Arc::clone(&instance)))),
        )
    }

    #[test]
    fn identity_renders_type_and_tags() {
        let node = Node::new(TypeKey::of::<u32>(), Tags::from(["a"]), constant(1));
        assert_eq!(node.identity(), "u32[a]");
        assert_eq!(node.to_string(), "u32[a]");
        assert!(!node.is_computed());
    }

    #[test]
    fn alias_casts_target_value() {
        let alias = Compiler::alias(
            NodeId(0),
            Box::new(|instance| {
                let value = downcast::<u32>(instance)?;
                Ok(Arc::new(u64::from(value)) as Instance)
            }),
        );

        let produced = alias
            .produce(Arguments::new(vec![Arc::new(7_u32)], Vec::new()))
            .unwrap();
        assert_eq!(downcast::<u64>(&produced.value).unwrap(), 7);
        assert!(matches!(alias.requirements(), Requirements::Nodes([NodeId(0)])));
    }

    #[test]
    fn alias_without_target_value_fails() {
        let alias = Compiler::alias(NodeId(0), Box::new(|instance| Ok(Arc::clone(instance))));
        let result = alias.produce(Arguments::new(Vec::new(), Vec::new()));
        assert!(matches!(result, Err(Error::MissingArgument { .. })));
    }

    #[test]
    fn constructor_reports_lookups() {
        let compiler = Compiler::constructor(
            vec![Dependency::of::<u32>()],
            Box::new(|args| Ok(Produced::new(Arc::clone(&args.params()[0])))),
        );

        let Requirements::Lookups(lookups) = compiler.requirements() else {
            panic!("constructor must request lookups");
        };
        assert_eq!(lookups, &[Dependency::of::<u32>()]);
        assert_eq!(compiler.kind(), "constructor");
    }

    #[test]
    fn push_member_only_extends_groups() {
        let collect: Collect = |members| Ok(Arc::new(members.len()) as Instance);
        let mut group = Node::new(
            TypeKey::of::<Vec<u32>>(),
            Tags::new(),
            Compiler::group(vec![NodeId(0)], collect),
        );
        group.value = Some(Arc::new(1_usize));

        assert!(group.push_member(NodeId(3)));
        assert!(!group.is_computed());
        assert!(matches!(
            group.compiler().requirements(),
            Requirements::Nodes([NodeId(0), NodeId(3)])
        ));

        let mut constructor = Node::new(TypeKey::of::<u32>(), Tags::new(), constant(1));
        assert!(!constructor.push_member(NodeId(3)));
    }

    #[test]
    fn produced_carries_cleanup() {
        let produced = Produced::new(Arc::new(1_u32)).with_cleanup(|| {});
        assert!(produced.cleanup.is_some());
    }

    #[test]
    fn downcast_mismatch() {
        let instance: Instance = Arc::new(1_u32);
        assert!(matches!(
            downcast::<String>(&instance),
            Err(Error::TypeMismatch { expected }) if expected.contains("String")
        ));
    }
}
