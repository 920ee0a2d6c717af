//! The node registry.
//!
//! The [`Registry`] owns every [`Node`] of a resolution session in an arena
//! and indexes explicit registrations by type. Lookups resolve a
//! [`TypeKey`] and a tag query to exactly one node, in this order:
//!
//! 1. **Explicit providers** of the type, filtered by tag match. No match is
//!    [`Error::NotFound`], more than one is [`Error::Ambiguous`].
//! 2. **Group**: a `Vec<H>` key with no explicit provider aggregates every
//!    matching `H` provider, in registration order. No member is
//!    [`Error::NotFound`].
//! 3. **Field injection**: an [`Inject`](crate::inject::Inject) struct with
//!    no explicit provider is assembled from its fields.
//! 4. Otherwise [`Error::UnsupportedInjection`] for pointers to injectable
//!    structs and [`Error::NotRegistered`] for everything else.
//!
//! Synthesized group and field-injection nodes live in the same arena as
//! registered ones and are cached, so repeated lookups return the same node.
//!
//! Values are constructed lazily by [`Registry::value`] and memoized for the
//! lifetime of the registry. Before the first construction the registry
//! proves that the dependency graph is acyclic (see [`Registry::check_acyclic`]),
//! so a cyclic configuration fails before any factory runs.

mod acyclic;

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::error::Error;
use crate::key::{Assemble, Collect, Dependency, Shape, TypeKey};
use crate::node::{Arguments, Cleanup, Compiler, Instance, Node, NodeId, Produced, Requirements};
use crate::tags::Tags;

use acyclic::Visit;

/// How much of the graph the first acyclicity check walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Walk every node, so any broken provider surfaces at the first
    /// resolution.
    #[default]
    Whole,
    /// Walk only the subgraph reachable from the requested node.
    Reachable,
}

/// Whether an edge comes from a factory parameter or a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Declared by the node's compiler.
    Param,
    /// Declared as a struct field.
    Field,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param => f.write_str("param"),
            Self::Field => f.write_str("field"),
        }
    }
}

/// One edge of the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    /// The node depended upon.
    pub dependency: NodeId,
    /// The node that depends on it.
    pub dependent: NodeId,
    /// Where the dependency was declared.
    pub kind: EdgeKind,
}

/// Arena of nodes with lookup, memoized construction and cleanup tracking.
#[derive(Default)]
pub struct Registry {
    nodes: Vec<Node>,
    /// Explicitly registered nodes per type, in registration order.
    providers: HashMap<TypeId, Vec<NodeId>>,
    injected: HashMap<TypeId, NodeId>,
    groups: HashMap<(TypeId, Tags), NodeId>,
    cleanups: Vec<Cleanup>,
    /// Nodes proven acyclic since the last registration.
    acyclic: HashMap<NodeId, Visit>,
    /// Whether the whole-graph walk already ran since the last registration.
    whole_walked: bool,
    validation: Validation,
}

impl Registry {
    /// Creates an empty registry with the given validation mode.
    #[must_use]
    pub fn new(validation: Validation) -> Self {
        Self {
            validation,
            ..Self::default()
        }
    }

    /// Returns the validation mode.
    #[must_use]
    pub fn validation(&self) -> Validation {
        self.validation
    }

    /// Adds an explicitly registered node.
    ///
    /// Several nodes may share a type; they are told apart by tags at lookup
    /// time. Cached groups the node matches gain it as their last member, and
    /// the acyclicity proof is discarded.
    pub fn register(&mut self, node: Node) -> NodeId {
        let type_id = node.key().type_id();
        let id = self.insert(node);
        self.providers.entry(type_id).or_default().push(id);
        self.extend_groups(id);
        self.acyclic.clear();
        self.whole_walked = false;
        id
    }

    fn extend_groups(&mut self, id: NodeId) {
        let member = &self.nodes[id.0];
        let (type_id, tags) = (member.key().type_id(), member.tags().clone());
        for group in self.groups.values() {
            let node = &mut self.nodes[group.0];
            let Shape::Group { element, .. } = node.key().shape() else {
                continue;
            };
            if element == type_id && tags.matches(node.tags()) && node.push_member(id) {
                debug!(group = %node.identity(), "extending cached group");
            }
        }
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug!(node = %node.identity(), compiler = node.compiler().kind(), "adding node");
        self.nodes.push(node);
        id
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Iterates every node, registered and synthesized, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no node was added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `key` has an explicit provider matching `tags`.
    #[must_use]
    pub fn contains(&self, key: &TypeKey, tags: &Tags) -> bool {
        self.providers
            .get(&key.type_id())
            .is_some_and(|ids| ids.iter().any(|id| self.nodes[id.0].tags().matches(tags)))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolves a type and tag query to exactly one node.
    ///
    /// # Errors
    ///
    /// See the [module documentation](self) for the lookup order and the
    /// error returned at each step.
    pub fn find(&mut self, key: &TypeKey, tags: &Tags) -> Result<NodeId, Error> {
        trace!(key = %key.render(tags), "finding node");

        if let Some(ids) = self.providers.get(&key.type_id()) {
            let matched: Vec<NodeId> = ids
                .iter()
                .copied()
                .filter(|id| self.nodes[id.0].tags().matches(tags))
                .collect();
            return match matched.as_slice() {
                [] => Err(Error::NotFound {
                    key: key.render(tags),
                }),
                [id] => Ok(*id),
                _ => Err(Error::Ambiguous {
                    key: key.render(tags),
                    group: format!("Vec<{}>{}", key.name(), tags),
                }),
            };
        }

        match key.shape() {
            Shape::Group {
                element,
                element_name,
                collect,
            } => self.find_group(key, (element, element_name), collect, tags),
            Shape::Injectable { fields, assemble } => {
                Ok(self.find_injected(key, fields, assemble))
            }
            Shape::Pointer { pointee } => Err(Error::UnsupportedInjection {
                requested: key.render(tags),
                pointee: format!("{pointee}{tags}"),
            }),
            Shape::Plain => Err(Error::NotRegistered {
                key: key.render(tags),
            }),
        }
    }

    /// Looks up the node for a declared dependency.
    ///
    /// # Errors
    ///
    /// Same as [`find`](Self::find).
    pub fn find_dependency(&mut self, dependency: &Dependency) -> Result<NodeId, Error> {
        self.find(dependency.key(), dependency.tags())
    }

    fn find_group(
        &mut self,
        key: &TypeKey,
        (element, element_name): (TypeId, &'static str),
        collect: Collect,
        tags: &Tags,
    ) -> Result<NodeId, Error> {
        let cache_key = (key.type_id(), tags.clone());
        if let Some(id) = self.groups.get(&cache_key) {
            return Ok(*id);
        }

        let members: Vec<NodeId> = self
            .providers
            .get(&element)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| self.nodes[id.0].tags().matches(tags))
                    .collect()
            })
            .unwrap_or_default();
        if members.is_empty() {
            return Err(Error::NotFound {
                key: key.render(tags),
            });
        }

        debug!(
            group = %key.render(tags),
            element = element_name,
            members = members.len(),
            "synthesizing group"
        );
        let node = Node::new(*key, tags.clone(), Compiler::group(members, collect));
        let id = self.insert(node);
        self.groups.insert(cache_key, id);
        Ok(id)
    }

    fn find_injected(
        &mut self,
        key: &TypeKey,
        fields: fn() -> Vec<Dependency>,
        assemble: Assemble,
    ) -> NodeId {
        if let Some(id) = self.injected.get(&key.type_id()) {
            return *id;
        }

        debug!(key = %key, "synthesizing field injection");
        let compiler = Compiler::constructor(
            Vec::new(),
            Box::new(move |args: Arguments| Ok(Produced::new(assemble(args.into_fields())?))),
        );
        let node = Node::new(*key, Tags::new(), compiler).with_fields(fields());
        let id = self.insert(node);
        self.injected.insert(key.type_id(), id);
        id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Shape
    // ─────────────────────────────────────────────────────────────────────────

    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Returns the nodes the compiler of `id` needs, in declared order.
    ///
    /// Never constructs a value.
    ///
    /// # Errors
    ///
    /// Returns the lookup error of the first declared input that cannot be
    /// found.
    pub fn params(&mut self, id: NodeId) -> Result<Vec<NodeId>, Error> {
        let lookups = match self.get(id).compiler().requirements() {
            Requirements::Nodes(ids) => return Ok(ids.to_vec()),
            Requirements::Lookups(dependencies) => dependencies.to_vec(),
        };
        lookups
            .iter()
            .map(|dependency| self.find_dependency(dependency))
            .collect()
    }

    /// Returns the nodes of the declared fields of `id`, in declared order.
    ///
    /// # Errors
    ///
    /// Returns the lookup error of the first field that cannot be found.
    pub fn fields(&mut self, id: NodeId) -> Result<Vec<NodeId>, Error> {
        let fields = self.get(id).fields().to_vec();
        fields
            .iter()
            .map(|dependency| self.find_dependency(dependency))
            .collect()
    }

    /// Returns parameter and field nodes of `id`.
    ///
    /// # Errors
    ///
    /// Same as [`params`](Self::params) and [`fields`](Self::fields).
    pub fn dependencies(&mut self, id: NodeId) -> Result<Vec<NodeId>, Error> {
        let mut dependencies = self.params(id)?;
        dependencies.extend(self.fields(id)?);
        Ok(dependencies)
    }

    /// Lists every edge of the graph, synthesizing nodes on the way.
    ///
    /// Edges are reported per dependent node, parameters before fields.
    ///
    /// # Errors
    ///
    /// Returns the first lookup error encountered.
    pub fn dependency_edges(&mut self) -> Result<Vec<DependencyEdge>, Error> {
        let mut edges = Vec::new();
        let mut index = 0;
        // Synthesized nodes are appended while walking.
        while index < self.nodes.len() {
            let dependent = NodeId(index);
            for dependency in self.params(dependent)? {
                edges.push(DependencyEdge {
                    dependency,
                    dependent,
                    kind: EdgeKind::Param,
                });
            }
            for dependency in self.fields(dependent)? {
                edges.push(DependencyEdge {
                    dependency,
                    dependent,
                    kind: EdgeKind::Field,
                });
            }
            index += 1;
        }
        Ok(edges)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Construction
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the value of `id`, constructing it and its dependencies on
    /// first use.
    ///
    /// Does not check for cycles; use [`resolve`](Self::resolve) unless the
    /// graph was already validated.
    ///
    /// # Errors
    ///
    /// Propagates the first lookup or factory error unchanged. Nothing is
    /// memoized for the failing node.
    pub fn value(&mut self, id: NodeId) -> Result<Instance, Error> {
        if let Some(value) = &self.get(id).value {
            return Ok(Arc::clone(value));
        }

        let params = self.params(id)?;
        let fields = self.fields(id)?;
        let params = params
            .into_iter()
            .map(|param| self.value(param))
            .collect::<Result<Vec<_>, _>>()?;
        let fields = fields
            .into_iter()
            .map(|field| self.value(field))
            .collect::<Result<Vec<_>, _>>()?;

        let node = self.get(id);
        debug!(node = %node.identity(), compiler = node.compiler().kind(), "constructing");
        let produced = node.compiler().produce(Arguments::new(params, fields))?;

        if let Some(cleanup) = produced.cleanup {
            self.cleanups.push(cleanup);
        }
        self.nodes[id.0].value = Some(Arc::clone(&produced.value));
        Ok(produced.value)
    }

    /// Finds the node for `key` and `tags`, proves its subgraph acyclic and
    /// returns its value.
    ///
    /// # Errors
    ///
    /// Returns lookup, cycle or factory errors.
    pub fn resolve(&mut self, key: &TypeKey, tags: &Tags) -> Result<Instance, Error> {
        let id = self.find(key, tags)?;
        self.ensure_acyclic(id)?;
        self.value(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cleanup
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a cleanup callback. Callbacks are never deduplicated or run by
    /// the registry.
    pub fn register_cleanup(&mut self, cleanup: impl FnOnce() + Send + 'static) {
        self.cleanups.push(Box::new(cleanup));
    }

    /// Returns the number of collected cleanup callbacks.
    #[must_use]
    pub fn cleanup_count(&self) -> usize {
        self.cleanups.len()
    }

    /// Takes the collected cleanup callbacks, in registration order.
    pub fn take_cleanups(&mut self) -> Vec<Cleanup> {
        core::mem::take(&mut self.cleanups)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("nodes", &self.nodes)
            .field("cleanups", &self.cleanups.len())
            .field("proven", &self.acyclic.len())
            .field("whole_walked", &self.whole_walked)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}
