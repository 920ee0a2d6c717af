//! Dependency graph export for Weave containers.
//!
//! [`DependencyGraph`] mirrors the shape of a [`Registry`]: one vertex per
//! node identity (type name and tags) and one edge per dependency, pointing
//! from the dependency to its dependent. Building it looks nodes up the way
//! the cycle checker does, so group and field-injection nodes appear too,
//! but it never constructs a value.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weave_core::prelude::*;
//! use weave_graph::GraphExt;
//!
//! struct Logger;
//! struct Service;
//!
//! let mut container = Container::new();
//! container
//!     .provide(Provider::new(|| Arc::new(Logger)))
//!     .provide(Provider::new(|_: Arc<Logger>| Arc::new(Service)));
//!
//! let graph = container.dependency_graph().unwrap();
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//!
//! let dot = container.to_dot().unwrap();
//! assert!(dot.starts_with("digraph"));
//! ```

use hashbrown::HashMap;
use petgraph::Direction;
use petgraph::algo;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;
use weave_core::container::Container;
use weave_core::error::Error;
use weave_core::registry::Registry;

pub use weave_core::registry::EdgeKind;

/// Directed graph of node identities, edges pointing to dependents.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<String, EdgeKind>,
    index_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph of every node in `registry`.
    ///
    /// Edges between the same pair of vertices are kept once, with the kind
    /// of the first one found.
    ///
    /// # Errors
    ///
    /// Returns the lookup error of the first dependency that cannot be found.
    pub fn from_registry(registry: &mut Registry) -> Result<Self, Error> {
        let edges = registry.dependency_edges()?;

        let mut graph = DiGraph::new();
        let mut index_map = HashMap::new();
        let mut ids = Vec::with_capacity(registry.len());
        for (_, node) in registry.nodes() {
            let identity = node.identity();
            let index = *index_map
                .entry(identity.clone())
                .or_insert_with(|| graph.add_node(identity));
            ids.push(index);
        }

        for edge in edges {
            let from = ids[edge.dependency.index()];
            let to = ids[edge.dependent.index()];
            if graph.find_edge(from, to).is_none() {
                graph.add_edge(from, to, edge.kind);
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );
        Ok(Self { graph, index_map })
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of deduplicated edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if a node renders as `identity`.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.index_map.contains_key(identity)
    }

    /// Identities the node `identity` depends on.
    #[must_use]
    pub fn dependencies_of(&self, identity: &str) -> Vec<&str> {
        self.neighbors(identity, Direction::Incoming)
    }

    /// Identities of the nodes that depend on `identity`.
    #[must_use]
    pub fn dependents_of(&self, identity: &str) -> Vec<&str> {
        self.neighbors(identity, Direction::Outgoing)
    }

    fn neighbors(&self, identity: &str, direction: Direction) -> Vec<&str> {
        let Some(&index) = self.index_map.get(identity) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&str> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|neighbor| self.graph[neighbor].as_str())
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Returns `true` if the graph contains a cycle.
    #[must_use]
    pub fn has_cycle(&self) -> bool {
        algo::is_cyclic_directed(&self.graph)
    }

    /// Returns the underlying `petgraph` graph.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<String, EdgeKind> {
        &self.graph
    }

    /// Renders the graph in Graphviz DOT format, edges labelled with their
    /// kind.
    #[must_use]
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[]))
    }
}

/// Renders every node of `registry` in Graphviz DOT format.
///
/// # Errors
///
/// Same as [`DependencyGraph::from_registry`].
pub fn render_dot(registry: &mut Registry) -> Result<String, Error> {
    DependencyGraph::from_registry(registry).map(|graph| graph.to_dot())
}

/// Graph export for [`Container`].
///
/// Only providers registered so far are exported: modules contribute theirs
/// once the container is [finished](Container::finish).
pub trait GraphExt {
    /// Builds the dependency graph.
    ///
    /// # Errors
    ///
    /// Returns the lookup error of the first dependency that cannot be found.
    fn dependency_graph(&mut self) -> Result<DependencyGraph, Error>;

    /// Renders the dependency graph in Graphviz DOT format.
    ///
    /// # Errors
    ///
    /// Same as [`dependency_graph`](Self::dependency_graph).
    fn to_dot(&mut self) -> Result<String, Error> {
        self.dependency_graph().map(|graph| graph.to_dot())
    }
}

impl GraphExt for Container {
    fn dependency_graph(&mut self) -> Result<DependencyGraph, Error> {
        DependencyGraph::from_registry(self.registry_mut())
    }
}

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::{DependencyGraph, EdgeKind, GraphExt, render_dot};
}
