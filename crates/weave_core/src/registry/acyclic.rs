//! Structural cycle detection.
//!
//! A depth-first walk over parameter and field edges. It looks nodes up
//! (which may synthesize group and field-injection nodes) but never
//! constructs a value, so it can run before any factory.

use hashbrown::HashMap;
use tracing::debug;

use super::{Registry, Validation};
use crate::error::Error;
use crate::node::NodeId;

/// Per-node walk state. Unvisited nodes have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    InProgress,
    Done,
}

impl Registry {
    /// Proves that the graph has no cycle.
    ///
    /// With `None`, walks every node in the registry. With `Some(id)`, walks
    /// the subgraph reachable from `id`. Nodes proven by earlier walks are
    /// not walked again. A failing walk keeps the nodes it finished and
    /// forgets the ones still on its path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] naming the cycle, or the lookup error of a
    /// dependency that cannot be found.
    pub fn check_acyclic(&mut self, start: Option<NodeId>) -> Result<(), Error> {
        let mut visits = core::mem::take(&mut self.acyclic);
        let mut path = Vec::new();

        let result = match start {
            Some(id) => self.visit(id, &mut visits, &mut path),
            None => {
                self.whole_walked = true;
                self.visit_all(&mut visits, &mut path)
            }
        };

        match &result {
            Ok(()) => debug!(proven = visits.len(), "dependency graph is acyclic"),
            Err(error) => {
                visits.retain(|_, visit| *visit == Visit::Done);
                debug!(%error, proven = visits.len(), "acyclicity check failed");
            }
        }
        self.acyclic = visits;
        result
    }

    /// Returns `true` if `id` was proven acyclic and nothing was registered
    /// since.
    #[must_use]
    pub fn is_proven(&self, id: NodeId) -> bool {
        self.acyclic.get(&id) == Some(&Visit::Done)
    }

    /// Runs the check the validation mode asks for before `id` is
    /// constructed: the whole graph once after registration, then only `id`'s
    /// subgraph.
    pub(crate) fn ensure_acyclic(&mut self, id: NodeId) -> Result<(), Error> {
        if self.is_proven(id) {
            return Ok(());
        }
        if self.validation == Validation::Whole && !self.whole_walked {
            self.check_acyclic(None)?;
            if self.is_proven(id) {
                return Ok(());
            }
        }
        self.check_acyclic(Some(id))
    }

    fn visit_all(
        &mut self,
        visits: &mut HashMap<NodeId, Visit>,
        path: &mut Vec<NodeId>,
    ) -> Result<(), Error> {
        let mut index = 0;
        // The arena grows when lookups synthesize nodes.
        while index < self.nodes.len() {
            self.visit(NodeId(index), visits, path)?;
            index += 1;
        }
        Ok(())
    }

    fn visit(
        &mut self,
        id: NodeId,
        visits: &mut HashMap<NodeId, Visit>,
        path: &mut Vec<NodeId>,
    ) -> Result<(), Error> {
        match visits.get(&id) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => return Err(self.cycle(id, path)),
            None => {}
        }

        visits.insert(id, Visit::InProgress);
        path.push(id);
        for dependency in self.dependencies(id)? {
            self.visit(dependency, visits, path)?;
        }
        path.pop();
        visits.insert(id, Visit::Done);
        Ok(())
    }

    fn cycle(&self, id: NodeId, path: &[NodeId]) -> Error {
        let start = path.iter().position(|step| *step == id).unwrap_or(0);
        let node = self.get(id).identity();
        let mut cycle: Vec<String> = path[start..]
            .iter()
            .map(|step| self.get(*step).identity())
            .collect();
        cycle.push(node.clone());
        Error::Cycle { node, path: cycle }
    }
}
