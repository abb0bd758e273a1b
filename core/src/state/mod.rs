//! The proof-state store.
//!
//! `State` owns every node, challenge and context record. Nodes live in an
//! arena (`Vec<Node>`) addressed through a `BTreeMap<NodeId, usize>`; since
//! the map is ordered by [`NodeId`], a node's descendants form one contiguous
//! range directly after it, which is how children are found.
//!
//! Every mutating method validates first and commits last, so a rejected
//! operation leaves the store exactly as it was.

mod challenges;
mod claims;
mod context;
mod snapshot;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::num::NonZeroU32;
use std::ops::Bound;

use tracing::{debug, info, warn};
use vellum_types::{
    Assumption, Challenge, Definition, EpistemicState, External, Node, NodeId, TaintState,
    check_transition,
};

use crate::error::{EntityKind, Relation, StateError};

pub use context::ResolvedContext;
pub use snapshot::{SNAPSHOT_VERSION, StateSnapshot};

#[derive(Debug, Clone, Default)]
pub struct State {
    nodes: Vec<Node>,
    index: BTreeMap<NodeId, usize>,
    challenges: Vec<Challenge>,
    challenge_index: HashMap<String, usize>,
    definitions: Vec<Definition>,
    definition_index: HashMap<String, usize>,
    assumptions: Vec<Assumption>,
    assumption_index: HashMap<String, usize>,
    externals: Vec<External>,
    external_index: HashMap<String, usize>,
}

impl State {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ── Nodes ────────────────────────────────────────────────

    /// Insert a node.
    ///
    /// The parent must already exist (the tree is built top-down) and every
    /// dependency must name an existing node. A new node has no dependents
    /// yet, so the only cycle it can introduce is a reference to itself.
    /// Taint is always derived, so the node enters `unresolved` whatever the
    /// caller set.
    pub fn add_node(&mut self, mut node: Node) -> Result<(), StateError> {
        if self.index.contains_key(&node.id) {
            return Err(StateError::DuplicateId {
                kind: EntityKind::Node,
                id: node.id.to_string(),
            });
        }
        if let Some(parent) = node.id.parent()
            && !self.index.contains_key(&parent)
        {
            return Err(StateError::MissingParent {
                id: node.id.clone(),
                parent,
            });
        }
        self.check_edges(&node.id, &node.dependencies, Relation::Dependencies)?;
        self.check_edges(&node.id, &node.validation_deps, Relation::ValidationDeps)?;

        node.taint_state = TaintState::Unresolved;
        let id = node.id.clone();
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(node);
        debug!(node = %id, "Node added");
        Ok(())
    }

    fn check_edges(
        &self,
        id: &NodeId,
        targets: &[NodeId],
        relation: Relation,
    ) -> Result<(), StateError> {
        for target in targets {
            if target == id {
                return Err(StateError::CyclicDependency {
                    relation,
                    cycle: vec![id.clone(), id.clone()],
                });
            }
            if !self.index.contains_key(target) {
                return Err(StateError::NodeNotFound(target.clone()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn require_node(&self, id: &NodeId) -> Result<&Node, StateError> {
        self.get_node(id)
            .ok_or_else(|| StateError::NodeNotFound(id.clone()))
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node, StateError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.nodes[i]),
            None => Err(StateError::NodeNotFound(id.clone())),
        }
    }

    /// All nodes in insertion order. Callers sort when order matters.
    #[must_use]
    pub fn all_nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All nodes in canonical [`NodeId`] order.
    pub fn nodes_sorted(&self) -> impl Iterator<Item = &Node> {
        self.index.values().map(|&i| &self.nodes[i])
    }

    /// Direct children of `parent`, in canonical order.
    #[must_use]
    pub fn children(&self, parent: &NodeId) -> Vec<&Node> {
        let child_depth = parent.depth() + 1;
        self.index
            .range((Bound::Excluded(parent), Bound::Unbounded))
            .take_while(|(id, _)| id.is_descendant_of(parent))
            .filter(|(id, _)| id.depth() == child_depth)
            .map(|(_, &i)| &self.nodes[i])
            .collect()
    }

    /// The address `refine` would give the next child of `parent`.
    ///
    /// Fails with `ChildLimit` once the highest child segment is `u32::MAX`.
    pub fn next_child_id(&self, parent: &NodeId) -> Result<NodeId, StateError> {
        let next = match self
            .children(parent)
            .iter()
            .map(|child| child.id.last_segment())
            .max()
        {
            Some(last) => last.checked_add(1).ok_or_else(|| StateError::ChildLimit {
                parent: parent.clone(),
            })?,
            None => NonZeroU32::MIN,
        };
        Ok(parent.child(next))
    }

    /// Every direct child of `parent` is `validated` or `admitted`.
    ///
    /// Vacuously true for a childless (or unknown) parent.
    #[must_use]
    pub fn all_children_validated(&self, parent: &NodeId) -> bool {
        self.children(parent)
            .iter()
            .all(|child| child.epistemic_state.is_accepted())
    }

    /// Validation dependencies of `id` that have not yet been accepted.
    ///
    /// A non-empty result is what presentation layers show as "blocked".
    pub fn pending_validation_deps(&self, id: &NodeId) -> Result<Vec<NodeId>, StateError> {
        let node = self.require_node(id)?;
        let mut pending: Vec<NodeId> = node
            .validation_deps
            .iter()
            .filter(|dep| {
                self.get_node(dep)
                    .is_none_or(|dep| !dep.epistemic_state.is_accepted())
            })
            .cloned()
            .collect();
        pending.sort();
        Ok(pending)
    }

    // ── Edges ────────────────────────────────────────────────

    fn edges<'a>(node: &'a Node, relation: Relation) -> &'a [NodeId] {
        match relation {
            Relation::Dependencies => &node.dependencies,
            Relation::ValidationDeps => &node.validation_deps,
        }
    }

    /// A path `from → … → to` following `relation` edges, if one exists.
    pub(crate) fn find_path(
        &self,
        from: &NodeId,
        to: &NodeId,
        relation: Relation,
    ) -> Option<Vec<NodeId>> {
        let mut stack = vec![(from.clone(), vec![from.clone()])];
        let mut seen = BTreeSet::new();
        while let Some((current, path)) = stack.pop() {
            if &current == to {
                return Some(path);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(node) = self.get_node(&current) else {
                continue;
            };
            for next in Self::edges(node, relation) {
                if !seen.contains(next) {
                    let mut extended = path.clone();
                    extended.push(next.clone());
                    stack.push((next.clone(), extended));
                }
            }
        }
        None
    }

    /// Any cycle among `relation` edges, as a closed path `a → … → a`.
    pub(crate) fn find_cycle(&self, relation: Relation) -> Option<Vec<NodeId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: HashMap<&NodeId, Mark> = HashMap::new();
        for start in self.index.keys() {
            if marks.contains_key(start) {
                continue;
            }
            marks.insert(start, Mark::Visiting);
            let mut path: Vec<(&NodeId, usize)> = vec![(start, 0)];

            while let Some(frame) = path.last_mut() {
                let (current, cursor) = *frame;
                let edges = self
                    .get_node(current)
                    .map_or(&[][..], |node| Self::edges(node, relation));
                let Some(next) = edges.get(cursor) else {
                    marks.insert(current, Mark::Done);
                    path.pop();
                    continue;
                };
                frame.1 += 1;
                match marks.get(next) {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        let from = path.iter().position(|(id, _)| *id == next).unwrap_or(0);
                        let mut cycle: Vec<NodeId> =
                            path[from..].iter().map(|(id, _)| (*id).clone()).collect();
                        cycle.push(next.clone());
                        return Some(cycle);
                    }
                    None => {
                        marks.insert(next, Mark::Visiting);
                        path.push((next, 0));
                    }
                }
            }
        }
        None
    }

    fn add_edge(
        &mut self,
        id: &NodeId,
        target: &NodeId,
        relation: Relation,
    ) -> Result<bool, StateError> {
        let node = self.require_node(id)?;
        self.require_node(target)?;
        if Self::edges(node, relation).contains(target) {
            return Ok(false);
        }
        if let Some(path) = self.find_path(target, id, relation) {
            let mut cycle = Vec::with_capacity(path.len() + 1);
            cycle.push(id.clone());
            cycle.extend(path);
            warn!(node = %id, target = %target, "Rejected edge that would close a cycle");
            return Err(StateError::CyclicDependency { relation, cycle });
        }

        let node = self.node_mut(id)?;
        match relation {
            Relation::Dependencies => node.dependencies.push(target.clone()),
            Relation::ValidationDeps => node.validation_deps.push(target.clone()),
        }
        Ok(true)
    }

    /// Record that `id` relies on the content of `dependency`.
    pub fn add_dependency(&mut self, id: &NodeId, dependency: &NodeId) -> Result<(), StateError> {
        if self.add_edge(id, dependency, Relation::Dependencies)? {
            self.invalidate_taint(id);
            debug!(node = %id, dependency = %dependency, "Dependency added");
        }
        Ok(())
    }

    /// Record that `id` may not progress until `dependency` is accepted.
    pub fn add_validation_dep(
        &mut self,
        id: &NodeId,
        dependency: &NodeId,
    ) -> Result<(), StateError> {
        if self.add_edge(id, dependency, Relation::ValidationDeps)? {
            debug!(node = %id, dependency = %dependency, "Validation dependency added");
        }
        Ok(())
    }

    /// Map from each node to the nodes that list it in `dependencies`.
    pub(crate) fn reverse_dependencies(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut reverse: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for node in &self.nodes {
            for dep in &node.dependencies {
                reverse.entry(dep.clone()).or_default().push(node.id.clone());
            }
        }
        reverse
    }

    /// `roots` plus everything that transitively depends on them.
    pub(crate) fn dependents_closure<'a>(
        &self,
        roots: impl IntoIterator<Item = &'a NodeId>,
    ) -> BTreeSet<NodeId> {
        let reverse = self.reverse_dependencies();
        let mut closure = BTreeSet::new();
        let mut stack: Vec<NodeId> = roots.into_iter().cloned().collect();
        while let Some(id) = stack.pop() {
            if !closure.insert(id.clone()) {
                continue;
            }
            if let Some(dependents) = reverse.get(&id) {
                stack.extend(dependents.iter().cloned());
            }
        }
        closure
    }

    /// Mark `id` and all of its transitive dependents as awaiting taint
    /// recomputation.
    pub(crate) fn invalidate_taint(&mut self, id: &NodeId) {
        for affected in self.dependents_closure([id]) {
            if let Some(&i) = self.index.get(&affected) {
                self.nodes[i].taint_state = TaintState::Unresolved;
            }
        }
    }

    // ── Epistemic transitions ────────────────────────────────

    /// Move a node to a new epistemic state.
    ///
    /// Fails if the transition is not in the table, or if `to` is a positive
    /// final state while a blocking challenge is open on the node. On success
    /// the node and its dependents are marked taint-`unresolved` and the
    /// previous state is returned.
    pub fn apply_epistemic_transition(
        &mut self,
        id: &NodeId,
        to: EpistemicState,
    ) -> Result<EpistemicState, StateError> {
        let from = self.require_node(id)?.epistemic_state;
        check_transition(from, to)?;
        if to.is_accepted() {
            let blocking = self.blocking_challenge_ids(id);
            if !blocking.is_empty() {
                warn!(node = %id, to = %to, challenges = ?blocking, "Transition blocked by open challenges");
                return Err(StateError::BlockedByChallenge {
                    id: id.clone(),
                    challenges: blocking,
                });
            }
        }

        self.node_mut(id)?.epistemic_state = to;
        self.invalidate_taint(id);
        info!(node = %id, from = %from, to = %to, "Epistemic transition applied");
        Ok(from)
    }

    /// [`State::apply_epistemic_transition`] with textual arguments, as an
    /// external command layer receives them.
    pub fn apply_transition_by_name(
        &mut self,
        id: &str,
        to: &str,
    ) -> Result<EpistemicState, StateError> {
        let id = NodeId::parse(id)?;
        let to: EpistemicState = to.parse()?;
        self.apply_epistemic_transition(&id, to)
    }

    // ── Raw inserts for context records ──────────────────────

    fn insert_indexed<T>(
        items: &mut Vec<T>,
        index: &mut HashMap<String, usize>,
        kind: EntityKind,
        id: &str,
        item: T,
    ) -> Result<(), StateError> {
        if index.contains_key(id) {
            return Err(StateError::DuplicateId {
                kind,
                id: id.to_owned(),
            });
        }
        index.insert(id.to_owned(), items.len());
        items.push(item);
        Ok(())
    }
}
