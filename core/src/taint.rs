//! Taint propagation over the `dependencies` graph.
//!
//! Taint records whether a node's correctness rests on something unverified:
//! a node's own admission makes it `self_admitted`; depending (directly or
//! transitively) on a refuted node or on anything tainted or self-admitted
//! makes it `tainted`. Nodes whose inputs changed are `unresolved` until the
//! next pass.
//!
//! Recomputation is explicit. [`propagate`] walks every node in topological
//! order; [`propagate_from`] limits the walk to the nodes that could have
//! changed.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;
use vellum_types::{EpistemicState, Node, NodeId, TaintState};

use crate::error::{Relation, StateError};
use crate::state::State;

/// One node whose taint changed during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaintChange {
    pub id: NodeId,
    pub from: TaintState,
    pub to: TaintState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaintReport {
    /// Nodes recomputed in this pass.
    pub visited: usize,
    /// Nodes whose taint differs from before, in processing order.
    pub changed: Vec<TaintChange>,
}

impl TaintReport {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.changed.is_empty()
    }
}

/// The per-node rule, given the node and its direct dependencies.
///
/// Dependencies are expected to be up to date already; an `unresolved`
/// dependency makes the result `unresolved` unless taint is certain from
/// another dependency.
#[must_use]
pub fn compute_taint<'a>(node: &Node, deps: impl IntoIterator<Item = &'a Node>) -> TaintState {
    if node.epistemic_state == EpistemicState::Admitted {
        return TaintState::SelfAdmitted;
    }
    let mut unresolved = false;
    for dep in deps {
        if dep.epistemic_state == EpistemicState::Refuted
            || dep.epistemic_state.introduces_taint()
            || dep.taint_state.spreads()
        {
            return TaintState::Tainted;
        }
        unresolved |= dep.taint_state == TaintState::Unresolved;
    }
    if unresolved {
        TaintState::Unresolved
    } else {
        TaintState::Clean
    }
}

/// Every node ordered so that dependencies come before their dependents.
///
/// Kahn's algorithm; among ready nodes the smallest [`NodeId`] goes first so
/// the order is deterministic.
pub fn topological_order(state: &State) -> Result<Vec<NodeId>, StateError> {
    let reverse = state.reverse_dependencies();
    let mut pending: HashMap<&NodeId, usize> = state
        .all_nodes()
        .iter()
        .map(|node| (&node.id, node.dependencies.len()))
        .collect();
    let mut ready: BTreeSet<NodeId> = pending
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| (*id).clone())
        .collect();

    let mut order = Vec::with_capacity(pending.len());
    while let Some(id) = ready.pop_first() {
        if let Some(dependents) = reverse.get(&id) {
            for dependent in dependents {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(dependent.clone());
                    }
                }
            }
        }
        order.push(id);
    }

    if order.len() < state.node_count() {
        let cycle = state.find_cycle(Relation::Dependencies).unwrap_or_else(|| {
            let placed: BTreeSet<&NodeId> = order.iter().collect();
            let mut rest: Vec<NodeId> = pending
                .keys()
                .filter(|id| !placed.contains(*id))
                .map(|id| (*id).clone())
                .collect();
            rest.sort();
            rest
        });
        return Err(StateError::CyclicDependency {
            relation: Relation::Dependencies,
            cycle,
        });
    }
    Ok(order)
}

/// Recompute taint for every node.
pub fn propagate(state: &mut State) -> Result<TaintReport, StateError> {
    let order = topological_order(state)?;
    recompute(state, &order)
}

/// Recompute taint for `roots`, every node still `unresolved`, and
/// everything that transitively depends on either.
pub fn propagate_from(state: &mut State, roots: &[NodeId]) -> Result<TaintReport, StateError> {
    for root in roots {
        state.require_node(root)?;
    }
    let stale: Vec<NodeId> = state
        .all_nodes()
        .iter()
        .filter(|node| node.taint_state == TaintState::Unresolved)
        .map(|node| node.id.clone())
        .collect();
    let affected = state.dependents_closure(roots.iter().chain(&stale));
    if affected.is_empty() {
        return Ok(TaintReport::default());
    }

    let order: Vec<NodeId> = topological_order(state)?
        .into_iter()
        .filter(|id| affected.contains(id))
        .collect();
    recompute(state, &order)
}

fn recompute(state: &mut State, order: &[NodeId]) -> Result<TaintReport, StateError> {
    let mut report = TaintReport::default();
    for id in order {
        let node = state.require_node(id)?;
        let from = node.taint_state;
        let to = compute_taint(
            node,
            node.dependencies.iter().filter_map(|dep| state.get_node(dep)),
        );
        report.visited += 1;
        if from != to {
            state.node_mut(id)?.taint_state = to;
            report.changed.push(TaintChange {
                id: id.clone(),
                from,
                to,
            });
        }
    }
    debug!(
        visited = report.visited,
        changed = report.changed.len(),
        "Taint propagated"
    );
    Ok(report)
}
