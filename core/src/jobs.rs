//! Job discovery: which nodes a prover or a verifier should pick up next.

use std::collections::HashMap;

use vellum_types::{EpistemicState, Node, NodeId, WorkflowState};

/// Nodes ready for each kind of agent.
///
/// Lists come out in scan order; call [`Jobs::sorted`] for canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Jobs {
    /// Available and pending: nothing is working on them yet.
    pub prover: Vec<Node>,
    /// Claimed and pending with every child accepted: ready for review.
    pub verifier: Vec<Node>,
}

impl Jobs {
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.prover.sort_by(|a, b| a.id.cmp(&b.id));
        self.verifier.sort_by(|a, b| a.id.cmp(&b.id));
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prover.is_empty() && self.verifier.is_empty()
    }

    #[must_use]
    pub fn prover_count(&self) -> usize {
        self.prover.len()
    }

    #[must_use]
    pub fn verifier_count(&self) -> usize {
        self.verifier.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prover.len() + self.verifier.len()
    }
}

/// Partition `nodes` into prover and verifier jobs.
///
/// A pure scan over the given slice: children are found among the same
/// slice, so pass the whole tree.
#[must_use]
pub fn find_jobs(nodes: &[Node]) -> Jobs {
    let by_id: HashMap<&NodeId, &Node> = nodes.iter().map(|node| (&node.id, node)).collect();
    let mut accepted_children: HashMap<&NodeId, bool> = HashMap::new();
    for node in nodes {
        if let Some(parent) = node.id.parent()
            && let Some(parent) = by_id.get(&parent)
        {
            let all = accepted_children.entry(&parent.id).or_insert(true);
            *all &= node.epistemic_state.is_accepted();
        }
    }

    let mut jobs = Jobs::default();
    for node in nodes {
        if node.epistemic_state != EpistemicState::Pending {
            continue;
        }
        match node.workflow_state {
            WorkflowState::Available => jobs.prover.push(node.clone()),
            WorkflowState::Claimed
                if accepted_children.get(&node.id).copied().unwrap_or(true) =>
            {
                jobs.verifier.push(node.clone());
            }
            WorkflowState::Claimed | WorkflowState::Blocked => {}
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use vellum_types::{EpistemicState, InferenceType, Node, NodeDraft, NodeId, WorkflowState};

    use super::find_jobs;

    fn node(text: &str, workflow: WorkflowState, epistemic: EpistemicState) -> Node {
        let mut node = Node::new(
            NodeId::parse(text).expect("test fixture must be a valid node id"),
            NodeDraft::claim(format!("statement {text}"), InferenceType::ModusPonens),
        );
        node.workflow_state = workflow;
        node.epistemic_state = epistemic;
        node
    }

    fn ids(nodes: &[Node]) -> Vec<String> {
        nodes.iter().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn three_node_fixture_partitions() {
        let nodes = vec![
            node("1", WorkflowState::Claimed, EpistemicState::Pending),
            node("1.1", WorkflowState::Available, EpistemicState::Pending),
            node("1.2", WorkflowState::Claimed, EpistemicState::Pending),
        ];
        let jobs = find_jobs(&nodes);
        assert_eq!(ids(&jobs.prover), vec!["1.1"]);
        // 1 still has a pending child; 1.2 is a leaf.
        assert_eq!(ids(&jobs.verifier), vec!["1.2"]);
    }

    #[test]
    fn parent_becomes_verifiable_once_children_accepted() {
        let nodes = vec![
            node("1", WorkflowState::Claimed, EpistemicState::Pending),
            node("1.1", WorkflowState::Available, EpistemicState::Validated),
            node("1.2", WorkflowState::Claimed, EpistemicState::Admitted),
        ];
        let jobs = find_jobs(&nodes);
        assert!(jobs.prover.is_empty());
        assert_eq!(ids(&jobs.verifier), vec!["1"]);
    }

    #[test]
    fn blocked_and_finished_nodes_are_not_jobs() {
        let nodes = vec![
            node("1", WorkflowState::Blocked, EpistemicState::Pending),
            node("1.1", WorkflowState::Available, EpistemicState::Refuted),
            node("1.2", WorkflowState::Claimed, EpistemicState::NeedsRefinement),
        ];
        assert!(find_jobs(&nodes).is_empty());
    }

    #[test]
    fn sorted_uses_numeric_order() {
        let nodes = vec![
            node("1", WorkflowState::Claimed, EpistemicState::Validated),
            node("1.10", WorkflowState::Available, EpistemicState::Pending),
            node("1.2", WorkflowState::Available, EpistemicState::Pending),
            node("1.9", WorkflowState::Available, EpistemicState::Pending),
        ];
        let jobs = find_jobs(&nodes).sorted();
        assert_eq!(ids(&jobs.prover), vec!["1.2", "1.9", "1.10"]);
        assert_eq!(jobs.prover_count(), 3);
        assert_eq!(jobs.verifier_count(), 0);
        assert_eq!(jobs.len(), 3);
    }
}
