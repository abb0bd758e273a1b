//! Serializable image of the whole store.

use serde::{Deserialize, Serialize};
use tracing::debug;
use vellum_types::{
    Assumption, Challenge, ChallengeStatus, Definition, External, Node, WorkflowState,
};

use super::State;
use crate::error::{EntityKind, Relation, StateError};

/// Bumped whenever the snapshot layout changes incompatibly.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub version: u32,
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub assumptions: Vec<Assumption>,
    #[serde(default)]
    pub externals: Vec<External>,
}

impl State {
    /// Copy the store into a serializable snapshot. Nodes are emitted in
    /// canonical order.
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            version: SNAPSHOT_VERSION,
            nodes: self.nodes_sorted().cloned().collect(),
            challenges: self.challenges.clone(),
            definitions: self.definitions.clone(),
            assumptions: self.assumptions.clone(),
            externals: self.externals.clone(),
        }
    }

    /// Rebuild a store from a snapshot, re-checking every structural
    /// invariant: unique IDs, parents before children, references to
    /// existing nodes, acyclic edge sets, claim fields that match the
    /// workflow state and consistent challenges.
    ///
    /// Node edges may point at any node in the snapshot (including ones that
    /// sort later), so references are checked only after all nodes are in.
    pub fn from_snapshot(snapshot: StateSnapshot) -> Result<Self, StateError> {
        let StateSnapshot {
            version: _,
            mut nodes,
            challenges,
            definitions,
            assumptions,
            externals,
        } = snapshot;

        let mut state = Self::new();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        for node in nodes {
            if state.index.contains_key(&node.id) {
                return Err(StateError::DuplicateId {
                    kind: EntityKind::Node,
                    id: node.id.to_string(),
                });
            }
            if let Some(parent) = node.id.parent()
                && !state.index.contains_key(&parent)
            {
                return Err(StateError::MissingParent {
                    id: node.id.clone(),
                    parent,
                });
            }
            check_claim(&node)?;
            state.index.insert(node.id.clone(), state.nodes.len());
            state.nodes.push(node);
        }

        for node in &state.nodes {
            state.check_edges(&node.id, &node.dependencies, Relation::Dependencies)?;
            state.check_edges(&node.id, &node.validation_deps, Relation::ValidationDeps)?;
        }
        for relation in [Relation::Dependencies, Relation::ValidationDeps] {
            if let Some(cycle) = state.find_cycle(relation) {
                return Err(StateError::CyclicDependency { relation, cycle });
            }
        }

        for definition in definitions {
            state.add_definition(definition)?;
        }
        for assumption in assumptions {
            state.add_assumption(assumption)?;
        }
        for external in externals {
            state.add_external(external)?;
        }
        for challenge in challenges {
            check_challenge(&challenge)?;
            state.add_challenge(challenge)?;
        }

        debug!(
            nodes = state.nodes.len(),
            challenges = state.challenges.len(),
            "State restored from snapshot"
        );
        Ok(state)
    }
}

/// A claimed node carries its owner and claim time; any other node carries
/// neither.
fn check_claim(node: &Node) -> Result<(), StateError> {
    let owned = node
        .claimed_by
        .as_deref()
        .is_some_and(|agent| !agent.trim().is_empty());
    let consistent = match node.workflow_state {
        WorkflowState::Claimed => owned && node.claimed_at.is_some(),
        WorkflowState::Available | WorkflowState::Blocked => {
            node.claimed_by.is_none() && node.claimed_at.is_none()
        }
    };
    if consistent {
        Ok(())
    } else {
        Err(StateError::InconsistentClaim {
            id: node.id.clone(),
            state: node.workflow_state.to_string(),
        })
    }
}

fn check_challenge(challenge: &Challenge) -> Result<(), StateError> {
    let consistent = match challenge.status {
        ChallengeStatus::Resolved => challenge.resolution.is_some(),
        ChallengeStatus::Open | ChallengeStatus::Withdrawn => challenge.resolution.is_none(),
    };
    if consistent {
        Ok(())
    } else {
        Err(StateError::InconsistentChallenge {
            id: challenge.id.clone(),
            status: challenge.status.to_string(),
        })
    }
}
