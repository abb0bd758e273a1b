//! Typed errors returned by the state store.
//!
//! Every store operation either commits fully or returns one of these
//! without touching state.

use std::fmt;

use thiserror::Error;
use vellum_types::{ChallengeClosedError, NodeId, NodeIdError, SchemaError};

/// Entity kinds owned by the store, used to qualify duplicate-ID errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Challenge,
    Definition,
    Assumption,
    External,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Node => "node",
            Self::Challenge => "challenge",
            Self::Definition => "definition",
            Self::Assumption => "assumption",
            Self::External => "external",
        })
    }
}

/// Which edge set a cycle was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Dependencies,
    ValidationDeps,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dependencies => "dependencies",
            Self::ValidationDeps => "validation dependencies",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error(transparent)]
    Parse(#[from] NodeIdError),
    #[error("{kind} {id} already exists")]
    DuplicateId { kind: EntityKind, id: String },
    #[error("cannot add node {id}: parent {parent} does not exist")]
    MissingParent { id: NodeId, parent: NodeId },
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    #[error("challenge {0} not found")]
    ChallengeNotFound(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("cycle in {relation}: {}", join_path(.cycle))]
    CyclicDependency {
        relation: Relation,
        cycle: Vec<NodeId>,
    },
    #[error("node {id} is already claimed by {owner}")]
    AlreadyClaimed { id: NodeId, owner: String },
    #[error("node {id} is not claimed by {agent}")]
    NotClaimedByAgent { id: NodeId, agent: String },
    #[error("node {id} is blocked by open challenges: {}", .challenges.join(", "))]
    BlockedByChallenge { id: NodeId, challenges: Vec<String> },
    #[error(transparent)]
    ChallengeClosed(#[from] ChallengeClosedError),
    #[error("challenge resolution must not be empty")]
    EmptyResolution,
    #[error("challenge reason must not be empty")]
    EmptyReason,
    #[error("agent name must not be empty")]
    EmptyAgent,
    #[error("node {parent} has no child number left to allocate")]
    ChildLimit { parent: NodeId },
    #[error("node {id} has workflow state {state} inconsistent with its claim fields")]
    InconsistentClaim { id: NodeId, state: String },
    #[error("challenge {id} has status {status} inconsistent with its resolution")]
    InconsistentChallenge { id: String, status: String },
}

impl StateError {
    #[must_use]
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Schema(SchemaError::InvalidTransition { .. }))
    }

    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::Schema(SchemaError::InvalidState { .. }))
    }
}

fn join_path(cycle: &[NodeId]) -> String {
    cycle
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use vellum_types::NodeId;

    use super::{Relation, StateError};

    #[test]
    fn cycle_message_lists_path() {
        let err = StateError::CyclicDependency {
            relation: Relation::Dependencies,
            cycle: vec![
                NodeId::parse("1.1").unwrap(),
                NodeId::parse("1.2").unwrap(),
                NodeId::parse("1.1").unwrap(),
            ],
        };
        assert_eq!(err.to_string(), "cycle in dependencies: 1.1 -> 1.2 -> 1.1");
    }

    #[test]
    fn blocked_message_names_challenges() {
        let err = StateError::BlockedByChallenge {
            id: NodeId::root(),
            challenges: vec!["ch-a".to_owned(), "ch-b".to_owned()],
        };
        assert_eq!(
            err.to_string(),
            "node 1 is blocked by open challenges: ch-a, ch-b"
        );
    }
}
