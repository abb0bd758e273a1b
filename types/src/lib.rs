//! Proof-tree domain types for Vellum.
//!
//! This crate contains pure domain types with no IO and no locking:
//! hierarchical node addressing, the closed schema registries with their
//! transition tables, and the node, challenge and context records the state
//! store owns.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod challenge;
mod context;
mod hash;
mod node;
mod node_id;
pub mod schema;
mod text;

pub use challenge::{Challenge, ChallengeClosedError};
pub use context::{Assumption, ContextRef, Definition, External};
pub use hash::ContentHash;
pub use node::{Node, NodeDraft, content_hash};
pub use node_id::{NodeId, NodeIdError, sort_node_ids};
pub use schema::{
    ChallengeSeverity, ChallengeStatus, ChallengeTarget, EpistemicState, InferenceType, NodeType,
    SchemaError, TaintState, WorkflowState, check_transition, check_workflow_transition,
    is_blocking_severity, validate_transition, validate_workflow_transition,
};
pub use text::{EmptyStringError, NonEmptyString};
