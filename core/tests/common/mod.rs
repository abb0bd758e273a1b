//! Shared fixtures for integration tests.

#![allow(dead_code)]

use vellum_core::State;
use vellum_types::{InferenceType, Node, NodeDraft, NodeId};

pub fn id(text: &str) -> NodeId {
    NodeId::parse(text).expect("test fixture must be a valid node id")
}

pub fn claim_node(text: &str, statement: &str) -> Node {
    Node::new(id(text), NodeDraft::claim(statement, InferenceType::ModusPonens))
}

/// A root theorem with three steps; `1.3` cites `1.1` and `1.2`.
pub fn small_proof() -> State {
    let mut state = State::new();
    state
        .add_node(Node::new(
            id("1"),
            NodeDraft::claim("Every finite group of prime order is cyclic", InferenceType::Assumption)
                .with_context(["def:group", "def:cyclic"]),
        ))
        .expect("root must insert");
    state
        .add_node(claim_node("1.1", "Let g be a non-identity element"))
        .expect("1.1 must insert");
    state
        .add_node(claim_node("1.2", "The order of g divides p"))
        .expect("1.2 must insert");
    state
        .add_node(Node::new(
            id("1.3"),
            NodeDraft::claim("So g generates the group", InferenceType::ModusPonens)
                .with_dependencies([id("1.1"), id("1.2")]),
        ))
        .expect("1.3 must insert");
    state
}
