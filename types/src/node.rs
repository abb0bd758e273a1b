//! Proof nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::ContextRef;
use crate::hash::ContentHash;
use crate::node_id::NodeId;
use crate::schema::{EpistemicState, InferenceType, NodeType, TaintState, WorkflowState};

/// Content of a node before it has been given an address.
///
/// Used by `refine`, where the store assigns the child ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDraft {
    pub node_type: NodeType,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    pub inference: InferenceType,
    #[serde(default)]
    pub context: Vec<ContextRef>,
    #[serde(default)]
    pub dependencies: Vec<NodeId>,
    #[serde(default)]
    pub validation_deps: Vec<NodeId>,
}

impl NodeDraft {
    #[must_use]
    pub fn new(node_type: NodeType, statement: impl Into<String>, inference: InferenceType) -> Self {
        Self {
            node_type,
            statement: statement.into(),
            latex: None,
            inference,
            context: Vec::new(),
            dependencies: Vec::new(),
            validation_deps: Vec::new(),
        }
    }

    #[must_use]
    pub fn claim(statement: impl Into<String>, inference: InferenceType) -> Self {
        Self::new(NodeType::Claim, statement, inference)
    }

    #[must_use]
    pub fn with_latex(mut self, latex: impl Into<String>) -> Self {
        self.latex = Some(latex.into());
        self
    }

    /// Attach context tags; each is parsed into a [`ContextRef`].
    #[must_use]
    pub fn with_context<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.context
            .extend(tags.into_iter().map(|tag| ContextRef::parse(tag.as_ref())));
        self
    }

    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = NodeId>) -> Self {
        self.dependencies.extend(deps);
        self
    }

    #[must_use]
    pub fn with_validation_deps(mut self, deps: impl IntoIterator<Item = NodeId>) -> Self {
        self.validation_deps.extend(deps);
        self
    }
}

/// A proof step.
///
/// The state store is the only owner that mutates nodes; consumers only ever
/// see shared references or cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latex: Option<String>,
    pub inference: InferenceType,
    pub workflow_state: WorkflowState,
    pub epistemic_state: EpistemicState,
    pub taint_state: TaintState,
    pub content_hash: ContentHash,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub context: Vec<ContextRef>,
    #[serde(default)]
    pub dependencies: Vec<NodeId>,
    #[serde(default)]
    pub validation_deps: Vec<NodeId>,
}

impl Node {
    /// A fresh node: available, pending, taint unresolved.
    #[must_use]
    pub fn new(id: NodeId, draft: NodeDraft) -> Self {
        let content_hash = content_hash(draft.node_type, &draft.statement, draft.inference);
        Self {
            id,
            node_type: draft.node_type,
            statement: draft.statement,
            latex: draft.latex,
            inference: draft.inference,
            workflow_state: WorkflowState::Available,
            epistemic_state: EpistemicState::Pending,
            taint_state: TaintState::Unresolved,
            content_hash,
            created: Utc::now(),
            claimed_by: None,
            claimed_at: None,
            context: draft.context,
            dependencies: draft.dependencies,
            validation_deps: draft.validation_deps,
        }
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<NodeId> {
        self.id.parent()
    }

    #[must_use]
    pub fn is_claimed_by(&self, agent: &str) -> bool {
        self.workflow_state == WorkflowState::Claimed && self.claimed_by.as_deref() == Some(agent)
    }

    /// Recompute the digest and compare with the stored one.
    #[must_use]
    pub fn verify_content_hash(&self) -> bool {
        content_hash(self.node_type, &self.statement, self.inference) == self.content_hash
    }
}

/// Digest over the canonical `(type, statement, inference)` encoding.
#[must_use]
pub fn content_hash(node_type: NodeType, statement: &str, inference: InferenceType) -> ContentHash {
    ContentHash::of_fields(&[node_type.as_str(), statement, inference.as_str()])
}

#[cfg(test)]
mod tests {
    use super::{Node, NodeDraft};
    use crate::context::ContextRef;
    use crate::node_id::NodeId;
    use crate::schema::{EpistemicState, InferenceType, NodeType, TaintState, WorkflowState};

    fn root_node() -> Node {
        Node::new(
            NodeId::root(),
            NodeDraft::claim("Every group has an identity", InferenceType::Assumption)
                .with_context(["def:group", "ext:lang", "misc"]),
        )
    }

    #[test]
    fn new_node_defaults() {
        let node = root_node();
        assert_eq!(node.workflow_state, WorkflowState::Available);
        assert_eq!(node.epistemic_state, EpistemicState::Pending);
        assert_eq!(node.taint_state, TaintState::Unresolved);
        assert!(node.claimed_by.is_none());
        assert_eq!(node.parent_id(), None);
        assert_eq!(
            node.context,
            vec![
                ContextRef::Definition("group".to_owned()),
                ContextRef::External("lang".to_owned()),
                ContextRef::Unknown("misc".to_owned()),
            ]
        );
    }

    #[test]
    fn content_hash_ignores_latex_and_detects_edits() {
        let plain = root_node();
        let mut with_latex = Node::new(
            NodeId::root(),
            NodeDraft::claim("Every group has an identity", InferenceType::Assumption)
                .with_latex(r"\exists e"),
        );
        assert_eq!(plain.content_hash, with_latex.content_hash);
        assert!(with_latex.verify_content_hash());

        with_latex.statement.push('!');
        assert!(!with_latex.verify_content_hash());

        let as_case = Node::new(
            NodeId::root(),
            NodeDraft::new(
                NodeType::Case,
                "Every group has an identity",
                InferenceType::Assumption,
            ),
        );
        assert_ne!(plain.content_hash, as_case.content_hash);
    }

    #[test]
    fn serde_roundtrip_keeps_wire_names() {
        let node = root_node();
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["workflow_state"], "available");
        assert_eq!(json["taint_state"], "unresolved");
        assert_eq!(json["context"][0], "def:group");
        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
