//! Workflow operations: claim, release, refine.

use chrono::Utc;
use tracing::{debug, info, warn};
use vellum_types::{Node, NodeDraft, NodeId, WorkflowState, check_workflow_transition};

use super::State;
use crate::error::StateError;

impl State {
    /// Claim a node for `agent`.
    ///
    /// This is the compare-and-set the concurrency model relies on: under a
    /// single writer exactly one of several racing claims succeeds. Claiming
    /// a node you already hold is a no-op.
    pub fn claim(&mut self, id: &NodeId, agent: &str) -> Result<(), StateError> {
        let agent = checked_agent(agent)?;
        let node = self.require_node(id)?;
        if node.workflow_state == WorkflowState::Claimed {
            return match node.claimed_by.as_deref() {
                Some(owner) if owner == agent => Ok(()),
                owner => {
                    let owner = owner.unwrap_or_default().to_owned();
                    warn!(node = %id, agent = %agent, owner = %owner, "Claim rejected");
                    Err(StateError::AlreadyClaimed {
                        id: id.clone(),
                        owner,
                    })
                }
            };
        }
        check_workflow_transition(node.workflow_state, WorkflowState::Claimed)?;

        let node = self.node_mut(id)?;
        node.workflow_state = WorkflowState::Claimed;
        node.claimed_by = Some(agent.to_owned());
        node.claimed_at = Some(Utc::now());
        info!(node = %id, agent = %agent, "Node claimed");
        Ok(())
    }

    /// Give up a claim held by `agent`.
    pub fn release(&mut self, id: &NodeId, agent: &str) -> Result<(), StateError> {
        if !self.require_node(id)?.is_claimed_by(agent) {
            return Err(StateError::NotClaimedByAgent {
                id: id.clone(),
                agent: agent.to_owned(),
            });
        }

        let node = self.node_mut(id)?;
        node.workflow_state = WorkflowState::Available;
        node.claimed_by = None;
        node.claimed_at = None;
        info!(node = %id, agent = %agent, "Node released");
        Ok(())
    }

    /// Add a child step under a node that `agent` holds, numbered after the
    /// existing children. Returns the new child's ID.
    pub fn refine(
        &mut self,
        parent: &NodeId,
        agent: &str,
        draft: NodeDraft,
    ) -> Result<NodeId, StateError> {
        if !self.require_node(parent)?.is_claimed_by(agent) {
            return Err(StateError::NotClaimedByAgent {
                id: parent.clone(),
                agent: agent.to_owned(),
            });
        }

        let id = self.next_child_id(parent)?;
        self.add_node(Node::new(id.clone(), draft))?;
        debug!(node = %id, parent = %parent, agent = %agent, "Node refined");
        Ok(id)
    }
}

fn checked_agent(agent: &str) -> Result<&str, StateError> {
    if agent.trim().is_empty() {
        Err(StateError::EmptyAgent)
    } else {
        Ok(agent)
    }
}
