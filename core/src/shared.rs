//! Thread-safe handle to the store.
//!
//! Every agent action takes the write lock for its whole transaction, so a
//! claim is a compare-and-set with exactly one winner. Readers get cloned
//! data and never hold the lock past the call.

use std::slice;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use vellum_config::EngineConfig;
use vellum_types::{
    Challenge, ChallengeSeverity, ChallengeTarget, EpistemicState, Node, NodeDraft, NodeId,
};

use crate::error::StateError;
use crate::jobs::{Jobs, find_jobs};
use crate::state::{State, StateSnapshot};
use crate::taint::{TaintReport, propagate, propagate_from, topological_order};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedOptions {
    /// Run targeted taint propagation after each epistemic transition.
    pub propagate_on_write: bool,
}

impl Default for SharedOptions {
    fn default() -> Self {
        Self {
            propagate_on_write: true,
        }
    }
}

impl From<&EngineConfig> for SharedOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            propagate_on_write: config.propagate_on_write,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<State>>,
    options: SharedOptions,
}

impl SharedState {
    #[must_use]
    pub fn new(state: State) -> Self {
        Self::with_options(state, SharedOptions::default())
    }

    #[must_use]
    pub fn with_options(state: State, options: SharedOptions) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> SharedOptions {
        self.options
    }

    // Every store operation is all-or-nothing, so a panic while the lock was
    // held cannot have left a half-applied mutation behind.
    fn read_guard(&self) -> RwLockReadGuard<'_, State> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.read_guard())
    }

    /// Run `f` as one transaction under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.write_guard())
    }

    // ── Reads ────────────────────────────────────────────────

    #[must_use]
    pub fn get_node(&self, id: &NodeId) -> Option<Node> {
        self.read(|state| state.get_node(id).cloned())
    }

    #[must_use]
    pub fn get_challenge(&self, id: &str) -> Option<Challenge> {
        self.read(|state| state.get_challenge(id).cloned())
    }

    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        self.read(State::snapshot)
    }

    #[must_use]
    pub fn all_children_validated(&self, parent: &NodeId) -> bool {
        self.read(|state| state.all_children_validated(parent))
    }

    /// Bring taint up to date, then scan for work.
    pub fn find_jobs(&self) -> Result<Jobs, StateError> {
        let mut state = self.write_guard();
        propagate_from(&mut state, &[])?;
        Ok(find_jobs(state.all_nodes()))
    }

    // ── Agent actions ────────────────────────────────────────

    pub fn add_node(&self, node: Node) -> Result<(), StateError> {
        self.write(|state| state.add_node(node))
    }

    pub fn add_dependency(&self, id: &NodeId, dependency: &NodeId) -> Result<(), StateError> {
        self.write(|state| state.add_dependency(id, dependency))
    }

    pub fn claim(&self, id: &NodeId, agent: &str) -> Result<(), StateError> {
        self.write(|state| state.claim(id, agent))
    }

    pub fn release(&self, id: &NodeId, agent: &str) -> Result<(), StateError> {
        self.write(|state| state.release(id, agent))
    }

    pub fn refine(
        &self,
        parent: &NodeId,
        agent: &str,
        draft: NodeDraft,
    ) -> Result<NodeId, StateError> {
        self.write(|state| state.refine(parent, agent, draft))
    }

    /// Apply the transition and, when configured, propagate taint from the
    /// node in the same transaction.
    ///
    /// With propagation on, the dependency graph is ordered before the
    /// transition commits, so a corrupt graph rejects the whole call.
    pub fn apply_epistemic_transition(
        &self,
        id: &NodeId,
        to: EpistemicState,
    ) -> Result<EpistemicState, StateError> {
        let propagate_on_write = self.options.propagate_on_write;
        self.write(|state| {
            if propagate_on_write {
                topological_order(state)?;
            }
            let from = state.apply_epistemic_transition(id, to)?;
            if propagate_on_write {
                let report = propagate_from(state, slice::from_ref(id))?;
                debug!(node = %id, changed = report.changed.len(), "Propagated after transition");
            }
            Ok(from)
        })
    }

    pub fn raise_challenge(
        &self,
        target_id: &NodeId,
        target: ChallengeTarget,
        severity: ChallengeSeverity,
        reason: &str,
    ) -> Result<String, StateError> {
        self.write(|state| state.raise_challenge(target_id, target, severity, reason))
    }

    pub fn resolve_challenge(&self, id: &str, resolution: &str) -> Result<(), StateError> {
        self.write(|state| state.resolve_challenge(id, resolution))
    }

    pub fn withdraw_challenge(&self, id: &str) -> Result<(), StateError> {
        self.write(|state| state.withdraw_challenge(id))
    }

    /// Full taint pass.
    pub fn propagate(&self) -> Result<TaintReport, StateError> {
        self.write(propagate)
    }
}
