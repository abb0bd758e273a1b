//! Challenge lifecycle on the store.

use tracing::{debug, info};
use uuid::Uuid;
use vellum_types::{Challenge, ChallengeSeverity, ChallengeTarget, NodeId, NonEmptyString};

use super::State;
use crate::error::{EntityKind, StateError};

const CHALLENGE_ID_PREFIX: &str = "ch-";
const CHALLENGE_ID_HEX_LEN: usize = 12;

impl State {
    /// Insert a pre-built challenge. The target node must exist.
    pub fn add_challenge(&mut self, challenge: Challenge) -> Result<(), StateError> {
        self.require_node(&challenge.target_id)?;
        let id = challenge.id.clone();
        let target = challenge.target_id.clone();
        Self::insert_indexed(
            &mut self.challenges,
            &mut self.challenge_index,
            EntityKind::Challenge,
            &id,
            challenge,
        )?;
        debug!(challenge = %id, node = %target, "Challenge added");
        Ok(())
    }

    /// Open a new challenge against `target_id` and return its generated ID.
    pub fn raise_challenge(
        &mut self,
        target_id: &NodeId,
        target: ChallengeTarget,
        severity: ChallengeSeverity,
        reason: &str,
    ) -> Result<String, StateError> {
        self.require_node(target_id)?;
        let reason = NonEmptyString::new(reason).map_err(|_| StateError::EmptyReason)?;

        let id = self.fresh_challenge_id();
        self.add_challenge(Challenge::new(
            id.clone(),
            target_id.clone(),
            target,
            severity,
            reason,
        ))?;
        info!(
            challenge = %id,
            node = %target_id,
            target = %target,
            severity = %severity,
            "Challenge raised"
        );
        Ok(id)
    }

    fn fresh_challenge_id(&self) -> String {
        loop {
            let hex = Uuid::new_v4().simple().to_string();
            let id = format!("{CHALLENGE_ID_PREFIX}{}", &hex[..CHALLENGE_ID_HEX_LEN]);
            if !self.challenge_index.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn resolve_challenge(&mut self, id: &str, resolution: &str) -> Result<(), StateError> {
        let challenge = self.challenge_mut(id)?;
        let resolution =
            NonEmptyString::new(resolution).map_err(|_| StateError::EmptyResolution)?;
        challenge.resolve(resolution)?;
        info!(challenge = %id, node = %challenge.target_id, "Challenge resolved");
        Ok(())
    }

    pub fn withdraw_challenge(&mut self, id: &str) -> Result<(), StateError> {
        let challenge = self.challenge_mut(id)?;
        challenge.withdraw()?;
        info!(challenge = %id, node = %challenge.target_id, "Challenge withdrawn");
        Ok(())
    }

    fn challenge_mut(&mut self, id: &str) -> Result<&mut Challenge, StateError> {
        match self.challenge_index.get(id) {
            Some(&i) => Ok(&mut self.challenges[i]),
            None => Err(StateError::ChallengeNotFound(id.to_owned())),
        }
    }

    #[must_use]
    pub fn get_challenge(&self, id: &str) -> Option<&Challenge> {
        self.challenge_index.get(id).map(|&i| &self.challenges[i])
    }

    /// All challenges in creation order.
    #[must_use]
    pub fn all_challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn open_challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| c.is_open())
    }

    pub fn challenges_for<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Challenge> {
        self.challenges.iter().filter(move |c| &c.target_id == node)
    }

    /// Open critical or major challenges against `node`.
    pub fn blocking_challenges<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a Challenge> {
        self.challenges_for(node).filter(|c| c.is_blocking())
    }

    pub(crate) fn blocking_challenge_ids(&self, node: &NodeId) -> Vec<String> {
        self.blocking_challenges(node).map(|c| c.id.clone()).collect()
    }
}
