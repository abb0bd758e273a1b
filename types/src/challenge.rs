//! Challenges: targeted disputes against a single node.
//!
//! Lifecycle is `open → resolved` (with resolution text) or
//! `open → withdrawn`. Both outcomes are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node_id::NodeId;
use crate::schema::{ChallengeSeverity, ChallengeStatus, ChallengeTarget};
use crate::text::NonEmptyString;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("challenge {id} is already {status}")]
pub struct ChallengeClosedError {
    pub id: String,
    pub status: ChallengeStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: String,
    pub target_id: NodeId,
    pub target: ChallengeTarget,
    pub reason: NonEmptyString,
    pub severity: ChallengeSeverity,
    pub status: ChallengeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<NonEmptyString>,
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Challenge {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        target_id: NodeId,
        target: ChallengeTarget,
        severity: ChallengeSeverity,
        reason: NonEmptyString,
    ) -> Self {
        Self {
            id: id.into(),
            target_id,
            target,
            reason,
            severity,
            status: ChallengeStatus::Open,
            resolution: None,
            created: Utc::now(),
            closed_at: None,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ChallengeStatus::Open
    }

    /// Open and of a blocking severity.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.is_open() && self.severity.is_blocking()
    }

    pub fn resolve(&mut self, resolution: NonEmptyString) -> Result<(), ChallengeClosedError> {
        self.ensure_open()?;
        self.status = ChallengeStatus::Resolved;
        self.resolution = Some(resolution);
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    pub fn withdraw(&mut self) -> Result<(), ChallengeClosedError> {
        self.ensure_open()?;
        self.status = ChallengeStatus::Withdrawn;
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), ChallengeClosedError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ChallengeClosedError {
                id: self.id.clone(),
                status: self.status,
            })
        }
    }
}
