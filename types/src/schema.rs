//! Closed schema registries and transition tables.
//!
//! Every enum here has a fixed snake_case wire name. Metadata lookups and
//! transition legality are plain `match` tables; nothing is registered at
//! runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Errors ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid {kind} {value:?}")]
    InvalidState { kind: &'static str, value: String },
    #[error("invalid {kind} transition from {from} to {to}")]
    InvalidTransition {
        kind: &'static str,
        from: String,
        to: String,
    },
}

/// Generates the wire-name table shared by every schema enum:
/// `ALL`, `as_str`, `Display` and `FromStr`.
macro_rules! wire_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SchemaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err(SchemaError::InvalidState {
                        kind: $kind,
                        value: other.to_owned(),
                    }),
                }
            }
        }
    };
}

// ── Node type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Claim,
    LocalAssume,
    LocalDischarge,
    Case,
    Qed,
}

wire_enum!(NodeType, "node type", {
    Claim => "claim",
    LocalAssume => "local_assume",
    LocalDischarge => "local_discharge",
    Case => "case",
    Qed => "qed",
});

impl NodeType {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Claim => "A mathematical assertion to be justified",
            Self::LocalAssume => "Introduce a local hypothesis scoped to this subtree",
            Self::LocalDischarge => "Conclude and discharge a local hypothesis",
            Self::Case => "One branch of a case split",
            Self::Qed => "Final step closing the enclosing scope",
        }
    }

    /// Whether the node opens a hypothesis scope for its descendants.
    #[must_use]
    pub const fn opens_scope(self) -> bool {
        matches!(self, Self::LocalAssume)
    }

    /// Whether the node closes the nearest open hypothesis scope.
    #[must_use]
    pub const fn closes_scope(self) -> bool {
        matches!(self, Self::LocalDischarge)
    }
}

// ── Inference type ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceType {
    ModusPonens,
    ModusTollens,
    UniversalInstantiation,
    UniversalGeneralization,
    ExistentialInstantiation,
    ExistentialGeneralization,
    ByDefinition,
    Assumption,
    LocalAssume,
    LocalDischarge,
    Contradiction,
}

wire_enum!(InferenceType, "inference type", {
    ModusPonens => "modus_ponens",
    ModusTollens => "modus_tollens",
    UniversalInstantiation => "universal_instantiation",
    UniversalGeneralization => "universal_generalization",
    ExistentialInstantiation => "existential_instantiation",
    ExistentialGeneralization => "existential_generalization",
    ByDefinition => "by_definition",
    Assumption => "assumption",
    LocalAssume => "local_assume",
    LocalDischarge => "local_discharge",
    Contradiction => "contradiction",
});

impl InferenceType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ModusPonens => "Modus Ponens",
            Self::ModusTollens => "Modus Tollens",
            Self::UniversalInstantiation => "Universal Instantiation",
            Self::UniversalGeneralization => "Universal Generalization",
            Self::ExistentialInstantiation => "Existential Instantiation",
            Self::ExistentialGeneralization => "Existential Generalization",
            Self::ByDefinition => "By Definition",
            Self::Assumption => "Assumption",
            Self::LocalAssume => "Local Assumption",
            Self::LocalDischarge => "Local Discharge",
            Self::Contradiction => "Contradiction",
        }
    }

    /// Logical form of the rule in sequent notation.
    #[must_use]
    pub const fn form(self) -> &'static str {
        match self {
            Self::ModusPonens => "P, P → Q ⊢ Q",
            Self::ModusTollens => "¬Q, P → Q ⊢ ¬P",
            Self::UniversalInstantiation => "∀x.P(x) ⊢ P(t)",
            Self::UniversalGeneralization => "P(x) for arbitrary x ⊢ ∀x.P(x)",
            Self::ExistentialInstantiation => "∃x.P(x) ⊢ P(c) for fresh c",
            Self::ExistentialGeneralization => "P(c) ⊢ ∃x.P(x)",
            Self::ByDefinition => "unfold definition",
            Self::Assumption => "global hypothesis",
            Self::LocalAssume => "introduce local hypothesis",
            Self::LocalDischarge => "conclude from local hypothesis",
            Self::Contradiction => "P ∧ ¬P ⊢ ⊥",
        }
    }
}

// ── Workflow state ───────────────────────────────────────────

/// Who may touch a node right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Available,
    Claimed,
    Blocked,
}

wire_enum!(WorkflowState, "workflow state", {
    Available => "available",
    Claimed => "claimed",
    Blocked => "blocked",
});

impl WorkflowState {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Available => "Node is free to be claimed by an agent",
            Self::Claimed => "Node is currently owned by an agent",
            Self::Blocked => "Node is waiting on validation dependencies",
        }
    }

    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [WorkflowState] {
        match self {
            Self::Available => &[Self::Claimed, Self::Blocked],
            Self::Claimed => &[Self::Available, Self::Blocked],
            Self::Blocked => &[Self::Available],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, to: WorkflowState) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

pub fn validate_workflow_transition(from: &str, to: &str) -> Result<(), SchemaError> {
    let from_state: WorkflowState = from.parse()?;
    let to_state: WorkflowState = to.parse()?;
    check_workflow_transition(from_state, to_state)
}

pub fn check_workflow_transition(from: WorkflowState, to: WorkflowState) -> Result<(), SchemaError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SchemaError::InvalidTransition {
            kind: "workflow",
            from: from.as_str().to_owned(),
            to: to.as_str().to_owned(),
        })
    }
}

// ── Epistemic state ──────────────────────────────────────────

/// Whether a node is believed true.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpistemicState {
    #[default]
    Pending,
    Validated,
    Admitted,
    Refuted,
    Archived,
    NeedsRefinement,
}

wire_enum!(EpistemicState, "epistemic state", {
    Pending => "pending",
    Validated => "validated",
    Admitted => "admitted",
    Refuted => "refuted",
    Archived => "archived",
    NeedsRefinement => "needs_refinement",
});

impl EpistemicState {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Pending => "Awaiting verification",
            Self::Validated => "Accepted by a verifier",
            Self::Admitted => "Accepted without proof; introduces taint",
            Self::Refuted => "Shown to be false",
            Self::Archived => "Abandoned; no longer part of the proof",
            Self::NeedsRefinement => "Reopened for further decomposition",
        }
    }

    /// No outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Admitted | Self::Refuted | Self::Archived)
    }

    /// Positive final states: the node counts as settled for its dependents.
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Validated | Self::Admitted)
    }

    #[must_use]
    pub const fn introduces_taint(self) -> bool {
        matches!(self, Self::Admitted)
    }

    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [EpistemicState] {
        match self {
            Self::Pending | Self::NeedsRefinement => &[
                Self::Validated,
                Self::Admitted,
                Self::Refuted,
                Self::Archived,
            ],
            Self::Validated => &[Self::NeedsRefinement],
            Self::Admitted | Self::Refuted | Self::Archived => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, to: EpistemicState) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

/// Validate an epistemic transition given wire names.
///
/// Unknown names fail with [`SchemaError::InvalidState`] before legality is
/// checked.
pub fn validate_transition(from: &str, to: &str) -> Result<(), SchemaError> {
    let from_state: EpistemicState = from.parse()?;
    let to_state: EpistemicState = to.parse()?;
    check_transition(from_state, to_state)
}

pub fn check_transition(from: EpistemicState, to: EpistemicState) -> Result<(), SchemaError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(SchemaError::InvalidTransition {
            kind: "epistemic",
            from: from.as_str().to_owned(),
            to: to.as_str().to_owned(),
        })
    }
}

// ── Taint state ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaintState {
    Clean,
    SelfAdmitted,
    Tainted,
    #[default]
    Unresolved,
}

wire_enum!(TaintState, "taint state", {
    Clean => "clean",
    SelfAdmitted => "self_admitted",
    Tainted => "tainted",
    Unresolved => "unresolved",
});

impl TaintState {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Clean => "Rests only on verified ground",
            Self::SelfAdmitted => "Admitted without proof at this node",
            Self::Tainted => "Depends on admitted or refuted ground",
            Self::Unresolved => "Inputs changed; awaiting recomputation",
        }
    }

    /// Whether dependents inherit taint from a node in this state.
    #[must_use]
    pub const fn spreads(self) -> bool {
        matches!(self, Self::SelfAdmitted | Self::Tainted)
    }
}

// ── Challenges ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeTarget {
    Statement,
    Inference,
    Dependencies,
    Scope,
    Context,
    Gap,
    Domain,
    TypeError,
    Completeness,
}

wire_enum!(ChallengeTarget, "challenge target", {
    Statement => "statement",
    Inference => "inference",
    Dependencies => "dependencies",
    Scope => "scope",
    Context => "context",
    Gap => "gap",
    Domain => "domain",
    TypeError => "type_error",
    Completeness => "completeness",
});

impl ChallengeTarget {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Statement => "The claim itself is disputed",
            Self::Inference => "The inference rule does not apply",
            Self::Dependencies => "Cited dependencies are wrong or missing",
            Self::Scope => "A local hypothesis is used outside its scope",
            Self::Context => "Referenced definitions or externals are wrong",
            Self::Gap => "A logical gap needs further steps",
            Self::Domain => "A domain restriction is violated",
            Self::TypeError => "Terms are used at the wrong type",
            Self::Completeness => "The case analysis is not exhaustive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeSeverity {
    Critical,
    #[default]
    Major,
    Minor,
    Note,
}

wire_enum!(ChallengeSeverity, "challenge severity", {
    Critical => "critical",
    Major => "major",
    Minor => "minor",
    Note => "note",
});

impl ChallengeSeverity {
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Critical => "Fundamental error; must be fixed before acceptance",
            Self::Major => "Significant issue; must be addressed before acceptance",
            Self::Minor => "Small issue; does not block acceptance",
            Self::Note => "Clarification request; does not block acceptance",
        }
    }

    /// Open challenges of a blocking severity prevent acceptance.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, Self::Critical | Self::Major)
    }
}

#[must_use]
pub const fn is_blocking_severity(severity: ChallengeSeverity) -> bool {
    severity.is_blocking()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    #[default]
    Open,
    Resolved,
    Withdrawn,
}

wire_enum!(ChallengeStatus, "challenge status", {
    Open => "open",
    Resolved => "resolved",
    Withdrawn => "withdrawn",
});

impl ChallengeStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}
