//! Multi-agent workflow through the shared handle.

use vellum_core::{SharedState, StateError, find_jobs, propagate};
use vellum_types::{
    ChallengeSeverity, ChallengeTarget, Definition, EpistemicState, InferenceType, Node,
    NodeDraft, TaintState, WorkflowState,
};

use crate::common::{claim_node, id, small_proof};

fn ids(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.id.to_string()).collect()
}

#[test]
fn prover_refines_and_verifier_accepts() {
    let shared = SharedState::default();
    shared.add_node(claim_node("1", "Theorem")).unwrap();

    let jobs = shared.find_jobs().unwrap().sorted();
    assert_eq!(ids(&jobs.prover), vec!["1"]);
    assert!(jobs.verifier.is_empty());

    shared.claim(&id("1"), "prover-1").unwrap();
    let step = NodeDraft::claim("Lemma", InferenceType::UniversalInstantiation);
    let child = shared.refine(&id("1"), "prover-1", step).unwrap();
    assert_eq!(child, id("1.1"));

    // The parent waits on its child; the child is now prover work.
    let jobs = shared.find_jobs().unwrap();
    assert_eq!(ids(&jobs.prover), vec!["1.1"]);
    assert!(jobs.verifier.is_empty());

    shared
        .apply_epistemic_transition(&child, EpistemicState::Validated)
        .unwrap();
    let jobs = shared.find_jobs().unwrap();
    assert!(jobs.prover.is_empty());
    assert_eq!(ids(&jobs.verifier), vec!["1"]);

    shared
        .apply_epistemic_transition(&id("1"), EpistemicState::Validated)
        .unwrap();
    shared.release(&id("1"), "prover-1").unwrap();
    assert!(shared.find_jobs().unwrap().is_empty());
    assert_eq!(
        shared.get_node(&id("1")).unwrap().workflow_state,
        WorkflowState::Available
    );
}

#[test]
fn challenge_blocks_then_resolution_unblocks() {
    let shared = SharedState::new(small_proof());
    let ch = shared
        .raise_challenge(
            &id("1.3"),
            ChallengeTarget::Dependencies,
            ChallengeSeverity::Major,
            "1.2 alone does not give the generator",
        )
        .unwrap();

    let err = shared
        .apply_epistemic_transition(&id("1.3"), EpistemicState::Admitted)
        .unwrap_err();
    assert!(matches!(err, StateError::BlockedByChallenge { .. }));
    assert!(err.to_string().contains(&ch));

    shared
        .resolve_challenge(&ch, "cited Lagrange's theorem explicitly")
        .unwrap();
    shared
        .apply_epistemic_transition(&id("1.3"), EpistemicState::Validated)
        .unwrap();
}

#[test]
fn refutation_taints_downstream_and_needs_refinement_reopens() {
    let mut state = small_proof();
    propagate(&mut state).unwrap();
    assert!(
        state
            .all_nodes()
            .iter()
            .all(|n| n.taint_state == TaintState::Clean)
    );

    state
        .apply_epistemic_transition(&id("1.2"), EpistemicState::Refuted)
        .unwrap();
    propagate(&mut state).unwrap();
    assert_eq!(
        state.get_node(&id("1.3")).unwrap().taint_state,
        TaintState::Tainted
    );
    assert_eq!(
        state.get_node(&id("1.1")).unwrap().taint_state,
        TaintState::Clean
    );

    // A validated step can be sent back for refinement and accepted again.
    state
        .apply_epistemic_transition(&id("1.1"), EpistemicState::Validated)
        .unwrap();
    state
        .apply_epistemic_transition(&id("1.1"), EpistemicState::NeedsRefinement)
        .unwrap();
    let jobs = find_jobs(state.all_nodes());
    assert!(!ids(&jobs.prover).contains(&"1.1".to_owned()));
    state
        .apply_epistemic_transition(&id("1.1"), EpistemicState::Validated)
        .unwrap();

    // Refuted is terminal.
    assert!(
        state
            .apply_epistemic_transition(&id("1.2"), EpistemicState::Pending)
            .unwrap_err()
            .is_invalid_transition()
    );
}

#[test]
fn context_tags_resolve_once_definitions_arrive() {
    let mut state = small_proof();
    let before = state.resolve_context(&id("1")).unwrap();
    assert!(before.iter().all(|r| !r.is_resolved()));

    state
        .add_definition(Definition::new("d-group", "group", "a set with an associative operation"))
        .unwrap();
    let after = state.resolve_context(&id("1")).unwrap();
    assert_eq!(after.iter().filter(|r| r.is_resolved()).count(), 1);
}
