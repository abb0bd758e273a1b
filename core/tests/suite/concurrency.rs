//! Racing agents against one shared store.

use std::sync::{Arc, Barrier};
use std::thread;

use vellum_core::{SharedState, StateError};
use vellum_types::{
    ChallengeSeverity, ChallengeTarget, EpistemicState, InferenceType, NodeDraft, WorkflowState,
};

use crate::common::{id, small_proof};

#[test]
fn concurrent_claims_have_exactly_one_winner() {
    const AGENTS: usize = 8;

    let shared = SharedState::new(small_proof());
    let barrier = Arc::new(Barrier::new(AGENTS));
    let handles: Vec<_> = (0..AGENTS)
        .map(|n| {
            let shared = shared.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let agent = format!("prover-{n}");
                barrier.wait();
                (agent.clone(), shared.claim(&id("1.1"), &agent))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("agent thread panicked"))
        .collect();
    let winners: Vec<&String> = results
        .iter()
        .filter(|(_, r)| r.is_ok())
        .map(|(agent, _)| agent)
        .collect();
    assert_eq!(winners.len(), 1);

    for (_, result) in results.iter().filter(|(_, r)| r.is_err()) {
        assert!(matches!(
            result,
            Err(StateError::AlreadyClaimed { owner, .. }) if owner == winners[0]
        ));
    }

    let node = shared.get_node(&id("1.1")).unwrap();
    assert_eq!(node.workflow_state, WorkflowState::Claimed);
    assert_eq!(node.claimed_by.as_ref(), Some(winners[0]));
}

#[test]
fn readers_never_see_a_blocked_node_accepted() {
    let shared = SharedState::new(small_proof());
    let ch = shared
        .raise_challenge(
            &id("1.2"),
            ChallengeTarget::Statement,
            ChallengeSeverity::Critical,
            "p might not be prime here",
        )
        .unwrap();

    let verifiers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared.apply_epistemic_transition(&id("1.2"), EpistemicState::Validated)
            })
        })
        .collect();
    for handle in verifiers {
        let result = handle.join().expect("verifier thread panicked");
        assert!(matches!(result, Err(StateError::BlockedByChallenge { .. })));
    }
    assert_eq!(
        shared.get_node(&id("1.2")).unwrap().epistemic_state,
        EpistemicState::Pending
    );

    shared.withdraw_challenge(&ch).unwrap();
    let verifiers: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared.apply_epistemic_transition(&id("1.2"), EpistemicState::Validated)
            })
        })
        .collect();
    let accepted = verifiers
        .into_iter()
        .map(|h| h.join().expect("verifier thread panicked"))
        .filter(Result::is_ok)
        .count();
    // The first one wins; validated -> validated is not a legal transition.
    assert_eq!(accepted, 1);
}

#[test]
fn refinements_from_many_threads_get_distinct_ids() {
    let shared = SharedState::new(small_proof());
    shared.claim(&id("1.3"), "prover").unwrap();

    let handles: Vec<_> = (0..6)
        .map(|n| {
            let shared = shared.clone();
            thread::spawn(move || {
                let draft = NodeDraft::claim(format!("sub-step {n}"), InferenceType::ByDefinition);
                shared.refine(&id("1.3"), "prover", draft)
            })
        })
        .collect();
    let mut ids: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked").unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 6);
    assert_eq!(shared.read(|state| state.children(&id("1.3")).len()), 6);
}
