//! Snapshots on disk.

use std::fs;

use vellum_config::EngineConfig;
use vellum_core::{
    PersistError, State, StateError, load_snapshot, open_configured, propagate, save_snapshot,
};
use vellum_types::{ChallengeSeverity, ChallengeTarget, EpistemicState, Node, TaintState};

use crate::common::{id, small_proof};

#[test]
fn snapshot_survives_a_round_trip_to_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("proofs").join("prime.json");

    let mut state = small_proof();
    state.claim(&id("1.1"), "prover-a").unwrap();
    let ch = state
        .raise_challenge(&id("1.2"), ChallengeTarget::Gap, ChallengeSeverity::Minor, "why p?")
        .unwrap();
    state
        .apply_epistemic_transition(&id("1.2"), EpistemicState::Admitted)
        .unwrap();
    propagate(&mut state).unwrap();
    save_snapshot(&path, &state).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded.snapshot(), state.snapshot());
    assert_eq!(
        loaded.get_node(&id("1.1")).unwrap().claimed_by.as_deref(),
        Some("prover-a")
    );
    assert_eq!(
        loaded.get_node(&id("1.3")).unwrap().taint_state,
        TaintState::Tainted
    );
    assert!(loaded.get_challenge(&ch).unwrap().is_open());
    assert!(
        loaded
            .all_nodes()
            .iter()
            .all(Node::verify_content_hash)
    );
}

#[test]
fn tampered_snapshot_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prime.json");
    save_snapshot(&path, &small_proof()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let tampered = text.replacen("\"1.2\"", "\"1.2.7.1\"", 1);
    fs::write(&path, tampered).unwrap();

    assert!(matches!(
        load_snapshot(&path),
        Err(PersistError::Invalid {
            source: StateError::MissingParent { .. },
            ..
        })
    ));
}

#[test]
fn interrupted_save_is_recovered_on_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prime.json");
    save_snapshot(&path, &small_proof()).unwrap();

    // Simulate a crash between parking the old file and renaming the new one.
    let mut backup = path.as_os_str().to_owned();
    backup.push(".bak");
    fs::rename(&path, &backup).unwrap();

    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded.node_count(), 4);
    assert!(path.exists());
}

#[test]
fn configured_state_file_is_loaded() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("prime.json");
    save_snapshot(&path, &small_proof()).unwrap();

    let config = EngineConfig {
        state_file: Some(path.display().to_string()),
        propagate_on_write: true,
    };
    let shared = open_configured(&config).unwrap();
    assert_eq!(shared.read(State::node_count), 4);
}
