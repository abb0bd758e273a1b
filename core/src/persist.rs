//! Saving and loading store snapshots as JSON files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use vellum_config::EngineConfig;
use vellum_utils::{Recovery, WriteOptions, recover_backup, write_atomic_with_options};

use crate::error::StateError;
use crate::shared::{SharedOptions, SharedState};
use crate::state::{SNAPSHOT_VERSION, State, StateSnapshot};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot I/O failed for {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("snapshot at {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("snapshot at {} has unsupported version {found} (expected {expected})", path.display())]
    Version {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("snapshot at {} is inconsistent: {source}", path.display())]
    Invalid { path: PathBuf, source: StateError },
}

/// Write `state` to `path` as pretty JSON, atomically.
pub fn save_snapshot(path: &Path, state: &State) -> Result<(), PersistError> {
    save_snapshot_with_options(path, state, WriteOptions::durable())
}

pub fn save_snapshot_with_options(
    path: &Path,
    state: &State,
    options: WriteOptions,
) -> Result<(), PersistError> {
    let snapshot = state.snapshot();
    let mut bytes = serde_json::to_vec_pretty(&snapshot).map_err(|source| PersistError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    bytes.push(b'\n');
    write_atomic_with_options(path, &bytes, options).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), nodes = snapshot.nodes.len(), "Snapshot saved");
    Ok(())
}

/// Read and re-validate a snapshot. An interrupted earlier save is
/// recovered first.
pub fn load_snapshot(path: &Path) -> Result<State, PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    if recover_backup(path).map_err(io_err)? == Recovery::Restored {
        warn!(path = %path.display(), "Restored snapshot backup before loading");
    }

    let content = fs::read(path).map_err(io_err)?;
    let snapshot: StateSnapshot =
        serde_json::from_slice(&content).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PersistError::Version {
            path: path.to_path_buf(),
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    let state = State::from_snapshot(snapshot).map_err(|source| PersistError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), nodes = state.node_count(), "Snapshot loaded");
    Ok(state)
}

/// Build a [`SharedState`] from engine configuration: load `state_file` when
/// it names an existing snapshot, otherwise start empty.
pub fn open_configured(config: &EngineConfig) -> Result<SharedState, PersistError> {
    let options = SharedOptions::from(config);
    let state = match config.state_path() {
        Some(path) if path.exists() => load_snapshot(&path)?,
        Some(path) => {
            debug!(path = %path.display(), "No snapshot yet; starting empty");
            State::new()
        }
        None => State::new(),
    };
    Ok(SharedState::with_options(state, options))
}
