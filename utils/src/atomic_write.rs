//! Crash-safe file replacement for state snapshots.
//!
//! Bytes are written to a temp file in the destination directory, synced,
//! then renamed over the target. Readers therefore see either the previous
//! snapshot or the new one, never a torn write. When a platform refuses to
//! rename over an existing file the previous content is parked at `<path>.bak`
//! for the duration of the swap, and [`recover_backup`] restores it if the
//! process died inside that window.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// fsync the temp file before the rename and the directory after it.
    #[default]
    Durable,
    /// Skip fsync; used by tests and throwaway state.
    Fast,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub sync: SyncPolicy,
    /// Create missing parent directories.
    pub create_parents: bool,
}

impl WriteOptions {
    #[must_use]
    pub fn durable() -> Self {
        Self {
            sync: SyncPolicy::Durable,
            create_parents: true,
        }
    }

    #[must_use]
    pub fn fast() -> Self {
        Self {
            sync: SyncPolicy::Fast,
            create_parents: true,
        }
    }
}

/// Outcome of [`recover_backup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Nothing to do: either the target exists or there is no backup.
    Clean,
    /// The backup was moved back into place.
    Restored,
}

pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    write_atomic_with_options(path, bytes, WriteOptions::durable())
}

pub fn write_atomic_with_options(
    path: impl AsRef<Path>,
    bytes: &[u8],
    options: WriteOptions,
) -> io::Result<()> {
    let path = path.as_ref();
    let parent = parent_dir(path);
    if options.create_parents {
        fs::create_dir_all(parent)?;
    }

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    if options.sync == SyncPolicy::Durable {
        tmp.as_file().sync_all()?;
    }

    if let Err(err) = tmp.persist(path) {
        if !path.exists() {
            return Err(err.error);
        }
        // Rename-over-existing refused: park the old file, then retry.
        let backup = backup_path(path);
        let _ = fs::remove_file(&backup);
        fs::rename(path, &backup)?;
        if let Err(retry) = err.file.persist(path) {
            let _ = fs::rename(&backup, path);
            return Err(retry.error);
        }
        if let Err(e) = fs::remove_file(&backup) {
            warn!(path = %backup.display(), "Failed to remove backup after atomic write: {e}");
        }
    }

    if options.sync == SyncPolicy::Durable {
        sync_dir_best_effort(parent);
    }
    debug!(path = %path.display(), bytes = bytes.len(), "Snapshot written");
    Ok(())
}

/// Restore `<path>.bak` if a crash left the target missing.
pub fn recover_backup(path: impl AsRef<Path>) -> io::Result<Recovery> {
    let path = path.as_ref();
    let backup = backup_path(path);
    if path.exists() || !backup.exists() {
        return Ok(Recovery::Clean);
    }
    fs::rename(&backup, path)?;
    warn!(path = %path.display(), "Recovered snapshot from interrupted write");
    Ok(Recovery::Restored)
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    name.into()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn sync_dir_best_effort(dir: &Path) {
    #[cfg(unix)]
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), "Directory sync failed (best-effort): {e}");
    }
    #[cfg(not(unix))]
    let _ = dir;
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{Recovery, WriteOptions, backup_path, recover_backup, write_atomic_with_options};

    #[test]
    fn overwrites_existing_and_leaves_no_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        write_atomic_with_options(&path, b"one", WriteOptions::fast()).expect("write one");
        write_atomic_with_options(&path, b"two", WriteOptions::fast()).expect("write two");

        assert_eq!(fs::read_to_string(&path).expect("read"), "two");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("deeper").join("state.json");

        write_atomic_with_options(&path, b"{}", WriteOptions::durable()).expect("write");
        assert_eq!(fs::read_to_string(&path).expect("read"), "{}");
    }

    #[test]
    fn recovers_backup_when_target_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(backup_path(&path), b"previous").expect("seed backup");

        assert_eq!(recover_backup(&path).expect("recover"), Recovery::Restored);
        assert_eq!(fs::read_to_string(&path).expect("read"), "previous");
        assert_eq!(recover_backup(&path).expect("recover"), Recovery::Clean);
    }

    #[test]
    fn backup_is_ignored_when_target_exists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        fs::write(&path, b"current").expect("seed target");
        fs::write(backup_path(&path), b"stale").expect("seed backup");

        assert_eq!(recover_backup(&path).expect("recover"), Recovery::Clean);
        assert_eq!(fs::read_to_string(&path).expect("read"), "current");
    }
}
