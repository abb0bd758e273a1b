//! Tracing subscriber setup.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::LoggingConfig;

const DEFAULT_FILTER: &str = "info";

/// Build the filter: `RUST_LOG` first, then the configured directives, then
/// `info`.
#[must_use]
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| match config.filter.as_deref() {
            Some(directives) => EnvFilter::try_new(directives),
            None => EnvFilter::try_new(DEFAULT_FILTER),
        })
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// With `logging.file` set, output is appended to that file without ANSI
/// colors; otherwise it goes to stderr. Returns the log file path in use.
/// Calling this twice is harmless: the second call leaves the first
/// subscriber in place.
pub fn init_tracing(config: &LoggingConfig) -> Option<PathBuf> {
    let filter = env_filter(config);

    if let Some(path) = config.file_path() {
        match open_log_file(&path) {
            Ok(file) => {
                let installed = tracing_subscriber::registry()
                    .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                    .with(filter)
                    .try_init()
                    .is_ok();
                if installed {
                    tracing::info!(path = %path.display(), "Logging initialized");
                }
                return Some(path);
            }
            Err(e) => {
                let _ = tracing_subscriber::registry()
                    .with(fmt::layer().with_writer(io::stderr))
                    .with(filter)
                    .try_init();
                tracing::warn!(path = %path.display(), "Failed to open log file: {e}");
                return None;
            }
        }
    }

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .try_init();
    None
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::{init_tracing, open_log_file};
    use crate::LoggingConfig;

    #[test]
    fn log_file_is_created_with_parents_and_appended() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("logs").join("vellum.log");

        open_log_file(&path).expect("first open");
        assert!(path.exists());
        open_log_file(&path).expect("reopen appends");
    }

    #[test]
    fn init_tracing_writes_to_configured_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vellum.log");
        let config = LoggingConfig {
            filter: Some("info".to_owned()),
            file: Some(path.display().to_string()),
        };

        assert_eq!(init_tracing(&config).as_deref(), Some(path.as_path()));
        assert!(path.exists());
        // A second install keeps the first subscriber and still reports the file.
        assert_eq!(init_tracing(&config).as_deref(), Some(path.as_path()));
        assert!(init_tracing(&LoggingConfig::default()).is_none());
    }
}
