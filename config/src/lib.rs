//! Vellum configuration.
//!
//! Read from `~/.vellum/config.toml`, or from the file named by
//! `VELLUM_CONFIG`. A missing file is not an error; every setting has a
//! default.
//!
//! ```toml
//! [engine]
//! state_file = "${HOME}/proofs/current.json"
//! propagate_on_write = true
//!
//! [logging]
//! filter = "vellum_core=debug,info"
//! file = "/tmp/vellum.log"
//! ```

pub mod logging;

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub use logging::init_tracing;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "VELLUM_CONFIG";

// Default value function for serde (bool::default() is false, so only true needs a fn)
const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VellumConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Snapshot file the engine loads on start and saves to. `${VAR}`
    /// references are expanded.
    pub state_file: Option<String>,
    /// Recompute taint for affected nodes after every epistemic transition.
    #[serde(default = "default_true")]
    pub propagate_on_write: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            propagate_on_write: true,
        }
    }
}

impl EngineConfig {
    /// `state_file` with environment variables expanded.
    #[must_use]
    pub fn state_path(&self) -> Option<PathBuf> {
        self.state_file
            .as_deref()
            .map(expand_env_vars)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<String>,
}

impl LoggingConfig {
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .as_deref()
            .map(expand_env_vars)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}

impl VellumConfig {
    /// Load from the default location. `Ok(None)` when there is no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| {
            warn!(path = %path.display(), "Failed to read config: {source}");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(source) => {
                warn!(path = %path.display(), "Failed to parse config: {source}");
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
}

/// `$VELLUM_CONFIG` if set and non-empty, else `~/.vellum/config.toml`.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var(CONFIG_ENV_VAR)
        && !custom.trim().is_empty()
    {
        return Some(PathBuf::from(custom));
    }
    dirs::home_dir().map(|home| home.join(".vellum").join("config.toml"))
}

/// Replace `${VAR}` with the variable's value (empty when unset).
/// An unterminated `${` is kept verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + len];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 3 + len..];
    }

    out.push_str(rest);
    out
}
