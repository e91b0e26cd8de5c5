//! Coordinator configuration, read from TOML.
//!
//! ```toml
//! [guard]
//! rule = "dependency_not_pending"   # or "dependency_completed"
//! unresolved = "block"              # or "warn"
//! ```
//!
//! Every section and key is optional; missing ones take the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::workflow::TransitionGuard;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    /// `[guard]` section: blocking rule and unresolved-dependency policy.
    pub guard: TransitionGuard,
}

impl CoordinatorConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

/// Load a configuration file.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<CoordinatorConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    CoordinatorConfig::from_toml_str(&contents)
}
