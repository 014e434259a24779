//! Fatal errors raised while loading a project.
//!
//! Both enums travel inside `anyhow::Error` and can be told apart with
//! `downcast_ref`: a missing manifest is not the same failure as a malformed
//! one, and neither is a bad `[tool.oxidep]` option.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed or unrecognised settings in the `[tool.oxidep]` block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The key is not one of the known options, in either spelling.
    #[error("Config option '{key}' not recognised")]
    UnknownOption { key: String },

    /// The key is known but its value has the wrong shape.
    #[error("Config option '{key}': expected {expected}, got {got}")]
    WrongType { key: String, expected: &'static str, got: String },
}

/// Failures reading or interpreting `pyproject.toml`.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("project file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} has no [{section}] section", path.display())]
    MissingSection { path: PathBuf, section: &'static str },

    #[error("invalid {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("multiple pyproject.toml files specified")]
    MultipleManifests,
}
