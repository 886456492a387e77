//! Error types for cadence-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{RepositoryId, TargetId};

/// All errors that can arise from registry, catalog and config operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`, so we cannot locate `~/.cadence/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    #[error("repository not found: {id}")]
    RepositoryNotFound { id: RepositoryId },

    #[error("repository already connected: {id}")]
    RepositoryExists { id: RepositoryId },

    #[error("target not found: {id}")]
    TargetNotFound { id: TargetId },

    #[error("Target name cannot be empty")]
    EmptyTargetName,

    #[error("Invalid path format")]
    InvalidPath { path: String },

    #[error("a target already uses path {path} in repository {repository}")]
    DuplicatePath { repository: RepositoryId, path: String },

    /// The root target (`/`) is created with the repository and cannot be
    /// renamed, re-pathed or removed.
    #[error("the root target {id} cannot be {action}")]
    RootTargetImmutable { id: TargetId, action: &'static str },
}
