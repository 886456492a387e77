//! Error types for cadence-publish.

use std::path::PathBuf;

use thiserror::Error;

use cadence_core::error::RegistryError;
use cadence_core::types::{ContentKind, Deployment, DeploymentId, TargetId, VersionId};
use cadence_renderer::RenderError;

/// Errors from a [`crate::history::HistoryStore`].
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored record could not be parsed.
    #[error("failed to parse deployment record {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("deployment record JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Records are append-only; an id can be written once.
    #[error("deployment {id} already recorded")]
    AlreadyExists { id: DeploymentId },

    #[error("history store lock poisoned")]
    Poisoned,
}

/// Outcome of a repository commit that did not produce a commit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    /// Rendered files are identical to what the repository already holds.
    #[error("no changes detected")]
    NoChanges,

    #[error("{0}")]
    Failed(String),
}

/// Errors returned by publish operations.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("{kind} version not found: {id}")]
    ContentVersionNotFound { kind: ContentKind, id: VersionId },

    #[error("target not found: {id}")]
    TargetNotFound { id: TargetId },

    #[error("at least one target is required")]
    NoTargets,

    /// At least one target failed. Every record produced by the call, including
    /// successful ones, is carried along; all of them are already persisted.
    #[error("commit failed for target {target}: {message}")]
    CommitFailed {
        target: TargetId,
        message: String,
        deployments: Vec<Deployment>,
    },

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("content provider error: {0}")]
    Provider(#[source] RegistryError),

    /// Only raised by previews; during a publish a render failure is recorded
    /// as a failed deployment instead.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from building deployment overviews.
#[derive(Debug, Error)]
pub enum OverviewError {
    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("content provider error: {0}")]
    Provider(#[source] RegistryError),
}

/// Convenience constructor for [`HistoryError::Io`].
pub(crate) fn history_io(path: impl Into<PathBuf>, source: std::io::Error) -> HistoryError {
    HistoryError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`PublishError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PublishError {
    PublishError::Io {
        path: path.into(),
        source,
    }
}
