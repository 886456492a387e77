//! Error types for cadence-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering content into repository files.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading user templates.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// A slug that cannot be used as a file name.
    #[error("invalid slug '{slug}' for content {name}")]
    InvalidSlug { slug: String, name: String },

    /// Two items in the same set would write the same file.
    #[error("slug '{slug}' is used by more than one item")]
    DuplicateSlug { slug: String },
}
