//! [`FileUpdates`] and the [`ContentRenderer`] seam.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use cadence_core::types::{ContentKind, ContentVersion, Repository, Target};
use cadence_core::AgentKind;

use crate::error::RenderError;

/// One file to write, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub path: PathBuf,
    pub content: String,
}

/// File mutations produced by a renderer for one target.
///
/// `create_or_update` always describes the full merged set, not a delta;
/// deciding whether anything changed is the committer's job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdates {
    pub create_or_update: Vec<FileUpdate>,
    /// Files to remove if they exist.
    pub delete: Vec<PathBuf>,
}

impl FileUpdates {
    pub fn is_empty(&self) -> bool {
        self.create_or_update.is_empty() && self.delete.is_empty()
    }

    /// Every path touched, written files first.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.create_or_update.iter().map(|f| &f.path).chain(self.delete.iter())
    }
}

/// Turns a merged content set into repository files for one target.
pub trait ContentRenderer: Send + Sync {
    fn render(
        &self,
        kind: ContentKind,
        versions: &[ContentVersion],
        repository: &Repository,
        target: &Target,
        agents: &[AgentKind],
    ) -> Result<FileUpdates, RenderError>;
}
