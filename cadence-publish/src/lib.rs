//! # cadence-publish
//!
//! Publishing playbooks and standards to repository targets, the append-only
//! deployment history, and the overviews derived from it.
//!
//! Most callers only need [`DeploymentService`]. The pieces it is built from
//! are public so they can be tested and recombined:
//! [`merge`], [`active`], [`history`], [`committer`], [`publisher`],
//! [`overview`] and [`diff`].

pub mod active;
pub mod committer;
pub mod diff;
pub mod error;
pub mod history;
pub mod merge;
pub mod overview;
pub mod publisher;
pub mod service;

pub use active::{fold_active, resolve_active, ActiveVersion, FoldOrder};
pub use committer::{DirectoryCommitter, GitCommitter, RepositoryCommitter, WriteResult};
pub use diff::FileDiff;
pub use error::{CommitError, HistoryError, OverviewError, PublishError};
pub use history::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
pub use overview::DeploymentOverview;
pub use service::DeploymentService;
