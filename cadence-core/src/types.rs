//! Domain types for Cadence content publishing.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! All types are serializable/deserializable via serde (YAML for the registry
//! and catalog, JSON for deployment history).

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

string_newtype!(
    /// Owning organization of repositories, content and deployments.
    OrganizationId
);
string_newtype!(
    /// Author of a content version or a deployment.
    UserId
);
string_newtype!(
    /// Logical content item, stable across all of its versions.
    ContentId
);
string_newtype!(
    /// One specific version of a content item.
    VersionId
);
string_newtype!(
    /// Publish destination inside a repository.
    TargetId
);
string_newtype!(
    /// Connected repository.
    RepositoryId
);
string_newtype!(
    /// One publish attempt.
    DeploymentId
);

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The two parallel kinds of publishable content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Playbook,
    Standard,
}

impl ContentKind {
    pub fn all() -> &'static [ContentKind] {
        &[ContentKind::Playbook, ContentKind::Standard]
    }

    /// Plural, lowercase form used in directory names and commit messages.
    pub fn plural(&self) -> &'static str {
        match self {
            ContentKind::Playbook => "playbooks",
            ContentKind::Standard => "standards",
        }
    }

    /// Capitalised plural used as a heading.
    pub fn title(&self) -> &'static str {
        match self {
            ContentKind::Playbook => "Playbooks",
            ContentKind::Standard => "Standards",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Playbook => write!(f, "playbook"),
            ContentKind::Standard => write!(f, "standard"),
        }
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "playbook" | "playbooks" => Ok(ContentKind::Playbook),
            "standard" | "standards" => Ok(ContentKind::Standard),
            other => Err(format!(
                "unknown content kind '{other}'; expected: playbooks, standards"
            )),
        }
    }
}

/// Flat status of a deployment, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Success,
    NoChanges,
    Failure,
}

impl DistributionStatus {
    /// Whether a deployment with this status can make content live at its target.
    ///
    /// A failed attempt produced no commit, so it must not shadow
    /// what an earlier successful or no-op deployment left there.
    pub fn contributes_to_active_set(&self) -> bool {
        !matches!(self, DistributionStatus::Failure)
    }
}

impl fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionStatus::Success => write!(f, "success"),
            DistributionStatus::NoChanges => write!(f, "no_changes"),
            DistributionStatus::Failure => write!(f, "failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// One immutable, numbered snapshot of a playbook or standard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentVersion {
    pub id: VersionId,
    pub content_id: ContentId,
    pub name: String,
    pub slug: String,
    /// Strictly increasing per `content_id`, starting at 1.
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub payload: String,
    pub author_id: UserId,
}

// ---------------------------------------------------------------------------
// Repositories and targets
// ---------------------------------------------------------------------------

/// A connected repository. `path` is the local checkout the committers write to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepositoryId,
    pub organization_id: OrganizationId,
    pub owner: String,
    pub name: String,
    pub branch: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Repository {
    /// `owner/name@branch`, used in logs and tables.
    pub fn display_name(&self) -> String {
        format!("{}/{}@{}", self.owner, self.name, self.branch)
    }
}

/// A publish destination: a sub-directory of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    /// Always starts and ends with `/`. The root target is `/`.
    pub path: String,
    pub repository_id: RepositoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Target {
    pub const ROOT_PATH: &'static str = "/";

    pub fn is_root(&self) -> bool {
        self.path == Self::ROOT_PATH
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Path relative to the repository root, without leading slash.
    /// The root target yields an empty `PathBuf`.
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(self.path.trim_start_matches('/'))
    }
}

/// A target together with the repository it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub target: Target,
    pub repository: Repository,
}

// ---------------------------------------------------------------------------
// Deployments
// ---------------------------------------------------------------------------

/// Reference to the commit produced by a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRef {
    pub sha: String,
    pub message: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Outcome of a deployment. The commit exists iff the outcome is `Success`
/// and the error exists iff it is `Failure`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeploymentOutcome {
    Success { commit: CommitRef },
    NoChanges,
    Failure { error: String },
}

impl DeploymentOutcome {
    pub fn status(&self) -> DistributionStatus {
        match self {
            DeploymentOutcome::Success { .. } => DistributionStatus::Success,
            DeploymentOutcome::NoChanges => DistributionStatus::NoChanges,
            DeploymentOutcome::Failure { .. } => DistributionStatus::Failure,
        }
    }
}

/// One immutable record of a publish attempt to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub id: DeploymentId,
    pub organization_id: OrganizationId,
    pub author_id: UserId,
    pub kind: ContentKind,
    pub target: Target,
    pub created_at: DateTime<Utc>,
    /// Everything the attempt rendered at the target: the active set merged
    /// with the requested versions. At most one version per `content_id`.
    pub content_versions: Vec<ContentVersion>,
    #[serde(flatten)]
    pub outcome: DeploymentOutcome,
    #[serde(default)]
    pub agents: Vec<AgentKind>,
}

impl Deployment {
    pub fn status(&self) -> DistributionStatus {
        self.outcome.status()
    }

    pub fn commit(&self) -> Option<&CommitRef> {
        match &self.outcome {
            DeploymentOutcome::Success { commit } => Some(commit),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            DeploymentOutcome::Failure { error } => Some(error.as_str()),
            _ => None,
        }
    }

    pub fn includes_content(&self, content_id: &ContentId) -> bool {
        self.content_versions
            .iter()
            .any(|v| &v.content_id == content_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
