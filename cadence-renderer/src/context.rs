//! Template context: serializable rendering payload built from a merged
//! content set and the target it is published to.

use serde::{Deserialize, Serialize};

use cadence_core::types::{ContentKind, ContentVersion, Repository, Target};

use crate::error::RenderError;

/// Everything a template may reference.
///
/// Nothing time-dependent is included, so rendering the same set twice
/// yields byte-identical output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    /// `playbook` / `standard`.
    pub kind: String,
    /// `playbooks` / `standards`.
    pub kind_plural: String,
    /// `Playbooks` / `Standards`.
    pub kind_title: String,
    pub repository: RepositoryCtx,
    pub target: TargetCtx,
    /// Repository-relative path of the index file.
    pub index_path: String,
    pub items: Vec<ItemCtx>,
    pub meta: MetaCtx,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryCtx {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCtx {
    pub name: String,
    pub path: String,
}

/// One content version as templates see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCtx {
    pub name: String,
    pub slug: String,
    pub version: u32,
    pub summary: Option<String>,
    pub payload: String,
    /// Repository-relative path of the canonical file.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaCtx {
    pub cadence_version: String,
}

/// `.cadence/<plural>/<slug>.md`, relative to the target directory.
pub fn canonical_file(kind: ContentKind, slug: &str) -> String {
    format!(".cadence/{}/{}.md", kind.plural(), slug)
}

/// `.cadence/<plural>-index.md`, relative to the target directory.
pub fn index_file(kind: ContentKind) -> String {
    format!(".cadence/{}-index.md", kind.plural())
}

/// Prefix a target-relative file with the target path, yielding a
/// repository-relative path with forward slashes and no leading `/`.
pub fn target_prefixed(target: &Target, file: &str) -> String {
    let dir = target.path.trim_start_matches('/');
    format!("{dir}{file}")
}

impl RenderContext {
    /// Build a context; `versions` are rendered in the order given.
    pub fn new(
        kind: ContentKind,
        versions: &[ContentVersion],
        repository: &Repository,
        target: &Target,
    ) -> Self {
        let items = versions
            .iter()
            .map(|v| ItemCtx {
                name: v.name.clone(),
                slug: v.slug.clone(),
                version: v.version,
                summary: v.summary.clone(),
                payload: v.payload.trim_end().to_string(),
                path: target_prefixed(target, &canonical_file(kind, &v.slug)),
            })
            .collect();

        RenderContext {
            kind: kind.to_string(),
            kind_plural: kind.plural().to_string(),
            kind_title: kind.title().to_string(),
            repository: RepositoryCtx {
                owner: repository.owner.clone(),
                name: repository.name.clone(),
                branch: repository.branch.clone(),
            },
            target: TargetCtx {
                name: target.name.clone(),
                path: target.path.clone(),
            },
            index_path: target_prefixed(target, &index_file(kind)),
            items,
            meta: MetaCtx {
                cadence_version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
