//! Read-only content catalog: the default [`ContentProvider`].
//!
//! # Storage layout
//!
//! ```text
//! ~/.cadence/
//!   content/
//!     playbooks/<content_id>.yaml
//!     standards/<content_id>.yaml
//! ```
//!
//! Each file holds one logical content item and every version authored for it.
//! Authoring happens elsewhere; this module only reads (and, for fixtures and
//! imports, writes whole items).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::registry::cadence_dir_at;
use crate::types::{ContentId, ContentKind, ContentVersion, OrganizationId, UserId, VersionId};

/// Source of authored content versions.
pub trait ContentProvider: Send + Sync {
    /// Look up a single version by its version-scoped id.
    fn get_version_by_id(
        &self,
        kind: ContentKind,
        id: &VersionId,
    ) -> Result<Option<ContentVersion>, RegistryError>;

    /// Every known version of every item of `kind` owned by `organization`.
    /// May contain several entries per `content_id`.
    fn list_all_for_organization(
        &self,
        kind: ContentKind,
        organization: &OrganizationId,
    ) -> Result<Vec<ContentVersion>, RegistryError>;
}

/// On-disk shape of one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub content_id: ContentId,
    pub organization_id: OrganizationId,
    #[serde(default)]
    pub versions: Vec<ItemVersion>,
}

/// A version as stored inside a [`ContentItem`] (the `content_id` is implied).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemVersion {
    pub id: VersionId,
    pub name: String,
    pub slug: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub payload: String,
    pub author_id: UserId,
}

impl ContentItem {
    /// Expand into standalone [`ContentVersion`]s.
    pub fn content_versions(&self) -> Vec<ContentVersion> {
        self.versions
            .iter()
            .map(|v| ContentVersion {
                id: v.id.clone(),
                content_id: self.content_id.clone(),
                name: v.name.clone(),
                slug: v.slug.clone(),
                version: v.version,
                summary: v.summary.clone(),
                payload: v.payload.clone(),
                author_id: v.author_id.clone(),
            })
            .collect()
    }
}

/// `<home>/.cadence/content/<kind plural>/`
pub fn content_dir_at(home: &Path, kind: ContentKind) -> PathBuf {
    cadence_dir_at(home).join("content").join(kind.plural())
}

/// `<home>/.cadence/content/<kind plural>/<content_id>.yaml`
pub fn item_path_at(home: &Path, kind: ContentKind, id: &ContentId) -> PathBuf {
    content_dir_at(home, kind).join(format!("{}.yaml", id.0))
}

/// Load every item of `kind`, sorted by file name.
pub fn list_items_at(home: &Path, kind: ContentKind) -> Result<Vec<ContentItem>, RegistryError> {
    let dir = content_dir_at(home, kind);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut items = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("yaml") {
            continue;
        }
        let contents = std::fs::read_to_string(&path)?;
        let item: ContentItem = serde_yaml::from_str(&contents)
            .map_err(|e| RegistryError::Parse { path: path.clone(), source: e })?;
        items.push(item);
    }
    Ok(items)
}

/// Atomically write a whole item (`.yaml.tmp` + rename).
pub fn save_item_at(home: &Path, kind: ContentKind, item: &ContentItem) -> Result<(), RegistryError> {
    let dir = content_dir_at(home, kind);
    std::fs::create_dir_all(&dir)?;
    let path = item_path_at(home, kind, &item.content_id);
    let tmp = path.with_file_name(format!("{}.yaml.tmp", item.content_id.0));
    std::fs::write(&tmp, serde_yaml::to_string(item)?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}

/// [`ContentProvider`] backed by the YAML catalog under `home`.
#[derive(Debug, Clone)]
pub struct FileContentCatalog {
    home: PathBuf,
}

impl FileContentCatalog {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }
}

impl ContentProvider for FileContentCatalog {
    fn get_version_by_id(
        &self,
        kind: ContentKind,
        id: &VersionId,
    ) -> Result<Option<ContentVersion>, RegistryError> {
        for item in list_items_at(&self.home, kind)? {
            if let Some(version) = item.content_versions().into_iter().find(|v| &v.id == id) {
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    fn list_all_for_organization(
        &self,
        kind: ContentKind,
        organization: &OrganizationId,
    ) -> Result<Vec<ContentVersion>, RegistryError> {
        Ok(list_items_at(&self.home, kind)?
            .into_iter()
            .filter(|item| &item.organization_id == organization)
            .flat_map(|item| item.content_versions())
            .collect())
    }
}
