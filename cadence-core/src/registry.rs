//! Per-repository YAML target registry.
//!
//! # Storage layout
//!
//! ```text
//! ~/.cadence/
//!   repositories/
//!     <repository_id>.yaml   (repository + its targets, mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function takes an explicit `home: &Path` (`fn_at(home, …)`); callers
//! obtain it from [`default_home`] or a `--home` override. Tests always pass a
//! `TempDir`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::types::{OrganizationId, Repository, RepositoryId, ResolvedTarget, Target, TargetId};

/// Name given to the root target created when a repository is connected.
pub const ROOT_TARGET_NAME: &str = "default";

/// On-disk record: one connected repository and all of its targets,
/// including soft-deleted ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub repository: Repository,
    #[serde(default)]
    pub targets: Vec<Target>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RepositoryRecord {
    /// Targets that have not been soft-deleted.
    pub fn live_targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(|t| !t.is_deleted())
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `~` as reported by `dirs::home_dir()`.
pub fn default_home() -> Result<PathBuf, RegistryError> {
    dirs::home_dir().ok_or(RegistryError::HomeNotFound)
}

/// `<home>/.cadence/`
pub fn cadence_dir_at(home: &Path) -> PathBuf {
    home.join(".cadence")
}

/// `<home>/.cadence/repositories/`
pub fn repositories_dir_at(home: &Path) -> PathBuf {
    cadence_dir_at(home).join("repositories")
}

/// `<home>/.cadence/repositories/<id>.yaml`, pure.
pub fn repository_path_at(home: &Path, id: &RepositoryId) -> PathBuf {
    repositories_dir_at(home).join(format!("{}.yaml", id.0))
}

// ---------------------------------------------------------------------------
// 2. Validation
// ---------------------------------------------------------------------------

/// Trim a target name; empty or whitespace-only names are rejected.
pub fn validate_target_name(name: &str) -> Result<String, RegistryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::EmptyTargetName);
    }
    Ok(trimmed.to_string())
}

/// Normalise a target path to `/seg/seg/` form.
///
/// The path must be absolute within the repository (leading `/`) and may not
/// contain `.` or `..` segments or backslashes. Repeated slashes collapse and
/// a trailing slash is added when missing.
pub fn normalize_target_path(path: &str) -> Result<String, RegistryError> {
    let invalid = || RegistryError::InvalidPath { path: path.to_string() };
    let trimmed = path.trim();
    if trimmed.is_empty() || !trimmed.starts_with('/') || trimmed.contains('\\') {
        return Err(invalid());
    }
    let mut segments = Vec::new();
    for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(invalid());
        }
        segments.push(segment);
    }
    if segments.is_empty() {
        return Ok(Target::ROOT_PATH.to_string());
    }
    Ok(format!("/{}/", segments.join("/")))
}

// ---------------------------------------------------------------------------
// 3. Load
// ---------------------------------------------------------------------------

/// Load one repository record.
///
/// Returns `RegistryError::RepositoryNotFound` if absent,
/// `RegistryError::Parse` (with path + line context) if malformed YAML.
pub fn load_repository_at(home: &Path, id: &RepositoryId) -> Result<RepositoryRecord, RegistryError> {
    let path = repository_path_at(home, id);
    if !path.exists() {
        return Err(RegistryError::RepositoryNotFound { id: id.clone() });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })
}

/// All repository records, sorted by repository id.
pub fn list_repositories_at(home: &Path) -> Result<Vec<RepositoryRecord>, RegistryError> {
    let dir = repositories_dir_at(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut entries: Vec<_> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    let mut records = Vec::new();
    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("yaml") {
            continue;
        }
        let contents = std::fs::read_to_string(&path)?;
        let record: RepositoryRecord = serde_yaml::from_str(&contents)
            .map_err(|e| RegistryError::Parse { path: path.clone(), source: e })?;
        records.push(record);
    }
    Ok(records)
}

/// Live targets of one organization, with their repositories, sorted by
/// repository id then target path.
pub fn list_targets_at(
    home: &Path,
    organization: &OrganizationId,
) -> Result<Vec<ResolvedTarget>, RegistryError> {
    let mut resolved = Vec::new();
    for record in list_repositories_at(home)? {
        if &record.repository.organization_id != organization {
            continue;
        }
        let mut targets: Vec<&Target> = record.live_targets().collect();
        targets.sort_by(|a, b| a.path.cmp(&b.path));
        for target in targets {
            resolved.push(ResolvedTarget {
                target: target.clone(),
                repository: record.repository.clone(),
            });
        }
    }
    Ok(resolved)
}

/// Find a target by id across all repositories, including soft-deleted ones.
pub fn find_target_at(home: &Path, id: &TargetId) -> Result<Option<ResolvedTarget>, RegistryError> {
    for record in list_repositories_at(home)? {
        if let Some(target) = record.targets.iter().find(|t| &t.id == id) {
            return Ok(Some(ResolvedTarget {
                target: target.clone(),
                repository: record.repository.clone(),
            }));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// 4. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically save a repository record.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_repository_at(home: &Path, record: &RepositoryRecord) -> Result<(), RegistryError> {
    let dir = repositories_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }
    let path = repository_path_at(home, &record.repository.id);
    let tmp_path = path.with_file_name(format!("{}.yaml.tmp", record.repository.id.0));

    let yaml = serde_yaml::to_string(record)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// 5. Mutations
// ---------------------------------------------------------------------------

/// Connect a repository and create its root target.
pub fn connect_repository_at(
    home: &Path,
    repository: Repository,
) -> Result<RepositoryRecord, RegistryError> {
    if repository_path_at(home, &repository.id).exists() {
        return Err(RegistryError::RepositoryExists { id: repository.id });
    }
    let now = Utc::now();
    let root = Target {
        id: new_target_id(),
        name: ROOT_TARGET_NAME.to_string(),
        path: Target::ROOT_PATH.to_string(),
        repository_id: repository.id.clone(),
        deleted_at: None,
    };
    let record = RepositoryRecord {
        repository,
        targets: vec![root],
        created_at: now,
        updated_at: now,
    };
    save_repository_at(home, &record)?;
    tracing::info!(repository = %record.repository.id, "connected repository");
    Ok(record)
}

/// Add an extra publish location to a connected repository.
pub fn add_target_at(
    home: &Path,
    repository: &RepositoryId,
    name: &str,
    path: &str,
) -> Result<Target, RegistryError> {
    let name = validate_target_name(name)?;
    let path = normalize_target_path(path)?;
    let mut record = load_repository_at(home, repository)?;
    if record.live_targets().any(|t| t.path == path) {
        return Err(RegistryError::DuplicatePath { repository: repository.clone(), path });
    }
    let target = Target {
        id: new_target_id(),
        name,
        path,
        repository_id: repository.clone(),
        deleted_at: None,
    };
    record.targets.push(target.clone());
    record.updated_at = Utc::now();
    save_repository_at(home, &record)?;
    tracing::info!(target_id = %target.id, path = %target.path, "added target");
    Ok(target)
}

/// Rename a non-root target.
pub fn rename_target_at(home: &Path, id: &TargetId, name: &str) -> Result<Target, RegistryError> {
    let name = validate_target_name(name)?;
    update_target(home, id, "renamed", |target| {
        target.name = name;
        Ok(())
    })
}

/// Move a non-root target to another path in the same repository.
pub fn update_target_path_at(home: &Path, id: &TargetId, path: &str) -> Result<Target, RegistryError> {
    let path = normalize_target_path(path)?;
    let resolved = find_target_at(home, id)?.ok_or_else(|| RegistryError::TargetNotFound { id: id.clone() })?;
    let record = load_repository_at(home, &resolved.repository.id)?;
    if record.live_targets().any(|t| &t.id != id && t.path == path) {
        return Err(RegistryError::DuplicatePath {
            repository: resolved.repository.id,
            path,
        });
    }
    update_target(home, id, "moved", |target| {
        target.path = path;
        Ok(())
    })
}

/// Soft-delete a non-root target. Its deployment history is kept.
pub fn remove_target_at(home: &Path, id: &TargetId) -> Result<Target, RegistryError> {
    update_target(home, id, "removed", |target| {
        target.deleted_at = Some(Utc::now());
        Ok(())
    })
}

fn update_target<F>(
    home: &Path,
    id: &TargetId,
    action: &'static str,
    apply: F,
) -> Result<Target, RegistryError>
where
    F: FnOnce(&mut Target) -> Result<(), RegistryError>,
{
    let resolved = find_target_at(home, id)?.ok_or_else(|| RegistryError::TargetNotFound { id: id.clone() })?;
    if resolved.target.is_deleted() {
        return Err(RegistryError::TargetNotFound { id: id.clone() });
    }
    if resolved.target.is_root() {
        return Err(RegistryError::RootTargetImmutable { id: id.clone(), action });
    }
    let mut record = load_repository_at(home, &resolved.repository.id)?;
    let target = record
        .targets
        .iter_mut()
        .find(|t| &t.id == id)
        .ok_or_else(|| RegistryError::TargetNotFound { id: id.clone() })?;
    apply(target)?;
    let updated = target.clone();
    record.updated_at = Utc::now();
    save_repository_at(home, &record)?;
    tracing::info!(target_id = %id, action, "updated target");
    Ok(updated)
}

// ---------------------------------------------------------------------------
// 6. TargetRegistry
// ---------------------------------------------------------------------------

/// Resolves opaque target ids to (repository, path) pairs.
pub trait TargetRegistry: Send + Sync {
    /// Resolve a live target. Soft-deleted and unknown targets yield `None`.
    fn resolve(&self, id: &TargetId) -> Result<Option<ResolvedTarget>, RegistryError>;

    /// Live targets of an organization.
    fn list_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<ResolvedTarget>, RegistryError>;

    /// Repositories connected by an organization.
    fn repositories_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<Repository>, RegistryError>;
}

/// [`TargetRegistry`] over the YAML files under `<home>/.cadence/repositories/`.
#[derive(Debug, Clone)]
pub struct FileTargetRegistry {
    home: PathBuf,
}

impl FileTargetRegistry {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }
}

impl TargetRegistry for FileTargetRegistry {
    fn resolve(&self, id: &TargetId) -> Result<Option<ResolvedTarget>, RegistryError> {
        Ok(find_target_at(&self.home, id)?.filter(|r| !r.target.is_deleted()))
    }

    fn list_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<ResolvedTarget>, RegistryError> {
        list_targets_at(&self.home, organization)
    }

    fn repositories_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<Repository>, RegistryError> {
        Ok(list_repositories_at(&self.home)?
            .into_iter()
            .map(|r| r.repository)
            .filter(|r| &r.organization_id == organization)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn new_target_id() -> TargetId {
    TargetId::from(uuid::Uuid::now_v7().to_string())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), RegistryError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), RegistryError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
