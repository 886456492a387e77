//! Shared fixtures: in-memory provider and registry, plus a committer that
//! fails for chosen repositories.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use cadence_core::types::{
    CommitRef, ContentId, ContentKind, ContentVersion, OrganizationId, Repository, RepositoryId,
    ResolvedTarget, Target, TargetId, UserId, VersionId,
};
use cadence_core::{AgentKind, ContentProvider, RegistryError, TargetRegistry};
use cadence_publish::{
    CommitError, DeploymentService, DirectoryCommitter, MemoryHistoryStore, RepositoryCommitter,
};
use cadence_renderer::{FileUpdates, TeraRenderer};
use tempfile::TempDir;

pub fn acme() -> OrganizationId {
    OrganizationId::from("acme")
}

pub fn ada() -> UserId {
    UserId::from("ada")
}

pub fn version(content: &str, n: u32) -> ContentVersion {
    ContentVersion {
        id: VersionId::from(format!("{content}-v{n}")),
        content_id: ContentId::from(content),
        name: content.to_string(),
        slug: content.to_string(),
        version: n,
        summary: None,
        payload: format!("{content} body, revision {n}"),
        author_id: ada(),
    }
}

pub fn vid(content: &str, n: u32) -> VersionId {
    VersionId::from(format!("{content}-v{n}"))
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryProvider {
    versions: Mutex<Vec<(ContentKind, ContentVersion)>>,
}

impl MemoryProvider {
    pub fn add(&self, kind: ContentKind, version: ContentVersion) {
        self.versions.lock().unwrap().push((kind, version));
    }
}

impl ContentProvider for MemoryProvider {
    fn get_version_by_id(
        &self,
        kind: ContentKind,
        id: &VersionId,
    ) -> Result<Option<ContentVersion>, RegistryError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .find(|(k, v)| *k == kind && &v.id == id)
            .map(|(_, v)| v.clone()))
    }

    fn list_all_for_organization(
        &self,
        kind: ContentKind,
        _organization: &OrganizationId,
    ) -> Result<Vec<ContentVersion>, RegistryError> {
        Ok(self
            .versions
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryRegistry {
    targets: Mutex<Vec<ResolvedTarget>>,
}

impl MemoryRegistry {
    pub fn add(&self, id: &str, path: &str, repository: &Repository) -> TargetId {
        let target = Target {
            id: TargetId::from(id),
            name: id.to_string(),
            path: path.to_string(),
            repository_id: repository.id.clone(),
            deleted_at: None,
        };
        self.targets.lock().unwrap().push(ResolvedTarget { target, repository: repository.clone() });
        TargetId::from(id)
    }
}

impl TargetRegistry for MemoryRegistry {
    fn resolve(&self, id: &TargetId) -> Result<Option<ResolvedTarget>, RegistryError> {
        Ok(self.targets.lock().unwrap().iter().find(|t| &t.target.id == id).cloned())
    }

    fn list_for_organization(&self, organization: &OrganizationId) -> Result<Vec<ResolvedTarget>, RegistryError> {
        Ok(self
            .targets
            .lock()
            .unwrap()
            .iter()
            .filter(|t| &t.repository.organization_id == organization)
            .cloned()
            .collect())
    }

    fn repositories_for_organization(&self, organization: &OrganizationId) -> Result<Vec<Repository>, RegistryError> {
        let mut repos: Vec<Repository> = Vec::new();
        for t in self.list_for_organization(organization)? {
            if !repos.iter().any(|r| r.id == t.repository.id) {
                repos.push(t.repository);
            }
        }
        Ok(repos)
    }
}

// ---------------------------------------------------------------------------
// Committer
// ---------------------------------------------------------------------------

/// Directory committer that refuses to commit to listed repositories.
pub struct FlakyCommitter {
    inner: DirectoryCommitter,
    failing: Vec<RepositoryId>,
}

impl RepositoryCommitter for FlakyCommitter {
    fn commit(&self, repository: &Repository, files: &FileUpdates, message: &str) -> Result<CommitRef, CommitError> {
        if self.failing.contains(&repository.id) {
            return Err(CommitError::Failed(format!("push to {} rejected", repository.id)));
        }
        self.inner.commit(repository, files, message)
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub workspace: TempDir,
    pub provider: Arc<MemoryProvider>,
    pub registry: Arc<MemoryRegistry>,
    pub history: Arc<MemoryHistoryStore>,
    pub service: DeploymentService,
}

impl Harness {
    /// Service over a temp workspace; commits to `failing` repositories fail.
    pub fn new(failing: &[&str]) -> Self {
        let workspace = TempDir::new().expect("workspace");
        let provider = Arc::new(MemoryProvider::default());
        let registry = Arc::new(MemoryRegistry::default());
        let history = Arc::new(MemoryHistoryStore::new());
        let committer = FlakyCommitter {
            inner: DirectoryCommitter::new("ada"),
            failing: failing.iter().map(|r| RepositoryId::from(*r)).collect(),
        };
        let service = DeploymentService::new(
            provider.clone(),
            registry.clone(),
            history.clone(),
            Arc::new(TeraRenderer::new().expect("renderer")),
            Arc::new(committer),
        )
        .with_agents(vec![AgentKind::Claude, AgentKind::Cursor]);
        Self { workspace, provider, registry, history, service }
    }

    /// Create a checkout directory and register its repository.
    pub fn repository(&self, id: &str) -> Repository {
        let path = self.workspace.path().join(id);
        std::fs::create_dir_all(&path).expect("checkout");
        Repository {
            id: RepositoryId::from(id),
            organization_id: acme(),
            owner: "acme".to_string(),
            name: id.to_string(),
            branch: "main".to_string(),
            path,
            url: None,
        }
    }

    pub fn read(&self, repository: &str, relative: &str) -> String {
        std::fs::read_to_string(self.workspace.path().join(repository).join(Path::new(relative)))
            .unwrap_or_default()
    }
}
