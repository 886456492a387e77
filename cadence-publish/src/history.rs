//! Append-only deployment history.
//!
//! [`FileHistoryStore`] persists one JSON document per record at
//! `<home>/.cadence/deployments/<kind plural>/<deployment_id>.json`, using the
//! same atomic `.tmp` + rename pattern as the registry. Concurrent appends
//! never touch the same file.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use cadence_core::registry::cadence_dir_at;
use cadence_core::types::{
    ContentId, ContentKind, Deployment, DeploymentId, OrganizationId, TargetId,
};

use crate::error::{history_io, HistoryError};

/// Durable log of publish attempts.
///
/// Listings are ordered oldest first by `(created_at, id)`, except
/// [`HistoryStore::list_by_content`], which is newest first.
pub trait HistoryStore: Send + Sync {
    /// Persist a new record. Existing records are never replaced.
    fn append(&self, deployment: &Deployment) -> Result<(), HistoryError>;

    fn list_by_organization(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
    ) -> Result<Vec<Deployment>, HistoryError>;

    fn list_by_target(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
        target: &TargetId,
    ) -> Result<Vec<Deployment>, HistoryError> {
        Ok(self
            .list_by_organization(organization, kind)?
            .into_iter()
            .filter(|d| &d.target.id == target)
            .collect())
    }

    fn list_by_content(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
        content: &ContentId,
    ) -> Result<Vec<Deployment>, HistoryError> {
        let mut records: Vec<Deployment> = self
            .list_by_organization(organization, kind)?
            .into_iter()
            .filter(|d| d.includes_content(content))
            .collect();
        records.reverse();
        Ok(records)
    }
}

/// Time-ordered id for a new record.
pub fn new_deployment_id() -> DeploymentId {
    DeploymentId::from(uuid::Uuid::now_v7().to_string())
}

/// Sort oldest first by `(created_at, id)`.
pub fn sort_chronologically(records: &mut [Deployment]) {
    records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

// ---------------------------------------------------------------------------
// FileHistoryStore
// ---------------------------------------------------------------------------

/// `<home>/.cadence/deployments/<kind plural>/`
pub fn deployments_dir_at(home: &Path, kind: ContentKind) -> PathBuf {
    cadence_dir_at(home).join("deployments").join(kind.plural())
}

/// `<home>/.cadence/deployments/<kind plural>/<id>.json`
pub fn record_path_at(home: &Path, kind: ContentKind, id: &DeploymentId) -> PathBuf {
    deployments_dir_at(home, kind).join(format!("{}.json", id.0))
}

/// [`HistoryStore`] over JSON files under `home`.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    home: PathBuf,
}

impl FileHistoryStore {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn load_kind(&self, kind: ContentKind) -> Result<Vec<Deployment>, HistoryError> {
        let dir = deployments_dir_at(&self.home, kind);
        if !dir.exists() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(&dir).map_err(|e| history_io(&dir, e))?;
        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| history_io(&dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path).map_err(|e| history_io(&path, e))?;
            let record: Deployment = serde_json::from_str(&contents)
                .map_err(|e| HistoryError::Parse { path: path.clone(), source: e })?;
            records.push(record);
        }
        Ok(records)
    }
}

impl HistoryStore for FileHistoryStore {
    fn append(&self, deployment: &Deployment) -> Result<(), HistoryError> {
        let dir = deployments_dir_at(&self.home, deployment.kind);
        std::fs::create_dir_all(&dir).map_err(|e| history_io(&dir, e))?;

        let path = record_path_at(&self.home, deployment.kind, &deployment.id);
        if path.exists() {
            return Err(HistoryError::AlreadyExists { id: deployment.id.clone() });
        }
        let json = serde_json::to_string_pretty(deployment)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| history_io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(history_io(&path, e));
        }
        tracing::debug!(deployment = %deployment.id, "recorded deployment");
        Ok(())
    }

    fn list_by_organization(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
    ) -> Result<Vec<Deployment>, HistoryError> {
        let mut records: Vec<Deployment> = self
            .load_kind(kind)?
            .into_iter()
            .filter(|d| &d.organization_id == organization)
            .collect();
        sort_chronologically(&mut records);
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// MemoryHistoryStore
// ---------------------------------------------------------------------------

/// In-process [`HistoryStore`], for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: RwLock<Vec<Deployment>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records of every kind.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&self, deployment: &Deployment) -> Result<(), HistoryError> {
        let mut records = self.records.write().map_err(|_| HistoryError::Poisoned)?;
        if records.iter().any(|d| d.id == deployment.id) {
            return Err(HistoryError::AlreadyExists { id: deployment.id.clone() });
        }
        records.push(deployment.clone());
        Ok(())
    }

    fn list_by_organization(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
    ) -> Result<Vec<Deployment>, HistoryError> {
        let records = self.records.read().map_err(|_| HistoryError::Poisoned)?;
        let mut matching: Vec<Deployment> = records
            .iter()
            .filter(|d| &d.organization_id == organization && d.kind == kind)
            .cloned()
            .collect();
        sort_chronologically(&mut matching);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::types::{
        ContentVersion, DeploymentOutcome, RepositoryId, Target, UserId, VersionId,
    };
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn record(id: &str, org: &str, kind: ContentKind, target: &str, minute: i64, content: &[&str]) -> Deployment {
        Deployment {
            id: DeploymentId::from(id),
            organization_id: OrganizationId::from(org),
            author_id: UserId::from("ada"),
            kind,
            target: Target {
                id: TargetId::from(target),
                name: target.to_string(),
                path: "/".to_string(),
                repository_id: RepositoryId::from("web"),
                deleted_at: None,
            },
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            content_versions: content
                .iter()
                .map(|c| ContentVersion {
                    id: VersionId::from(format!("{c}-v1")),
                    content_id: ContentId::from(*c),
                    name: c.to_string(),
                    slug: c.to_string(),
                    version: 1,
                    summary: None,
                    payload: String::new(),
                    author_id: UserId::from("ada"),
                })
                .collect(),
            outcome: DeploymentOutcome::NoChanges,
            agents: vec![],
        }
    }

    fn ids(records: &[Deployment]) -> Vec<&str> {
        records.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn new_ids_are_time_ordered() {
        let a = new_deployment_id();
        let b = new_deployment_id();
        assert!(a < b);
    }

    #[test]
    fn file_store_roundtrip_and_ordering() {
        let home = TempDir::new().unwrap();
        let store = FileHistoryStore::new(home.path());
        let acme = OrganizationId::from("acme");

        store.append(&record("b", "acme", ContentKind::Playbook, "t1", 5, &["x"])).unwrap();
        store.append(&record("a", "acme", ContentKind::Playbook, "t2", 1, &["y"])).unwrap();
        store.append(&record("c", "globex", ContentKind::Playbook, "t1", 2, &["x"])).unwrap();
        store.append(&record("d", "acme", ContentKind::Standard, "t1", 3, &["x"])).unwrap();

        let all = store.list_by_organization(&acme, ContentKind::Playbook).unwrap();
        assert_eq!(ids(&all), vec!["a", "b"]);
        let t1 = store.list_by_target(&acme, ContentKind::Playbook, &TargetId::from("t1")).unwrap();
        assert_eq!(ids(&t1), vec!["b"]);
        assert_eq!(t1[0], record("b", "acme", ContentKind::Playbook, "t1", 5, &["x"]));
    }

    #[test]
    fn file_store_refuses_overwrite() {
        let home = TempDir::new().unwrap();
        let store = FileHistoryStore::new(home.path());
        let first = record("dup", "acme", ContentKind::Standard, "t1", 0, &[]);
        store.append(&first).unwrap();
        let err = store.append(&first).unwrap_err();
        assert!(matches!(err, HistoryError::AlreadyExists { .. }), "got: {err}");
        assert!(!record_path_at(home.path(), ContentKind::Standard, &first.id)
            .with_extension("json.tmp")
            .exists());
    }

    #[test]
    fn file_store_reports_corrupt_record_path() {
        let home = TempDir::new().unwrap();
        let dir = deployments_dir_at(home.path(), ContentKind::Playbook);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("bad.json"), "{ not json").unwrap();
        let err = FileHistoryStore::new(home.path())
            .list_by_organization(&OrganizationId::from("acme"), ContentKind::Playbook)
            .unwrap_err();
        assert!(err.to_string().contains("bad.json"), "got: {err}");
    }

    #[test]
    fn ties_on_created_at_break_by_id() {
        let store = MemoryHistoryStore::new();
        store.append(&record("z", "acme", ContentKind::Playbook, "t1", 0, &[])).unwrap();
        store.append(&record("m", "acme", ContentKind::Playbook, "t1", 0, &[])).unwrap();
        let all = store.list_by_organization(&OrganizationId::from("acme"), ContentKind::Playbook).unwrap();
        assert_eq!(ids(&all), vec!["m", "z"]);
    }

    #[test]
    fn list_by_content_is_newest_first() {
        let store = MemoryHistoryStore::new();
        store.append(&record("1", "acme", ContentKind::Playbook, "t1", 0, &["x"])).unwrap();
        store.append(&record("2", "acme", ContentKind::Playbook, "t2", 1, &["y"])).unwrap();
        store.append(&record("3", "acme", ContentKind::Playbook, "t2", 2, &["x", "y"])).unwrap();
        let x = store
            .list_by_content(&OrganizationId::from("acme"), ContentKind::Playbook, &ContentId::from("x"))
            .unwrap();
        assert_eq!(ids(&x), vec!["3", "1"]);
        assert_eq!(store.len(), 3);
    }

    // -----------------------------------------------------------------------
    // Concurrent appends
    // -----------------------------------------------------------------------

    const WRITERS: usize = 8;
    const PER_WRITER: usize = 10;

    /// Writers append distinct records while a reader keeps listing; every
    /// listing must parse and none may shrink.
    fn append_concurrently(store: &dyn HistoryStore) {
        let acme = OrganizationId::from("acme");
        std::thread::scope(|scope| {
            for writer in 0..WRITERS {
                scope.spawn(move || {
                    for n in 0..PER_WRITER {
                        let id = format!("w{writer}-{n}");
                        let minute = (writer * PER_WRITER + n) as i64;
                        store
                            .append(&record(&id, "acme", ContentKind::Playbook, "t1", minute, &["x"]))
                            .unwrap();
                    }
                });
            }
            scope.spawn(|| {
                let mut seen = 0;
                for _ in 0..50 {
                    let listed = store.list_by_organization(&acme, ContentKind::Playbook).unwrap();
                    assert!(listed.len() >= seen, "history shrank from {seen} to {}", listed.len());
                    seen = listed.len();
                }
            });
        });

        let all = store.list_by_organization(&acme, ContentKind::Playbook).unwrap();
        assert_eq!(all.len(), WRITERS * PER_WRITER);
        let mut unique: Vec<&str> = ids(&all);
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), WRITERS * PER_WRITER);
    }

    #[test]
    fn file_store_accepts_concurrent_appends() {
        let home = TempDir::new().unwrap();
        append_concurrently(&FileHistoryStore::new(home.path()));
        let leftovers: Vec<_> = std::fs::read_dir(deployments_dir_at(home.path(), ContentKind::Playbook))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temporary files left behind");
    }

    #[test]
    fn memory_store_accepts_concurrent_appends() {
        append_concurrently(&MemoryHistoryStore::new());
    }
}
