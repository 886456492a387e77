//! Registry error-message, atomic-write-safety and target lifecycle tests.
//! Storage: ~/.cadence/repositories/<repository_id>.yaml

use std::fs;
use std::path::PathBuf;

use assert_fs::prelude::*;
use cadence_core::{
    registry::{self, ROOT_TARGET_NAME},
    types::{OrganizationId, Repository, RepositoryId, TargetId},
    FileTargetRegistry, RegistryError, TargetRegistry,
};
use predicates::prelude::predicate;

fn repo(id: &str, org: &str) -> Repository {
    Repository {
        id: RepositoryId::from(id),
        organization_id: OrganizationId::from(org),
        owner: org.to_string(),
        name: id.to_string(),
        branch: "main".to_string(),
        path: PathBuf::from("/code").join(id),
        url: Some(format!("https://git.example.com/{org}/{id}")),
    }
}

fn acme() -> OrganizationId {
    OrganizationId::from("acme")
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_repository_returns_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = registry::load_repository_at(home.path(), &RepositoryId::from("web")).unwrap_err();
    assert!(matches!(err, RegistryError::RepositoryNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("web"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = registry::repositories_dir_at(home.path());
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("web.yaml"), b": : corrupt : yaml : !!!\n  - broken: [unclosed").expect("write");

    let err = registry::load_repository_at(home.path(), &RepositoryId::from("web")).unwrap_err();
    assert!(matches!(err, RegistryError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("web.yaml"), "must contain file path, got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn connect_writes_yaml_without_tmp_leftovers() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");

    home.child(".cadence/repositories/web.yaml")
        .assert(predicate::path::is_file());
    home.child(".cadence/repositories/web.yaml")
        .assert(predicate::str::contains("path: /"));
    home.child(".cadence/repositories/web.yaml.tmp")
        .assert(predicate::path::missing());
}

#[cfg(unix)]
#[test]
fn repository_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let path = registry::repository_path_at(home.path(), &RepositoryId::from("web"));
    let mode = fs::metadata(path).expect("metadata").permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}

// ---------------------------------------------------------------------------
// 3. Target lifecycle
// ---------------------------------------------------------------------------

#[test]
fn add_target_normalises_path_and_lists_sorted() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let added = registry::add_target_at(home.path(), &RepositoryId::from("web"), " Frontend ", "/apps//frontend")
        .expect("add");
    assert_eq!(added.name, "Frontend");
    assert_eq!(added.path, "/apps/frontend/");

    let targets = registry::list_targets_at(home.path(), &acme()).expect("list");
    let paths: Vec<&str> = targets.iter().map(|t| t.target.path.as_str()).collect();
    assert_eq!(paths, vec!["/", "/apps/frontend/"]);
}

#[test]
fn duplicate_live_path_is_rejected() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let web = RepositoryId::from("web");
    registry::add_target_at(home.path(), &web, "docs", "/docs/").expect("add");
    let err = registry::add_target_at(home.path(), &web, "docs again", "/docs").unwrap_err();
    assert!(matches!(err, RegistryError::DuplicatePath { .. }), "got: {err}");
}

#[test]
fn invalid_path_rejected_with_message() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let err = registry::add_target_at(home.path(), &RepositoryId::from("web"), "x", "../invalid")
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid path format");
}

#[test]
fn root_target_cannot_be_renamed_moved_or_removed() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let record = registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let root = record.targets[0].id.clone();

    for err in [
        registry::rename_target_at(home.path(), &root, "renamed").unwrap_err(),
        registry::update_target_path_at(home.path(), &root, "/elsewhere/").unwrap_err(),
        registry::remove_target_at(home.path(), &root).unwrap_err(),
    ] {
        assert!(matches!(err, RegistryError::RootTargetImmutable { .. }), "got: {err}");
    }
    let reloaded = registry::load_repository_at(home.path(), &RepositoryId::from("web")).expect("load");
    assert_eq!(reloaded.targets[0].name, ROOT_TARGET_NAME);
}

#[test]
fn rename_and_move_non_root_target() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let added = registry::add_target_at(home.path(), &RepositoryId::from("web"), "docs", "/docs/")
        .expect("add");

    let renamed = registry::rename_target_at(home.path(), &added.id, "handbook").expect("rename");
    assert_eq!(renamed.name, "handbook");
    let moved = registry::update_target_path_at(home.path(), &added.id, "/handbook").expect("move");
    assert_eq!(moved.path, "/handbook/");
    assert_eq!(moved.name, "handbook");
}

#[test]
fn removed_target_is_soft_deleted_and_unresolvable() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    let added = registry::add_target_at(home.path(), &RepositoryId::from("web"), "docs", "/docs/")
        .expect("add");
    registry::remove_target_at(home.path(), &added.id).expect("remove");

    let record = registry::load_repository_at(home.path(), &RepositoryId::from("web")).expect("load");
    assert_eq!(record.targets.len(), 2, "soft delete keeps the record");
    assert!(record.targets[1].is_deleted());

    let registry = FileTargetRegistry::new(home.path());
    assert!(registry.resolve(&added.id).expect("resolve").is_none());
    assert_eq!(registry.list_for_organization(&acme()).expect("list").len(), 1);

    let err = registry::rename_target_at(home.path(), &added.id, "again").unwrap_err();
    assert!(matches!(err, RegistryError::TargetNotFound { .. }), "got: {err}");
}

#[test]
fn unknown_target_is_not_found() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let err = registry::remove_target_at(home.path(), &TargetId::from("nope")).unwrap_err();
    assert!(matches!(err, RegistryError::TargetNotFound { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 4. Organization scoping
// ---------------------------------------------------------------------------

#[test]
fn registry_scopes_by_organization() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    registry::connect_repository_at(home.path(), repo("web", "acme")).expect("connect");
    registry::connect_repository_at(home.path(), repo("api", "acme")).expect("connect");
    registry::connect_repository_at(home.path(), repo("shop", "globex")).expect("connect");

    let registry = FileTargetRegistry::new(home.path());
    let repos = registry.repositories_for_organization(&acme()).expect("repos");
    let ids: Vec<&str> = repos.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["api", "web"]);

    let targets = registry.list_for_organization(&acme()).expect("targets");
    assert_eq!(targets.len(), 2);
    assert!(targets.iter().all(|t| t.target.is_root()));
}
