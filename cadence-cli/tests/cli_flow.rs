use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;

use cadence_core::catalog::{save_item_at, ContentItem, ItemVersion};
use cadence_core::types::{ContentId, ContentKind, OrganizationId, UserId, VersionId};
use tempfile::TempDir;

fn cadence_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cadence"));
    cmd.arg("--home")
        .arg(home)
        .args(["--org", "acme"])
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "warn");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run cadence");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).expect("utf8 stdout")
}

fn save_standard(home: &Path, content: &str, versions: &[u32]) {
    let item = ContentItem {
        content_id: ContentId::from(content),
        organization_id: OrganizationId::from("acme"),
        versions: versions
            .iter()
            .map(|n| ItemVersion {
                id: VersionId::from(format!("{content}-{n}")),
                name: content.to_string(),
                slug: content.to_string(),
                version: *n,
                summary: Some(format!("{content} summary")),
                payload: format!("{content} rule, revision {n}"),
                author_id: UserId::from("ada"),
            })
            .collect(),
    };
    save_item_at(home, ContentKind::Standard, &item).expect("save catalog item");
}

/// Connect `web` at a fresh checkout and return (checkout, root target id).
fn connect_web(home: &TempDir) -> (TempDir, String) {
    let checkout = TempDir::new().expect("checkout");
    cadence_cmd(home.path())
        .args(["repo", "connect", "web", "--path"])
        .arg(checkout.path())
        .assert()
        .success()
        .stdout(contains("Connected"));

    let listed = stdout_of(cadence_cmd(home.path()).args(["target", "list", "--json"]));
    let targets: serde_json::Value = serde_json::from_str(&listed).expect("target json");
    let root = targets[0]["id"].as_str().expect("root id").to_string();
    assert_eq!(targets[0]["path"], "/");
    (checkout, root)
}

#[test]
fn publish_twice_then_nothing_to_commit() {
    let home = TempDir::new().expect("home");
    let (checkout, root) = connect_web(&home);
    save_standard(home.path(), "naming", &[1]);

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success()
        .stdout(contains("success"));

    let written = fs::read_to_string(checkout.path().join(".cadence/standards/naming.md")).expect("canonical file");
    assert!(written.contains("naming rule, revision 1"));
    assert!(checkout.path().join(".claude/rules/cadence-standards.md").exists());

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success()
        .stdout(contains("no_changes"));

    let history = stdout_of(cadence_cmd(home.path()).args(["history", "standards", "naming", "--json"]));
    let records: serde_json::Value = serde_json::from_str(&history).expect("history json");
    let statuses: Vec<&str> = records
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["status"].as_str().expect("status"))
        .collect();
    assert_eq!(statuses, vec!["no_changes", "success"], "newest first");
}

#[test]
fn overview_reports_outdated_until_republished() {
    let home = TempDir::new().expect("home");
    let (_checkout, root) = connect_web(&home);
    save_standard(home.path(), "naming", &[1]);

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success();
    save_standard(home.path(), "naming", &[1, 2]);

    let stale = stdout_of(cadence_cmd(home.path()).args(["overview", "--standards", "--json"]));
    let stale: serde_json::Value = serde_json::from_str(&stale).expect("overview json");
    assert_eq!(stale["targets"][0]["has_outdated"], true);

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-2", "--target", &root])
        .assert()
        .success();

    let fresh = stdout_of(cadence_cmd(home.path()).args(["overview", "--standards", "--json"]));
    let fresh: serde_json::Value = serde_json::from_str(&fresh).expect("overview json");
    let entry = &fresh["targets"][0]["deployments"][0];
    assert_eq!(entry["is_up_to_date"], true);
    assert_eq!(entry["deployed_version"]["version"], 2);

    cadence_cmd(home.path())
        .args(["overview", "--standards", "--by-content"])
        .assert()
        .success()
        .stdout(contains("naming v2"));
}

#[test]
fn diff_previews_without_writing() {
    let home = TempDir::new().expect("home");
    let (checkout, root) = connect_web(&home);
    save_standard(home.path(), "naming", &[1]);

    cadence_cmd(home.path())
        .args(["diff", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success()
        .stdout(contains("+naming rule, revision 1"));
    assert!(!checkout.path().join(".cadence").exists(), "diff must not write");

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success();
    cadence_cmd(home.path())
        .args(["diff", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success()
        .stdout(contains("No differences"));
}

#[test]
fn unknown_target_fails_without_history() {
    let home = TempDir::new().expect("home");
    let _web = connect_web(&home);
    save_standard(home.path(), "naming", &[1]);

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-1", "--target", "ghost"])
        .assert()
        .failure()
        .stderr(contains("target not found: ghost"));

    let history = stdout_of(cadence_cmd(home.path()).args(["history", "standards", "naming", "--json"]));
    assert_eq!(history.trim(), "[]");
}

#[test]
fn target_lifecycle_protects_root() {
    let home = TempDir::new().expect("home");
    let (_checkout, root) = connect_web(&home);

    cadence_cmd(home.path())
        .args(["target", "rename", &root, "main"])
        .assert()
        .failure()
        .stderr(contains("cannot be renamed"));

    cadence_cmd(home.path())
        .args(["target", "add", "web", "docs", "docs"])
        .assert()
        .failure()
        .stderr(contains("Invalid path format"));

    cadence_cmd(home.path())
        .args(["target", "add", "web", "docs", "/docs/"])
        .assert()
        .success()
        .stdout(contains("Added docs"));

    let listed = stdout_of(cadence_cmd(home.path()).args(["target", "list", "--json"]));
    let targets: serde_json::Value = serde_json::from_str(&listed).expect("json");
    let docs = targets
        .as_array()
        .expect("array")
        .iter()
        .find(|t| t["name"] == "docs")
        .expect("docs target")["id"]
        .as_str()
        .expect("id")
        .to_string();

    cadence_cmd(home.path()).args(["target", "remove", &docs]).assert().success();
    let listed = stdout_of(cadence_cmd(home.path()).args(["target", "list", "--json"]));
    let targets: serde_json::Value = serde_json::from_str(&listed).expect("json");
    assert_eq!(targets.as_array().expect("array").len(), 1);
}

#[test]
fn configured_agents_drive_rendered_files() {
    let home = TempDir::new().expect("home");
    let (checkout, root) = connect_web(&home);
    save_standard(home.path(), "naming", &[1]);

    cadence_cmd(home.path())
        .args(["config", "set", "--organization", "acme", "--agents", "cursor,copilot"])
        .assert()
        .success();
    cadence_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(contains("cursor"))
        .stdout(contains("copilot"));

    cadence_cmd(home.path())
        .args(["publish", "standards", "--version", "naming-1", "--target", &root])
        .assert()
        .success();
    assert!(checkout.path().join(".cursor/rules/cadence-standards.mdc").exists());
    assert!(checkout.path().join(".github/instructions/cadence-standards.instructions.md").exists());
    assert!(!checkout.path().join(".claude/rules/cadence-standards.md").exists());
}
