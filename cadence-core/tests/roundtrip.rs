//! Serialisation tests for `cadence-core` types.
//!
//! Deployments are stored as JSON, registry and catalog files as YAML.

use chrono::{TimeZone, Utc};
use cadence_core::types::{
    CommitRef, ContentId, ContentKind, ContentVersion, Deployment, DeploymentId,
    DeploymentOutcome, DistributionStatus, OrganizationId, RepositoryId, Target, TargetId,
    UserId, VersionId,
};
use cadence_core::AgentKind;
use rstest::rstest;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn version(content: &str, n: u32) -> ContentVersion {
    ContentVersion {
        id: VersionId::from(format!("{content}-v{n}")),
        content_id: ContentId::from(content),
        name: format!("Item {content}"),
        slug: content.to_string(),
        version: n,
        summary: Some("One line".to_string()),
        payload: "# Heading\n\nBody\n".to_string(),
        author_id: UserId::from("ada"),
    }
}

fn deployment(outcome: DeploymentOutcome) -> Deployment {
    Deployment {
        id: DeploymentId::from("0190a3c4-0000-7000-8000-000000000001"),
        organization_id: OrganizationId::from("acme"),
        author_id: UserId::from("ada"),
        kind: ContentKind::Standard,
        target: Target {
            id: TargetId::from("t-1"),
            name: "default".to_string(),
            path: "/".to_string(),
            repository_id: RepositoryId::from("web"),
            deleted_at: None,
        },
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        content_versions: vec![version("naming", 2)],
        outcome,
        agents: vec![AgentKind::Claude, AgentKind::Cursor],
    }
}

fn success() -> DeploymentOutcome {
    DeploymentOutcome::Success {
        commit: CommitRef {
            sha: "a".repeat(40),
            message: "[CADENCE] Update standards files".to_string(),
            author: "ada".to_string(),
            url: None,
        },
    }
}

// ---------------------------------------------------------------------------
// JSON (deployment history)
// ---------------------------------------------------------------------------

#[rstest]
#[case::success(success(), DistributionStatus::Success)]
#[case::no_changes(DeploymentOutcome::NoChanges, DistributionStatus::NoChanges)]
#[case::failure(DeploymentOutcome::Failure { error: "push rejected".into() }, DistributionStatus::Failure)]
fn deployment_json_preserves_outcome(#[case] outcome: DeploymentOutcome, #[case] status: DistributionStatus) {
    let original = deployment(outcome);
    let json = serde_json::to_string(&original).expect("serialize");
    let parsed: Deployment = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(parsed, original);
    assert_eq!(parsed.status(), status);
}

#[test]
fn status_is_a_flat_field() {
    let value = serde_json::to_value(deployment(success())).expect("serialize");
    assert_eq!(value["status"], "success");
    assert_eq!(value["commit"]["sha"], "a".repeat(40));
    assert!(value.get("error").is_none());
    assert_eq!(value["kind"], "standard");
    assert_eq!(value["agents"], serde_json::json!(["claude", "cursor"]));
}

#[test]
fn commit_and_error_accessors_follow_status() {
    let ok = deployment(success());
    assert!(ok.commit().is_some());
    assert!(ok.error().is_none());

    let failed = deployment(DeploymentOutcome::Failure { error: "boom".into() });
    assert!(failed.commit().is_none());
    assert_eq!(failed.error(), Some("boom"));

    let noop = deployment(DeploymentOutcome::NoChanges);
    assert!(noop.commit().is_none());
    assert!(noop.error().is_none());
}

#[test]
fn records_without_agents_still_parse() {
    let mut value = serde_json::to_value(deployment(DeploymentOutcome::NoChanges)).expect("serialize");
    value.as_object_mut().expect("object").remove("agents");
    let parsed: Deployment = serde_json::from_value(value).expect("deserialize");
    assert!(parsed.agents.is_empty());
}

#[test]
fn includes_content_checks_content_id() {
    let d = deployment(DeploymentOutcome::NoChanges);
    assert!(d.includes_content(&ContentId::from("naming")));
    assert!(!d.includes_content(&ContentId::from("other")));
}

// ---------------------------------------------------------------------------
// YAML (catalog)
// ---------------------------------------------------------------------------

#[rstest]
#[case::with_summary(Some("One line".to_string()))]
#[case::without_summary(None)]
fn content_version_yaml_roundtrip(#[case] summary: Option<String>) {
    let original = ContentVersion { summary, ..version("deploy", 3) };
    let yaml = serde_yaml::to_string(&original).expect("serialize");
    let parsed: ContentVersion = serde_yaml::from_str(&yaml).expect("deserialize");
    assert_eq!(parsed, original);
}
