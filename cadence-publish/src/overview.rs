//! Deployment overview: freshness of published content across an
//! organization, computed from history at query time.
//!
//! Three views over the same data:
//! - by target: what is live at each target,
//! - by content: where each item is live,
//! - by repository: the union of a repository's targets.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_core::types::{
    ContentId, ContentKind, ContentVersion, Deployment, DeploymentId, Repository, ResolvedTarget,
    Target, TargetId,
};

use crate::active::{fold_active, ActiveVersion, FoldOrder};
use crate::merge::sort_versions;

/// One content item live at a target (or repository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedContent {
    pub deployed_version: ContentVersion,
    pub latest_version: ContentVersion,
    pub is_up_to_date: bool,
    pub deployment_id: DeploymentId,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDeploymentStatus {
    pub target: Target,
    pub repository: Repository,
    pub deployments: Vec<DeployedContent>,
    pub has_outdated: bool,
}

/// Where one item is live, and at which version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTargetDeployment {
    pub target: Target,
    pub repository: Repository,
    pub deployed_version: ContentVersion,
    pub is_up_to_date: bool,
    pub deployed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDeploymentStatus {
    pub latest_version: ContentVersion,
    /// Empty for items that were never published.
    pub deployments: Vec<ContentTargetDeployment>,
    pub has_outdated_deployments: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDeploymentStatus {
    pub repository: Repository,
    pub deployments: Vec<DeployedContent>,
    pub has_outdated: bool,
}

/// Both views of one kind, plus the repository roll-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentOverview {
    pub kind: ContentKind,
    pub targets: Vec<TargetDeploymentStatus>,
    pub contents: Vec<ContentDeploymentStatus>,
    pub repositories: Vec<RepositoryDeploymentStatus>,
}

/// Highest authored version per content id.
pub fn latest_versions(catalog: &[ContentVersion]) -> BTreeMap<ContentId, ContentVersion> {
    let mut latest: BTreeMap<ContentId, ContentVersion> = BTreeMap::new();
    for version in catalog {
        match latest.get(&version.content_id) {
            Some(kept) if kept.version >= version.version => {}
            _ => {
                latest.insert(version.content_id.clone(), version.clone());
            }
        }
    }
    latest
}

fn annotate(
    active: ActiveVersion,
    latest: &BTreeMap<ContentId, ContentVersion>,
    target: &TargetId,
) -> Option<DeployedContent> {
    let Some(latest_version) = latest.get(&active.version.content_id) else {
        tracing::warn!(
            target_id = %target,
            content = %active.version.content_id,
            "active content is unknown to the catalog; skipping"
        );
        return None;
    };
    Some(DeployedContent {
        is_up_to_date: active.version.version >= latest_version.version,
        latest_version: latest_version.clone(),
        deployed_version: active.version,
        deployment_id: active.deployment_id,
        deployed_at: active.deployed_at,
    })
}

/// Build every view from already-loaded inputs.
///
/// `targets` should hold live targets only; history of soft-deleted targets
/// is ignored. Targets without history appear with no deployments.
pub fn build_overview(
    kind: ContentKind,
    history: &[Deployment],
    targets: &[ResolvedTarget],
    repositories: &[Repository],
    catalog: &[ContentVersion],
) -> DeploymentOverview {
    let latest = latest_versions(catalog);

    let mut by_target: HashMap<&TargetId, Vec<Deployment>> = HashMap::new();
    for deployment in history.iter().filter(|d| d.kind == kind) {
        by_target.entry(&deployment.target.id).or_default().push(deployment.clone());
    }

    // By target.
    let mut target_views = Vec::with_capacity(targets.len());
    for resolved in targets {
        let records = by_target.get(&resolved.target.id).map(Vec::as_slice).unwrap_or_default();
        let deployments: Vec<DeployedContent> = fold_active(records, FoldOrder::NewestWins)
            .into_iter()
            .filter_map(|a| annotate(a, &latest, &resolved.target.id))
            .collect();
        target_views.push(TargetDeploymentStatus {
            has_outdated: deployments.iter().any(|d| !d.is_up_to_date),
            target: resolved.target.clone(),
            repository: resolved.repository.clone(),
            deployments,
        });
    }

    // By content.
    let mut latest_sorted: Vec<ContentVersion> = latest.values().cloned().collect();
    sort_versions(&mut latest_sorted);
    let contents = latest_sorted
        .into_iter()
        .map(|latest_version| {
            let deployments: Vec<ContentTargetDeployment> = target_views
                .iter()
                .filter_map(|view| {
                    view.deployments
                        .iter()
                        .find(|d| d.deployed_version.content_id == latest_version.content_id)
                        .map(|d| ContentTargetDeployment {
                            target: view.target.clone(),
                            repository: view.repository.clone(),
                            deployed_version: d.deployed_version.clone(),
                            is_up_to_date: d.is_up_to_date,
                            deployed_at: d.deployed_at,
                        })
                })
                .collect();
            ContentDeploymentStatus {
                has_outdated_deployments: deployments.iter().any(|d| !d.is_up_to_date),
                latest_version,
                deployments,
            }
        })
        .collect();

    // By repository: newest deployment wins per content id across targets.
    let mut repository_views = Vec::with_capacity(repositories.len());
    for repository in repositories {
        let mut union: BTreeMap<ContentId, DeployedContent> = BTreeMap::new();
        for view in target_views.iter().filter(|v| v.repository.id == repository.id) {
            for deployed in &view.deployments {
                let newer = union
                    .get(&deployed.deployed_version.content_id)
                    .map_or(true, |kept| {
                        (deployed.deployed_at, &deployed.deployment_id) > (kept.deployed_at, &kept.deployment_id)
                    });
                if newer {
                    union.insert(deployed.deployed_version.content_id.clone(), deployed.clone());
                }
            }
        }
        let mut deployments: Vec<DeployedContent> = union.into_values().collect();
        deployments.sort_by(|a, b| {
            a.deployed_version
                .name
                .cmp(&b.deployed_version.name)
                .then_with(|| a.deployed_version.content_id.cmp(&b.deployed_version.content_id))
        });
        repository_views.push(RepositoryDeploymentStatus {
            has_outdated: deployments.iter().any(|d| !d.is_up_to_date),
            repository: repository.clone(),
            deployments,
        });
    }

    DeploymentOverview {
        kind,
        targets: target_views,
        contents,
        repositories: repository_views,
    }
}
