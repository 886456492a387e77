//! Active-version resolution: fold a target's deployment history into the set
//! of content currently live there.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cadence_core::types::{ContentId, ContentKind, ContentVersion, Deployment, DeploymentId, OrganizationId, TargetId};

use crate::error::HistoryError;
use crate::history::{sort_chronologically, HistoryStore};

/// Which record wins when several deployments carry the same content id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldOrder {
    /// The most recent contributing record wins.
    #[default]
    NewestWins,
    /// The first contributing record wins; later ones only add new ids.
    OldestWins,
}

/// A version live at a target, with the deployment that made it live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveVersion {
    pub version: ContentVersion,
    pub deployment_id: DeploymentId,
    pub deployed_at: DateTime<Utc>,
}

/// Fold `records` (any order, any status) into one active version per
/// content id, sorted by name then content id.
///
/// Failed deployments produced no commit and are skipped, even when their
/// files were already written to the checkout.
pub fn fold_active(records: &[Deployment], order: FoldOrder) -> Vec<ActiveVersion> {
    let mut ordered: Vec<Deployment> = records
        .iter()
        .filter(|d| d.status().contributes_to_active_set())
        .cloned()
        .collect();
    sort_chronologically(&mut ordered);

    let mut active: BTreeMap<ContentId, ActiveVersion> = BTreeMap::new();
    for deployment in ordered {
        for version in deployment.content_versions {
            if order == FoldOrder::OldestWins && active.contains_key(&version.content_id) {
                continue;
            }
            active.insert(
                version.content_id.clone(),
                ActiveVersion {
                    version,
                    deployment_id: deployment.id.clone(),
                    deployed_at: deployment.created_at,
                },
            );
        }
    }

    let mut result: Vec<ActiveVersion> = active.into_values().collect();
    result.sort_by(|a, b| {
        a.version
            .name
            .cmp(&b.version.name)
            .then_with(|| a.version.content_id.cmp(&b.version.content_id))
    });
    result
}

/// Active versions of `kind` at `target`, newest contributing record wins.
pub fn resolve_active(
    history: &dyn HistoryStore,
    organization: &OrganizationId,
    kind: ContentKind,
    target: &TargetId,
) -> Result<Vec<ActiveVersion>, HistoryError> {
    let records = history.list_by_target(organization, kind, target)?;
    Ok(fold_active(&records, FoldOrder::NewestWins))
}
