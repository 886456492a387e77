//! Publish orchestration for one content kind.
//!
//! For each target, sequentially: resolve the active set from history, merge
//! the requested versions over it, render, commit, and append a deployment
//! record whatever the outcome. The record carries the merged set, so every
//! record describes the full content of its target after that attempt.

use chrono::Utc;

use cadence_core::types::{
    ContentKind, ContentVersion, Deployment, DeploymentOutcome, OrganizationId, ResolvedTarget,
    Target, TargetId, UserId, VersionId,
};
use cadence_core::{AgentKind, ContentProvider, TargetRegistry};
use cadence_renderer::{ContentRenderer, FileUpdates};

use crate::active::{resolve_active, ActiveVersion};
use crate::committer::RepositoryCommitter;
use crate::error::{CommitError, PublishError};
use crate::history::{new_deployment_id, HistoryStore};
use crate::merge::{dedupe_latest, downgrades, merge};

/// Borrowed view over the collaborators needed to publish one kind.
pub struct Publisher<'a> {
    pub kind: ContentKind,
    pub provider: &'a dyn ContentProvider,
    pub registry: &'a dyn TargetRegistry,
    pub history: &'a dyn HistoryStore,
    pub renderer: &'a dyn ContentRenderer,
    pub committer: &'a dyn RepositoryCommitter,
    pub agents: &'a [AgentKind],
}

/// Everything computed for one target before committing.
struct Plan {
    merged: Vec<ContentVersion>,
    message: String,
}

impl<'a> Publisher<'a> {
    /// Publish `version_ids` to every target in `target_ids`.
    ///
    /// All ids are resolved before anything is rendered or recorded. A
    /// failing target does not stop later ones; once every target has been
    /// processed, the first failure is returned as
    /// [`PublishError::CommitFailed`] with all records of the call.
    pub fn publish(
        &self,
        organization: &OrganizationId,
        author: &UserId,
        version_ids: &[VersionId],
        target_ids: &[TargetId],
    ) -> Result<Vec<Deployment>, PublishError> {
        if target_ids.is_empty() {
            return Err(PublishError::NoTargets);
        }
        let requested = self.resolve_versions(version_ids)?;
        let targets = self.resolve_targets(organization, target_ids)?;

        let mut deployments = Vec::with_capacity(targets.len());
        let mut first_failure: Option<(TargetId, String)> = None;
        for resolved in &targets {
            let deployment = self.publish_to_target(organization, author, &requested, resolved)?;
            if first_failure.is_none() {
                if let Some(error) = deployment.error() {
                    first_failure = Some((deployment.target.id.clone(), error.to_string()));
                }
            }
            deployments.push(deployment);
        }

        match first_failure {
            Some((target, message)) => Err(PublishError::CommitFailed {
                target,
                message,
                deployments,
            }),
            None => Ok(deployments),
        }
    }

    /// Files a publish to `target_id` would produce, without committing or
    /// recording anything.
    pub fn render_preview(
        &self,
        organization: &OrganizationId,
        version_ids: &[VersionId],
        target_id: &TargetId,
    ) -> Result<(ResolvedTarget, FileUpdates), PublishError> {
        let requested = self.resolve_versions(version_ids)?;
        let mut targets = self.resolve_targets(organization, std::slice::from_ref(target_id))?;
        let resolved = targets.pop().ok_or_else(|| PublishError::TargetNotFound { id: target_id.clone() })?;
        let plan = self.plan(organization, &requested, &resolved.target)?;
        let files = self.renderer.render(
            self.kind,
            &plan.merged,
            &resolved.repository,
            &resolved.target,
            self.agents,
        )?;
        Ok((resolved, files))
    }

    /// Active versions at one target.
    pub fn active_versions(
        &self,
        organization: &OrganizationId,
        target: &TargetId,
    ) -> Result<Vec<ActiveVersion>, PublishError> {
        Ok(resolve_active(self.history, organization, self.kind, target)?)
    }

    // -----------------------------------------------------------------------
    // Preconditions
    // -----------------------------------------------------------------------

    /// Resolve, de-duplicate per content id (highest version wins) and sort
    /// by name.
    fn resolve_versions(&self, ids: &[VersionId]) -> Result<Vec<ContentVersion>, PublishError> {
        let mut versions = Vec::with_capacity(ids.len());
        for id in ids {
            let version = self
                .provider
                .get_version_by_id(self.kind, id)
                .map_err(PublishError::Provider)?
                .ok_or_else(|| PublishError::ContentVersionNotFound {
                    kind: self.kind,
                    id: id.clone(),
                })?;
            versions.push(version);
        }
        Ok(dedupe_latest(&versions))
    }

    /// Resolve live targets of `organization`, in the order given, ignoring
    /// repeated ids.
    fn resolve_targets(
        &self,
        organization: &OrganizationId,
        ids: &[TargetId],
    ) -> Result<Vec<ResolvedTarget>, PublishError> {
        let mut resolved: Vec<ResolvedTarget> = Vec::with_capacity(ids.len());
        for id in ids {
            if resolved.iter().any(|r| &r.target.id == id) {
                continue;
            }
            let target = self
                .registry
                .resolve(id)?
                .filter(|r| &r.repository.organization_id == organization)
                .ok_or_else(|| PublishError::TargetNotFound { id: id.clone() })?;
            resolved.push(target);
        }
        Ok(resolved)
    }

    // -----------------------------------------------------------------------
    // Per-target steps
    // -----------------------------------------------------------------------

    fn plan(
        &self,
        organization: &OrganizationId,
        requested: &[ContentVersion],
        target: &Target,
    ) -> Result<Plan, PublishError> {
        let active: Vec<ContentVersion> = resolve_active(self.history, organization, self.kind, &target.id)?
            .into_iter()
            .map(|a| a.version)
            .collect();

        for (replaced, replacement) in downgrades(&active, requested) {
            tracing::warn!(
                target_id = %target.id,
                content = %replacement.content_id,
                from = replaced.version,
                to = replacement.version,
                "publishing an older {} version over a newer one",
                self.kind
            );
        }

        let merged = merge(&active, requested);
        let message = commit_message(self.kind, requested, merged.len(), target);
        Ok(Plan { merged, message })
    }

    fn publish_to_target(
        &self,
        organization: &OrganizationId,
        author: &UserId,
        requested: &[ContentVersion],
        resolved: &ResolvedTarget,
    ) -> Result<Deployment, PublishError> {
        let target = &resolved.target;
        let Plan { merged, message } = self.plan(organization, requested, target)?;

        let outcome = match self.renderer.render(
            self.kind,
            &merged,
            &resolved.repository,
            target,
            self.agents,
        ) {
            Err(e) => DeploymentOutcome::Failure { error: format!("render failed: {e}") },
            Ok(files) => match self.committer.commit(&resolved.repository, &files, &message) {
                Ok(commit) => DeploymentOutcome::Success { commit },
                Err(CommitError::NoChanges) => DeploymentOutcome::NoChanges,
                Err(CommitError::Failed(error)) => DeploymentOutcome::Failure { error },
            },
        };

        let deployment = Deployment {
            id: new_deployment_id(),
            organization_id: organization.clone(),
            author_id: author.clone(),
            kind: self.kind,
            target: target.clone(),
            created_at: Utc::now(),
            content_versions: merged,
            outcome,
            agents: self.agents.to_vec(),
        };
        self.history.append(&deployment)?;

        match &deployment.outcome {
            DeploymentOutcome::Failure { error } => tracing::warn!(
                target_id = %target.id,
                deployment = %deployment.id,
                %error,
                "{} publish failed",
                self.kind
            ),
            outcome => tracing::info!(
                target_id = %target.id,
                deployment = %deployment.id,
                status = %outcome.status(),
                items = deployment.content_versions.len(),
                "{} publish recorded",
                self.kind
            ),
        }
        Ok(deployment)
    }
}

/// Commit message listing the requested items only.
pub fn commit_message(
    kind: ContentKind,
    requested: &[ContentVersion],
    merged_count: usize,
    target: &Target,
) -> String {
    let mut message = format!(
        "[CADENCE] Update {plural} files\n\n\
         - Updated {count} {kind}(s)\n\
         - Total {plural} in target: {merged_count}\n\
         - Target: {name} ({path})\n\n\
         {title} updated:\n",
        plural = kind.plural(),
        count = requested.len(),
        name = target.name,
        path = target.path,
        title = kind.title(),
    );
    for version in requested {
        message.push_str(&format!("- {} ({}) v{}\n", version.name, version.slug, version.version));
    }
    message
}
