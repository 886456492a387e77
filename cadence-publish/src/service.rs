//! [`DeploymentService`]: the public operations over one shared set of
//! collaborators.

use std::sync::Arc;

use cadence_core::types::{
    ContentId, ContentKind, Deployment, OrganizationId, TargetId, UserId, VersionId,
};
use cadence_core::{AgentKind, ContentProvider, TargetRegistry};
use cadence_renderer::ContentRenderer;

use crate::active::ActiveVersion;
use crate::committer::RepositoryCommitter;
use crate::diff::{preview, FileDiff};
use crate::error::{OverviewError, PublishError};
use crate::history::HistoryStore;
use crate::overview::{build_overview, DeploymentOverview};
use crate::publisher::Publisher;

pub struct DeploymentService {
    provider: Arc<dyn ContentProvider>,
    registry: Arc<dyn TargetRegistry>,
    history: Arc<dyn HistoryStore>,
    renderer: Arc<dyn ContentRenderer>,
    committer: Arc<dyn RepositoryCommitter>,
    agents: Vec<AgentKind>,
}

impl DeploymentService {
    /// Renders for Claude only until [`DeploymentService::with_agents`] says
    /// otherwise.
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        registry: Arc<dyn TargetRegistry>,
        history: Arc<dyn HistoryStore>,
        renderer: Arc<dyn ContentRenderer>,
        committer: Arc<dyn RepositoryCommitter>,
    ) -> Self {
        Self {
            provider,
            registry,
            history,
            renderer,
            committer,
            agents: vec![AgentKind::Claude],
        }
    }

    pub fn with_agents(mut self, agents: Vec<AgentKind>) -> Self {
        self.agents = agents;
        self
    }

    pub fn agents(&self) -> &[AgentKind] {
        &self.agents
    }

    fn publisher(&self, kind: ContentKind) -> Publisher<'_> {
        Publisher {
            kind,
            provider: self.provider.as_ref(),
            registry: self.registry.as_ref(),
            history: self.history.as_ref(),
            renderer: self.renderer.as_ref(),
            committer: self.committer.as_ref(),
            agents: &self.agents,
        }
    }

    // -----------------------------------------------------------------------
    // Publishing
    // -----------------------------------------------------------------------

    pub fn publish(
        &self,
        kind: ContentKind,
        organization: &OrganizationId,
        author: &UserId,
        version_ids: &[VersionId],
        target_ids: &[TargetId],
    ) -> Result<Vec<Deployment>, PublishError> {
        self.publisher(kind).publish(organization, author, version_ids, target_ids)
    }

    pub fn publish_playbooks(
        &self,
        organization: &OrganizationId,
        author: &UserId,
        version_ids: &[VersionId],
        target_ids: &[TargetId],
    ) -> Result<Vec<Deployment>, PublishError> {
        self.publish(ContentKind::Playbook, organization, author, version_ids, target_ids)
    }

    pub fn publish_standards(
        &self,
        organization: &OrganizationId,
        author: &UserId,
        version_ids: &[VersionId],
        target_ids: &[TargetId],
    ) -> Result<Vec<Deployment>, PublishError> {
        self.publish(ContentKind::Standard, organization, author, version_ids, target_ids)
    }

    /// Unified diffs of what publishing would change at one target.
    pub fn preview(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
        version_ids: &[VersionId],
        target_id: &TargetId,
    ) -> Result<Vec<FileDiff>, PublishError> {
        let (resolved, files) = self.publisher(kind).render_preview(organization, version_ids, target_id)?;
        preview(&resolved.repository, &files)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn active_versions(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
        target: &TargetId,
    ) -> Result<Vec<ActiveVersion>, PublishError> {
        self.publisher(kind).active_versions(organization, target)
    }

    /// Every deployment of `kind` that included `content`, newest first.
    pub fn list_deployments_by_content(
        &self,
        kind: ContentKind,
        content: &ContentId,
        organization: &OrganizationId,
    ) -> Result<Vec<Deployment>, PublishError> {
        Ok(self.history.list_by_content(organization, kind, content)?)
    }

    pub fn overview(
        &self,
        organization: &OrganizationId,
        kind: ContentKind,
    ) -> Result<DeploymentOverview, OverviewError> {
        let history = self.history.list_by_organization(organization, kind)?;
        let targets = self.registry.list_for_organization(organization)?;
        let repositories = self.registry.repositories_for_organization(organization)?;
        let catalog = self
            .provider
            .list_all_for_organization(kind, organization)
            .map_err(OverviewError::Provider)?;
        Ok(build_overview(kind, &history, &targets, &repositories, &catalog))
    }

    /// Playbook overview.
    pub fn deployment_overview(&self, organization: &OrganizationId) -> Result<DeploymentOverview, OverviewError> {
        self.overview(organization, ContentKind::Playbook)
    }

    pub fn standard_deployment_overview(
        &self,
        organization: &OrganizationId,
    ) -> Result<DeploymentOverview, OverviewError> {
        self.overview(organization, ContentKind::Standard)
    }
}
