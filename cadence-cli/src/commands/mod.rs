//! Subcommand implementations and the workspace they share.

pub mod config;
pub mod diff;
pub mod history;
pub mod overview;
pub mod publish;
pub mod repo;
pub mod target;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use cadence_core::config::{self as core_config, Config};
use cadence_core::registry::{cadence_dir_at, default_home};
use cadence_core::types::{DistributionStatus, OrganizationId, UserId};
use cadence_core::{FileContentCatalog, FileTargetRegistry};
use cadence_publish::{
    DeploymentService, DirectoryCommitter, FileHistoryStore, GitCommitter, RepositoryCommitter,
};
use cadence_renderer::TeraRenderer;

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Directory holding `.cadence/` (defaults to the user's home).
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Organization to act for, overriding `organization_id` in config.yaml.
    #[arg(long = "org", global = true, value_name = "ID")]
    pub organization: Option<String>,

    /// Author recorded on deployments, overriding `author_id` in config.yaml.
    #[arg(long, global = true, value_name = "ID")]
    pub author: Option<String>,
}

/// Resolved home directory plus its configuration, with CLI overrides applied.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub home: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let home = match &global.home {
            Some(home) => home.clone(),
            None => default_home().context("could not determine home directory")?,
        };
        let mut config = core_config::load_at(&home)
            .with_context(|| format!("failed to load {}", core_config::config_path_at(&home).display()))?;
        if let Some(org) = &global.organization {
            config.organization_id = OrganizationId::from(org.as_str());
        }
        if let Some(author) = &global.author {
            config.author_id = UserId::from(author.as_str());
        }
        tracing::debug!(home = %home.display(), organization = %config.organization_id, "loaded workspace");
        Ok(Workspace { home, config })
    }

    pub fn organization(&self) -> &OrganizationId {
        &self.config.organization_id
    }

    pub fn author(&self) -> &UserId {
        &self.config.author_id
    }

    /// File-backed service over this workspace. `git` selects the committer
    /// that also records a git commit in each checkout.
    pub fn service(&self, git: bool) -> Result<DeploymentService> {
        let templates = cadence_dir_at(&self.home).join("templates");
        let renderer = TeraRenderer::with_template_dir(&templates)
            .with_context(|| format!("failed to load templates from {}", templates.display()))?;
        let committer: Arc<dyn RepositoryCommitter> = if git {
            Arc::new(GitCommitter::new(self.author().as_str()))
        } else {
            Arc::new(DirectoryCommitter::new(self.author().as_str()))
        };
        Ok(DeploymentService::new(
            Arc::new(FileContentCatalog::new(&self.home)),
            Arc::new(FileTargetRegistry::new(&self.home)),
            Arc::new(FileHistoryStore::new(&self.home)),
            Arc::new(renderer),
            committer,
        )
        .with_agents(self.config.agents.clone()))
    }
}

/// Coloured status label.
pub fn paint_status(status: DistributionStatus) -> String {
    match status {
        DistributionStatus::Success => status.to_string().green().bold().to_string(),
        DistributionStatus::NoChanges => status.to_string().dimmed().to_string(),
        DistributionStatus::Failure => status.to_string().red().bold().to_string(),
    }
}
