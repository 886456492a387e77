//! `cadence publish <kind> --version <id>... --target <id>...`

use anyhow::{Context, Result};
use clap::Args;

use cadence_core::types::{ContentKind, Deployment, TargetId, VersionId};
use cadence_publish::PublishError;

use super::{paint_status, GlobalArgs, Workspace};

/// Arguments for `cadence publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// playbooks | standards
    pub kind: ContentKind,

    /// Content version to publish. Repeatable; may be omitted to re-render the
    /// active set.
    #[arg(long = "version", value_name = "ID")]
    pub versions: Vec<String>,

    /// Target to publish to. Repeatable.
    #[arg(long = "target", value_name = "ID", required = true)]
    pub targets: Vec<String>,

    /// Also create a git commit in each checkout.
    #[arg(long)]
    pub git: bool,

    /// Print the deployment records as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PublishArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::load(global)?;
        let service = workspace.service(self.git)?;
        let versions: Vec<VersionId> = self.versions.iter().map(|v| VersionId::from(v.as_str())).collect();
        let targets: Vec<TargetId> = self.targets.iter().map(|t| TargetId::from(t.as_str())).collect();

        match service.publish(self.kind, workspace.organization(), workspace.author(), &versions, &targets) {
            Ok(deployments) => {
                self.report(&deployments)?;
                Ok(())
            }
            Err(PublishError::CommitFailed { target, message, deployments }) => {
                self.report(&deployments)?;
                Err(anyhow::anyhow!("commit failed for target {target}: {message}"))
            }
            Err(err) => Err(err).with_context(|| format!("failed to publish {}", self.kind.plural())),
        }
    }

    fn report(&self, deployments: &[Deployment]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(deployments)?);
            return Ok(());
        }
        for deployment in deployments {
            let detail = match (deployment.commit(), deployment.error()) {
                (Some(commit), _) => format!("commit {}", short_sha(&commit.sha)),
                (None, Some(error)) => error.to_string(),
                (None, None) => "nothing to commit".to_string(),
            };
            println!(
                "{:<10} {} ({}) {}",
                paint_status(deployment.status()),
                deployment.target.name,
                deployment.target.id,
                detail
            );
        }
        Ok(())
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..12).unwrap_or(sha)
}
