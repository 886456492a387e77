//! `cadence history <kind> <content-id>`

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use cadence_core::types::{ContentId, ContentKind, Deployment};

use super::{paint_status, GlobalArgs, Workspace};

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// playbooks | standards
    pub kind: ContentKind,

    pub content: String,

    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "WHEN")]
    when: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "VERSION")]
    version: String,
    #[tabled(rename = "AUTHOR")]
    author: String,
}

impl HistoryArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::load(global)?;
        let service = workspace.service(false)?;
        let content = ContentId::from(self.content.as_str());

        let deployments = service
            .list_deployments_by_content(self.kind, &content, workspace.organization())
            .with_context(|| format!("failed to read history of '{}'", self.content))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&deployments)?);
            return Ok(());
        }

        if deployments.is_empty() {
            println!("'{}' has never been published.", self.content);
            return Ok(());
        }

        let rows: Vec<HistoryRow> = deployments.iter().map(|d| row(d, &content)).collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

fn row(deployment: &Deployment, content: &ContentId) -> HistoryRow {
    let version = deployment
        .content_versions
        .iter()
        .find(|v| &v.content_id == content)
        .map(|v| format!("v{}", v.version))
        .unwrap_or_default();
    HistoryRow {
        when: deployment.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        status: paint_status(deployment.status()),
        target: deployment.target.name.clone(),
        version,
        author: deployment.author_id.to_string(),
    }
}
