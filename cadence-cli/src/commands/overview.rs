//! `cadence overview [--standards] [--by-content] [--by-repository] [--json]`
//!
//! Freshness of every target against the latest content versions. The JSON
//! form carries all three views regardless of the view flags.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use cadence_core::types::ContentKind;
use cadence_publish::overview::{DeployedContent, DeploymentOverview};

use super::{GlobalArgs, Workspace};

/// Arguments for `cadence overview`.
#[derive(Args, Debug)]
pub struct OverviewArgs {
    /// Show standards instead of playbooks.
    #[arg(long)]
    pub standards: bool,

    /// Group by content item instead of by target.
    #[arg(long, conflicts_with = "by_repository")]
    pub by_content: bool,

    /// Group by repository instead of by target.
    #[arg(long)]
    pub by_repository: bool,

    /// Emit JSON instead of tables.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct DeployedRow {
    #[tabled(rename = "")]
    signal: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DEPLOYED")]
    deployed: String,
    #[tabled(rename = "LATEST")]
    latest: String,
    #[tabled(rename = "WHEN")]
    when: String,
}

#[derive(Tabled)]
struct ContentRow {
    #[tabled(rename = "")]
    signal: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
    #[tabled(rename = "DEPLOYED")]
    deployed: String,
    #[tabled(rename = "WHEN")]
    when: String,
}

impl OverviewArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::load(global)?;
        let service = workspace.service(false)?;
        let kind = if self.standards { ContentKind::Standard } else { ContentKind::Playbook };

        let overview = service
            .overview(workspace.organization(), kind)
            .with_context(|| format!("failed to build the {} overview", kind))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&overview)?);
            return Ok(());
        }

        if self.by_content {
            print_by_content(&overview);
        } else if self.by_repository {
            print_by_repository(&overview);
        } else {
            print_by_target(&overview);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

fn print_by_target(overview: &DeploymentOverview) {
    if overview.targets.is_empty() {
        println!("No targets. Run: cadence repo connect <id> --path <dir>");
        return;
    }
    for status in &overview.targets {
        println!(
            "{} {} {} {}",
            signal(!status.has_outdated),
            status.target.name.bold(),
            status.target.path,
            format!("({})", status.repository.display_name()).dimmed()
        );
        print_deployed(&status.deployments, overview.kind);
    }
}

fn print_by_repository(overview: &DeploymentOverview) {
    if overview.repositories.is_empty() {
        println!("No repositories. Run: cadence repo connect <id> --path <dir>");
        return;
    }
    for status in &overview.repositories {
        println!(
            "{} {}",
            signal(!status.has_outdated),
            status.repository.display_name().bold()
        );
        print_deployed(&status.deployments, overview.kind);
    }
}

fn print_deployed(deployments: &[DeployedContent], kind: ContentKind) {
    if deployments.is_empty() {
        println!("  No {} deployed.", kind.plural());
        return;
    }
    let rows: Vec<DeployedRow> = deployments
        .iter()
        .map(|d| DeployedRow {
            signal: signal(d.is_up_to_date),
            name: d.deployed_version.name.clone(),
            deployed: format!("v{}", d.deployed_version.version),
            latest: format!("v{}", d.latest_version.version),
            when: d.deployed_at.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn print_by_content(overview: &DeploymentOverview) {
    if overview.contents.is_empty() {
        println!("No {} in the catalog.", overview.kind.plural());
        return;
    }
    for status in &overview.contents {
        println!(
            "{} {} v{}",
            signal(!status.has_outdated_deployments),
            status.latest_version.name.bold(),
            status.latest_version.version
        );
        if status.deployments.is_empty() {
            println!("  Never deployed.");
            continue;
        }
        let rows: Vec<ContentRow> = status
            .deployments
            .iter()
            .map(|d| ContentRow {
                signal: signal(d.is_up_to_date),
                target: d.target.name.clone(),
                repository: d.repository.display_name(),
                deployed: format!("v{}", d.deployed_version.version),
                when: d.deployed_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
    }
}

fn signal(up_to_date: bool) -> String {
    if up_to_date {
        "■".green().bold().to_string()
    } else {
        "■".yellow().bold().to_string()
    }
}
