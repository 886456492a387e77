//! `cadence repo connect <id> --path <dir>` and `cadence repo list`

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use cadence_core::{
    registry,
    types::{Repository, RepositoryId},
};

use super::{GlobalArgs, Workspace};

/// Connect and list repositories.
#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Connect a local checkout and create its root target.
    Connect(ConnectArgs),

    /// List connected repositories of the current organization.
    List,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Repository id (e.g. "web").
    pub id: String,

    /// Local checkout the committers write into.
    #[arg(long)]
    pub path: PathBuf,

    /// Repository owner. Defaults to the organization id.
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name. Defaults to the id.
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Web URL, used to build commit links.
    #[arg(long)]
    pub url: Option<String>,
}

pub fn run(global: &GlobalArgs, cmd: RepoCommand) -> Result<()> {
    let workspace = Workspace::load(global)?;
    match cmd {
        RepoCommand::Connect(args) => connect(&workspace, args),
        RepoCommand::List => list(&workspace),
    }
}

fn connect(workspace: &Workspace, args: ConnectArgs) -> Result<()> {
    if !args.path.is_dir() {
        bail!("checkout directory '{}' does not exist", args.path.display());
    }
    let path = args
        .path
        .canonicalize()
        .with_context(|| format!("failed to resolve '{}'", args.path.display()))?;

    let repository = Repository {
        id: RepositoryId::from(args.id.as_str()),
        organization_id: workspace.organization().clone(),
        owner: args.owner.unwrap_or_else(|| workspace.organization().to_string()),
        name: args.name.unwrap_or_else(|| args.id.clone()),
        branch: args.branch,
        path,
        url: args.url,
    };
    let record = registry::connect_repository_at(&workspace.home, repository)
        .with_context(|| format!("failed to connect repository '{}'", args.id))?;

    println!(
        "{} {} ({})",
        "Connected".green().bold(),
        record.repository.display_name(),
        record.repository.path.display()
    );
    for target in &record.targets {
        println!("  root target: {}", target.id);
    }
    Ok(())
}

#[derive(Tabled)]
struct RepositoryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
    #[tabled(rename = "CHECKOUT")]
    path: String,
    #[tabled(rename = "TARGETS")]
    targets: usize,
}

fn list(workspace: &Workspace) -> Result<()> {
    let records: Vec<_> = registry::list_repositories_at(&workspace.home)
        .context("failed to load repositories")?
        .into_iter()
        .filter(|r| &r.repository.organization_id == workspace.organization())
        .collect();

    if records.is_empty() {
        println!("No repositories connected.");
        println!("Run: cadence repo connect <id> --path <dir>");
        return Ok(());
    }

    let rows: Vec<RepositoryRow> = records
        .iter()
        .map(|r| RepositoryRow {
            id: r.repository.id.to_string(),
            repository: r.repository.display_name(),
            path: r.repository.path.display().to_string(),
            targets: r.live_targets().count(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
