//! `cadence target list|add|rename|move|remove`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use cadence_core::{
    registry,
    types::{RepositoryId, ResolvedTarget, TargetId},
};

use super::{GlobalArgs, Workspace};

/// Manage publish targets inside connected repositories.
#[derive(Subcommand, Debug)]
pub enum TargetCommand {
    /// List live targets of the current organization.
    List(ListArgs),

    /// Add a target at a sub-directory of a repository.
    Add(AddArgs),

    /// Rename a target. The root target cannot be renamed.
    Rename(RenameArgs),

    /// Point a target at another sub-directory.
    Move(MoveArgs),

    /// Soft-delete a target. Its deployment history is kept.
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub repository: String,
    pub name: String,
    /// Sub-directory, written as `/apps/web/`.
    pub path: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    pub target: String,
    pub name: String,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    pub target: String,
    pub path: String,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    pub target: String,
}

pub fn run(global: &GlobalArgs, cmd: TargetCommand) -> Result<()> {
    let workspace = Workspace::load(global)?;
    match cmd {
        TargetCommand::List(args) => list(&workspace, args),
        TargetCommand::Add(args) => {
            let target = registry::add_target_at(
                &workspace.home,
                &RepositoryId::from(args.repository.as_str()),
                &args.name,
                &args.path,
            )
            .with_context(|| format!("failed to add target to '{}'", args.repository))?;
            println!("{} {} {} at {}", "Added".green().bold(), target.name, target.id, target.path);
            Ok(())
        }
        TargetCommand::Rename(args) => {
            let target = registry::rename_target_at(&workspace.home, &TargetId::from(args.target.as_str()), &args.name)
                .with_context(|| format!("failed to rename target '{}'", args.target))?;
            println!("{} {} to {}", "Renamed".green().bold(), target.id, target.name);
            Ok(())
        }
        TargetCommand::Move(args) => {
            let target =
                registry::update_target_path_at(&workspace.home, &TargetId::from(args.target.as_str()), &args.path)
                    .with_context(|| format!("failed to move target '{}'", args.target))?;
            println!("{} {} to {}", "Moved".green().bold(), target.id, target.path);
            Ok(())
        }
        TargetCommand::Remove(args) => {
            let target = registry::remove_target_at(&workspace.home, &TargetId::from(args.target.as_str()))
                .with_context(|| format!("failed to remove target '{}'", args.target))?;
            println!("{} {} ({})", "Removed".yellow().bold(), target.name, target.id);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct TargetReport {
    id: String,
    name: String,
    path: String,
    repository_id: String,
    repository: String,
}

impl From<&ResolvedTarget> for TargetReport {
    fn from(resolved: &ResolvedTarget) -> Self {
        TargetReport {
            id: resolved.target.id.to_string(),
            name: resolved.target.name.clone(),
            path: resolved.target.path.clone(),
            repository_id: resolved.repository.id.to_string(),
            repository: resolved.repository.display_name(),
        }
    }
}

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "PATH")]
    path: String,
    #[tabled(rename = "REPOSITORY")]
    repository: String,
}

fn list(workspace: &Workspace, args: ListArgs) -> Result<()> {
    let targets = registry::list_targets_at(&workspace.home, workspace.organization())
        .context("failed to load targets")?;
    let reports: Vec<TargetReport> = targets.iter().map(TargetReport::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No targets for organization '{}'.", workspace.organization());
        println!("Run: cadence repo connect <id> --path <dir>");
        return Ok(());
    }

    let rows: Vec<TargetRow> = reports
        .into_iter()
        .map(|r| TargetRow { id: r.id, name: r.name, path: r.path, repository: r.repository })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}
