//! `cadence config show` and `cadence config set`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use cadence_core::{
    config,
    types::{OrganizationId, UserId},
    AgentKind,
};

use super::{GlobalArgs, Workspace};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as YAML.
    Show,

    /// Update fields of `.cadence/config.yaml`.
    Set(SetArgs),
}

#[derive(Args, Debug)]
pub struct SetArgs {
    #[arg(long = "organization", value_name = "ID")]
    pub organization: Option<String>,

    #[arg(long = "author-id", value_name = "ID")]
    pub author: Option<String>,

    /// Agents to render for, comma separated (e.g. "claude,cursor").
    #[arg(long, value_delimiter = ',')]
    pub agents: Option<Vec<AgentKind>>,
}

pub fn run(global: &GlobalArgs, cmd: ConfigCommand) -> Result<()> {
    let workspace = Workspace::load(global)?;
    match cmd {
        ConfigCommand::Show => {
            print!("{}", serde_yaml::to_string(&workspace.config)?);
            Ok(())
        }
        ConfigCommand::Set(args) => {
            // Start from the file, not from the flag-overridden view.
            let mut current = config::load_at(&workspace.home).context("failed to load config")?;
            if let Some(org) = args.organization {
                current.organization_id = OrganizationId::from(org);
            }
            if let Some(author) = args.author {
                current.author_id = UserId::from(author);
            }
            if let Some(mut agents) = args.agents {
                agents.sort();
                agents.dedup();
                current.agents = agents;
            }
            config::save_at(&workspace.home, &current).context("failed to save config")?;
            println!("Saved {}", config::config_path_at(&workspace.home).display());
            Ok(())
        }
    }
}
