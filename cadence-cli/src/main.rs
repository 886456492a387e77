//! Cadence: publish versioned playbooks and standards to repository targets.
//!
//! # Usage
//!
//! ```text
//! cadence repo connect <id> --path <dir> [--owner o] [--name n] [--branch b] [--url u]
//! cadence repo list
//! cadence target list [--json]
//! cadence target add <repo-id> <name> <path>
//! cadence target rename <target-id> <name>
//! cadence target move <target-id> <path>
//! cadence target remove <target-id>
//! cadence publish playbooks|standards --version <id>... --target <id>... [--git]
//! cadence diff playbooks|standards --version <id>... --target <id>
//! cadence overview [--standards] [--by-content] [--by-repository] [--json]
//! cadence history playbooks|standards <content-id> [--json]
//! cadence config show|set
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigCommand, diff::DiffArgs, history::HistoryArgs, overview::OverviewArgs,
    publish::PublishArgs, repo::RepoCommand, target::TargetCommand, GlobalArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "cadence",
    version,
    about = "Publish versioned playbooks and standards to repository targets",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect and list repositories.
    Repo {
        #[command(subcommand)]
        command: RepoCommand,
    },

    /// Manage publish targets inside connected repositories.
    Target {
        #[command(subcommand)]
        command: TargetCommand,
    },

    /// Publish content versions to one or more targets.
    Publish(PublishArgs),

    /// Show unified diffs of what a publish would change at one target.
    Diff(DiffArgs),

    /// Show which targets are up to date with the latest content.
    Overview(OverviewArgs),

    /// List every deployment that included one content item.
    History(HistoryArgs),

    /// Show or change the workspace configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Repo { command } => commands::repo::run(&global, command),
        Commands::Target { command } => commands::target::run(&global, command),
        Commands::Publish(args) => args.run(&global),
        Commands::Diff(args) => args.run(&global),
        Commands::Overview(args) => args.run(&global),
        Commands::History(args) => args.run(&global),
        Commands::Config { command } => commands::config::run(&global, command),
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
