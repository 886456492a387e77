//! `cadence diff <kind> --version <id>... --target <id>`: show unified diffs
//! for what a publish would write.

use anyhow::{Context, Result};
use clap::Args;

use cadence_core::types::{ContentKind, TargetId, VersionId};

use super::{GlobalArgs, Workspace};

/// Arguments for `cadence diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// playbooks | standards
    pub kind: ContentKind,

    #[arg(long = "version", value_name = "ID")]
    pub versions: Vec<String>,

    #[arg(long = "target", value_name = "ID")]
    pub target: String,
}

impl DiffArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let workspace = Workspace::load(global)?;
        let service = workspace.service(false)?;
        let versions: Vec<VersionId> = self.versions.iter().map(|v| VersionId::from(v.as_str())).collect();
        let target = TargetId::from(self.target.as_str());

        let diffs = service
            .preview(workspace.organization(), self.kind, &versions, &target)
            .with_context(|| format!("diff failed for target '{}'", self.target))?;

        if diffs.is_empty() {
            println!("No differences for target '{}'.", self.target);
            return Ok(());
        }

        for diff in diffs {
            print!("{}", diff.unified_diff);
            if !diff.unified_diff.ends_with('\n') {
                println!();
            }
        }
        Ok(())
    }
}
