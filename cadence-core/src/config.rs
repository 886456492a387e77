//! Workspace configuration at `<home>/.cadence/config.yaml`.
//!
//! ```yaml
//! organization_id: acme
//! author_id: ada
//! agents: [claude, cursor]
//! ```
//!
//! A missing file yields [`Config::default`]. Unknown agent names are a parse
//! error, reported with the file path.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::error::RegistryError;
use crate::registry::cadence_dir_at;
use crate::types::{OrganizationId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_organization")]
    pub organization_id: OrganizationId,
    #[serde(default = "default_author")]
    pub author_id: UserId,
    /// Agents whose instruction files are rendered on every publish.
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentKind>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization_id: default_organization(),
            author_id: default_author(),
            agents: default_agents(),
        }
    }
}

fn default_organization() -> OrganizationId {
    OrganizationId::from("default")
}

fn default_author() -> UserId {
    UserId::from("cadence")
}

fn default_agents() -> Vec<AgentKind> {
    vec![AgentKind::Claude]
}

/// `<home>/.cadence/config.yaml`
pub fn config_path_at(home: &Path) -> PathBuf {
    cadence_dir_at(home).join("config.yaml")
}

/// Load the config, falling back to defaults when the file does not exist.
pub fn load_at(home: &Path) -> Result<Config, RegistryError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    let mut config: Config =
        serde_yaml::from_str(&contents).map_err(|e| RegistryError::Parse { path, source: e })?;
    config.agents.sort();
    config.agents.dedup();
    Ok(config)
}

/// Atomically write the config (`.yaml.tmp` + rename).
pub fn save_at(home: &Path, config: &Config) -> Result<(), RegistryError> {
    let path = config_path_at(home);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, serde_yaml::to_string(config)?)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}
