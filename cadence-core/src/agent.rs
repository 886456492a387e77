//! [`AgentKind`]: the AI coding assistants content can be rendered for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// All supported AI coding agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Claude,
    Cursor,
    Windsurf,
    Copilot,
    Cline,
    Junie,
    Antigravity,
}

impl AgentKind {
    /// All agent variants in a stable order.
    pub fn all() -> &'static [AgentKind] {
        &[
            AgentKind::Claude,
            AgentKind::Cursor,
            AgentKind::Windsurf,
            AgentKind::Copilot,
            AgentKind::Cline,
            AgentKind::Junie,
            AgentKind::Antigravity,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            AgentKind::Claude      => "claude",
            AgentKind::Cursor      => "cursor",
            AgentKind::Windsurf    => "windsurf",
            AgentKind::Copilot     => "copilot",
            AgentKind::Cline       => "cline",
            AgentKind::Junie       => "junie",
            AgentKind::Antigravity => "antigravity",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AgentKind::all()
            .iter()
            .copied()
            .find(|agent| agent.name() == lower)
            .ok_or_else(|| {
                let expected: Vec<&str> = AgentKind::all().iter().map(|a| a.name()).collect();
                format!("unknown agent '{s}'; expected: {}", expected.join(", "))
            })
    }
}
