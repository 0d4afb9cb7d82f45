//! Orchestrator types

use serde::{Deserialize, Serialize};
use warden_tools::ToolResult;

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The planner asked questions; nothing ran
    Clarifying,
    /// Nothing was proposed, or nothing was approved
    NoActions,
    /// Policy denied the turn; nothing ran
    Denied,
    /// Actions were executed (some may have failed)
    Completed,
    /// A system fault or unclassified error ended the turn
    FailedClosed,
}

impl TurnStatus {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clarifying => "clarifying",
            Self::NoActions => "no_actions",
            Self::Denied => "denied",
            Self::Completed => "completed",
            Self::FailedClosed => "failed_closed",
        }
    }
}

impl std::fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single reply of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Assistant reply, already appended to history
    pub reply: String,
    /// How the turn ended
    pub status: TurnStatus,
    /// Results of executed actions, in plan order
    pub results: Vec<ToolResult>,
}

impl TurnOutcome {
    /// Number of executed actions that failed
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_error).count()
    }
}
