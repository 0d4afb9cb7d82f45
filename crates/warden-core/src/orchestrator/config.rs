//! Orchestrator configuration

use serde::{Deserialize, Serialize};

/// Default number of retained history messages
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// Configuration for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Messages kept in history; the oldest are dropped first
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl OrchestratorConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the history limit (at least one message is always kept)
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit.max(1);
        self
    }
}
