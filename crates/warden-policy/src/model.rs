//! Model - Tool calls and risk levels
//!
//! These types cross every crate boundary: the planner produces `ToolCall`s,
//! the engine assigns a `RiskLevel`, the handlers consume both.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata-only search under the workspace root
pub const TOOL_FILE_SEARCH: &str = "file_search";
/// Bounded read of a single file
pub const TOOL_FILE_READ: &str = "file_read";
/// One allowlisted binary, no shell
pub const TOOL_COMMAND_EXEC: &str = "command_exec";

/// Risk level assigned by the policy engine
///
/// Ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Executes immediately
    Low,
    /// Requires explicit human approval
    Medium,
    /// Always blocked
    High,
}

impl RiskLevel {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Check if approval is required for this risk level
    #[must_use]
    pub fn requires_approval(&self) -> bool {
        matches!(self, Self::Medium)
    }

    /// Check if this risk level is blocked outright
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named request for one bounded capability
///
/// The argument bag is untyped on purpose: nothing in it is trusted until
/// the engine and the handler have both validated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identity, echoed back in the tool result
    pub id: Uuid,
    /// Tool name (`file_search`, `file_read`, `command_exec`)
    pub name: String,
    /// Raw arguments as proposed by the planner
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call with a fresh identity
    #[must_use]
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument
    #[must_use]
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a raw argument
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&serde_json::Value> {
        self.arguments.get(key)
    }
}
