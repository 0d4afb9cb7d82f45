//! Engine - Deterministic evaluation of proposed tool calls
//!
//! `evaluate` is a function of the call, the workspace root and the loaded
//! configuration only. The engine holds no mutable state, so a single
//! instance is shared behind an `Arc` and called concurrently.
//!
//! Rules are applied in order and the first failure wins:
//! 1. the tool must be in `allowed_tools`
//! 2. `file_search` is Low
//! 3. `file_read` needs a root, a string `path`, and a contained target (Low)
//! 4. `command_exec` needs an allowlisted absolute executable, string args,
//!    and no blocked token anywhere (Medium)
//! 5. anything else is denied

use crate::config::PolicyConfig;
use crate::containment::{resolve_candidate, resolve_within};
use crate::model::{RiskLevel, ToolCall, TOOL_COMMAND_EXEC, TOOL_FILE_READ, TOOL_FILE_SEARCH};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Shared engine handle
pub type SharedPolicyEngine = Arc<PolicyEngine>;

/// Outcome of one evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    /// Whether the call may proceed
    pub allowed: bool,
    /// Assigned risk
    pub risk: RiskLevel,
    /// Human-readable reason
    pub reason: String,
}

impl PolicyDecision {
    /// Allow at the given risk
    #[must_use]
    pub fn allow(risk: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            risk,
            reason: reason.into(),
        }
    }

    /// Deny; denials are always High
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            risk: RiskLevel::High,
            reason: reason.into(),
        }
    }
}

/// The Policy Engine
#[derive(Debug, Clone, Default)]
pub struct PolicyEngine {
    config: PolicyConfig,
}

impl PolicyEngine {
    /// Create an engine over a loaded configuration
    #[must_use]
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    /// Engine over the deny-all fallback
    #[must_use]
    pub fn deny_all() -> Self {
        Self::new(PolicyConfig::deny_all())
    }

    /// The loaded configuration
    #[must_use]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Evaluate a tool call against the configuration and workspace root.
    #[must_use]
    pub fn evaluate(&self, call: &ToolCall, workspace_root: Option<&Path>) -> PolicyDecision {
        let decision = self.evaluate_inner(call, workspace_root);
        debug!(
            tool = %call.name,
            call_id = %call.id,
            allowed = decision.allowed,
            risk = %decision.risk,
            reason = %decision.reason,
            "Policy evaluated"
        );
        decision
    }

    fn evaluate_inner(&self, call: &ToolCall, workspace_root: Option<&Path>) -> PolicyDecision {
        if !self.config.allows_tool(&call.name) {
            return PolicyDecision::deny(format!(
                "Tool '{}' is not in allowedTools",
                call.name
            ));
        }

        match call.name.as_str() {
            TOOL_FILE_SEARCH => {
                PolicyDecision::allow(RiskLevel::Low, "Metadata-only search")
            }
            TOOL_FILE_READ => self.evaluate_read(call, workspace_root),
            TOOL_COMMAND_EXEC => self.evaluate_exec(call),
            other => PolicyDecision::deny(format!("Tool '{}' is not allowed", other)),
        }
    }

    fn evaluate_read(&self, call: &ToolCall, workspace_root: Option<&Path>) -> PolicyDecision {
        let Some(root) = workspace_root else {
            return PolicyDecision::deny("No workspace root is set");
        };
        let Some(path) = call.str_arg("path") else {
            return PolicyDecision::deny("file_read requires a string 'path' argument");
        };

        let candidate = resolve_candidate(root, path);
        if resolve_within(root, &candidate).is_none() {
            return PolicyDecision::deny(format!(
                "Path '{}' is outside the workspace root",
                path
            ));
        }

        PolicyDecision::allow(RiskLevel::Low, "Bounded read inside the workspace")
    }

    fn evaluate_exec(&self, call: &ToolCall) -> PolicyDecision {
        let Some(executable) = call.str_arg("executablePath") else {
            return PolicyDecision::deny(
                "command_exec requires a string 'executablePath' argument",
            );
        };
        if !Path::new(executable).is_absolute() {
            return PolicyDecision::deny(format!(
                "Executable '{}' is not an absolute path",
                executable
            ));
        }
        if !self.config.allows_executable(executable) {
            return PolicyDecision::deny(format!(
                "Executable '{}' is not in allowedExecutables",
                executable
            ));
        }

        let Some(raw_args) = call.arg("args").and_then(|v| v.as_array()) else {
            return PolicyDecision::deny("command_exec requires an 'args' array");
        };
        let mut tokens = Vec::with_capacity(raw_args.len() + 1);
        tokens.push(executable);
        for (index, arg) in raw_args.iter().enumerate() {
            match arg.as_str() {
                Some(s) => tokens.push(s),
                None => {
                    return PolicyDecision::deny(format!(
                        "Argument {} is not a string",
                        index
                    ));
                }
            }
        }

        for token in tokens {
            if let Some(blocked) = self.config.find_blocked_token(token) {
                return PolicyDecision::deny(format!(
                    "Blocked token '{}' found in '{}'",
                    blocked, token
                ));
            }
        }

        PolicyDecision::allow(RiskLevel::Medium, "Process execution requires approval")
    }
}
