//! Policy configuration
//!
//! The policy document is loaded once at startup. A missing, unreadable or
//! malformed document never leaves the engine unconfigured: it falls back to
//! [`PolicyConfig::deny_all`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Default per-command timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default stdout/stderr cap in bytes
pub const DEFAULT_OUTPUT_CAP_BYTES: usize = 64 * 1024;

fn default_blocked_tokens() -> Vec<String> {
    ["rm", "sudo", ";", "&", "|", "`", "$(", ">", "<", ".."]
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_output_cap() -> usize {
    DEFAULT_OUTPUT_CAP_BYTES
}

/// Policy document
///
/// Field names are snake_case; the camelCase spellings are accepted as
/// aliases. Any field left out takes its deny-by-default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Tool names the engine will consider at all
    #[serde(default, alias = "allowedTools")]
    pub allowed_tools: Vec<String>,
    /// Absolute executable paths `command_exec` may run
    #[serde(default, alias = "allowedExecutables")]
    pub allowed_executables: Vec<String>,
    /// Substrings that deny a command when found in any token
    #[serde(default = "default_blocked_tokens", alias = "blockedTokens")]
    pub blocked_tokens: Vec<String>,
    /// Maximum proposed actions in one turn
    #[serde(default, alias = "maxActionsPerTurn")]
    pub max_actions_per_turn: usize,
    /// Default command timeout in seconds
    #[serde(default = "default_timeout_secs", alias = "defaultTimeoutSeconds")]
    pub default_timeout_seconds: u64,
    /// Stdout capture cap in bytes
    #[serde(default = "default_output_cap", alias = "maxStdoutBytes")]
    pub max_stdout_bytes: usize,
    /// Stderr capture cap in bytes
    #[serde(default = "default_output_cap", alias = "maxStderrBytes")]
    pub max_stderr_bytes: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self::deny_all()
    }
}

impl PolicyConfig {
    /// Hardcoded fallback: nothing allowed, non-empty blocklist, zero actions.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            allowed_tools: Vec::new(),
            allowed_executables: Vec::new(),
            blocked_tokens: default_blocked_tokens(),
            max_actions_per_turn: 0,
            default_timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_stdout_bytes: DEFAULT_OUTPUT_CAP_BYTES,
            max_stderr_bytes: DEFAULT_OUTPUT_CAP_BYTES,
        }
    }

    /// Load the policy from `path`, falling back to [`Self::deny_all`] on any
    /// failure.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => {
                info!(
                    path = %path.display(),
                    tools = config.allowed_tools.len(),
                    executables = config.allowed_executables.len(),
                    "Policy loaded"
                );
                config
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Policy unavailable, falling back to deny-all"
                );
                Self::deny_all()
            }
        }
    }

    /// Load and validate the policy from `path`.
    ///
    /// `.json` files are parsed as JSON, everything else as TOML.
    pub fn try_load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Parse and validate a TOML policy document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::InvalidPolicy(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON policy document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(content).map_err(|e| Error::InvalidPolicy(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject documents that parse but cannot be enforced as written.
    pub fn validate(&self) -> Result<()> {
        if let Some(exe) = self
            .allowed_executables
            .iter()
            .find(|e| !Path::new(e).is_absolute())
        {
            return Err(Error::InvalidPolicy(format!(
                "allowed executable '{}' is not an absolute path",
                exe
            )));
        }
        if self.default_timeout_seconds == 0 {
            return Err(Error::InvalidPolicy(
                "default_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.max_stdout_bytes == 0 || self.max_stderr_bytes == 0 {
            return Err(Error::InvalidPolicy(
                "output caps must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Check if a tool name is allowlisted
    #[must_use]
    pub fn allows_tool(&self, name: &str) -> bool {
        self.allowed_tools.iter().any(|t| t == name)
    }

    /// Check if an executable path is allowlisted (exact match)
    #[must_use]
    pub fn allows_executable(&self, path: &str) -> bool {
        self.allowed_executables.iter().any(|e| e == path)
    }

    /// Return the first blocked token found in `token`, if any.
    ///
    /// Matching is case-insensitive substring search; empty entries are
    /// ignored.
    #[must_use]
    pub fn find_blocked_token(&self, token: &str) -> Option<&str> {
        let lower = token.to_lowercase();
        self.blocked_tokens
            .iter()
            .filter(|b| !b.is_empty())
            .find(|b| lower.contains(&b.to_lowercase()))
            .map(String::as_str)
    }

    /// Whether this is the deny-all fallback (nothing can ever run)
    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        self.allowed_tools.is_empty() || self.max_actions_per_turn == 0
    }
}
