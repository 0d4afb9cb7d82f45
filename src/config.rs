//! Application configuration
//!
//! Loaded from embedded defaults, then `config/default.*`, `config/local.*`
//! and finally `WARDEN_*` environment variables. The policy document is a
//! separate file and is never merged into this configuration.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use warden_audit::{DEFAULT_MAX_BACKUPS, DEFAULT_MAX_BYTES};
use warden_core::OrchestratorConfig;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub workspace: WorkspaceSettings,
    #[serde(default)]
    pub audit: AuditSettings,
    #[serde(default)]
    pub planner: PlannerSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Where the policy document lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicySettings {
    pub path: String,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            path: "config/policy.toml".to_string(),
        }
    }
}

/// Workspace root persistence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    #[serde(default)]
    pub state_file: Option<String>,
}

/// Audit log location and rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSettings {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: DEFAULT_MAX_BYTES,
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

/// Which planner to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerKind {
    /// Keyword matcher
    #[default]
    Rules,
    /// Chat model over an OpenAI-compatible endpoint
    Llm,
}

/// Planner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    #[serde(default)]
    pub kind: PlannerKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_planner_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    warden_core::planner::client::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    warden_core::planner::client::DEFAULT_MODEL.to_string()
}

fn default_planner_timeout() -> u64 {
    120
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            kind: PlannerKind::Rules,
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: None,
            timeout_secs: default_planner_timeout(),
        }
    }
}

impl AppConfig {
    /// Policy document path
    pub fn policy_path(&self) -> PathBuf {
        expand_path(&self.policy.path)
    }

    /// Workspace state file, defaulting into the data directory
    pub fn workspace_state_file(&self) -> Option<PathBuf> {
        match &self.workspace.state_file {
            Some(path) => Some(expand_path(path)),
            None => warden_policy::default_state_file(),
        }
    }

    /// Audit log path, defaulting into the data directory
    pub fn audit_path(&self) -> Result<PathBuf> {
        match &self.audit.path {
            Some(path) => Ok(expand_path(path)),
            None => dirs::data_local_dir()
                .map(|d| d.join("warden").join("audit.log"))
                .context("No data directory available; set audit.path"),
        }
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. External overrides (optional)
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        // 3. Environment variables (highest priority), e.g. WARDEN_AUDIT__PATH
        .add_source(
            Environment::with_prefix("WARDEN")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
