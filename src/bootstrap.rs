//! Bootstrap - Construct the shared components once at startup
//!
//! The policy engine, workspace root and audit log are built here and handed
//! to everything that needs them.

use crate::config::{AppConfig, PlannerKind, PlannerSettings};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use warden_audit::{AuditConfig, AuditLog, EventKind};
use warden_core::{LlmPlanner, OpenAiCompatibleClient, OpenAiConfig, RuleBasedPlanner, SharedPlanner};
use warden_policy::{PolicyConfig, PolicyEngine, SharedPolicyEngine, WorkspaceRoot};

/// Components shared by every command
pub struct Runtime {
    pub config: AppConfig,
    pub policy: SharedPolicyEngine,
    pub workspace: Arc<WorkspaceRoot>,
    pub audit: Arc<AuditLog>,
}

impl Runtime {
    /// Load the policy, the persisted workspace root and open the audit log
    pub async fn open(config: AppConfig) -> Result<Self> {
        let policy = Arc::new(PolicyEngine::new(PolicyConfig::load(&config.policy_path())));

        let workspace = match config.workspace_state_file() {
            Some(state_file) => WorkspaceRoot::with_state_file(state_file),
            None => {
                warn!("No data directory available; the workspace root will not be remembered");
                WorkspaceRoot::in_memory()
            }
        };

        let audit_path = config.audit_path()?;
        let audit = AuditLog::open(
            AuditConfig::new(&audit_path)
                .with_max_bytes(config.audit.max_bytes)
                .with_max_backups(config.audit.max_backups),
        )
        .await
        .with_context(|| format!("Failed to open audit log at {}", audit_path.display()))?;

        Ok(Self {
            config,
            policy,
            workspace: Arc::new(workspace),
            audit: Arc::new(audit),
        })
    }

    /// Record which policy is in force
    pub async fn record_policy_loaded(&self) -> Result<()> {
        let policy = self.policy.config();
        self.audit
            .record(
                EventKind::PolicyLoaded,
                json!({
                    "path": self.config.policy_path().display().to_string(),
                    "denyAll": policy.is_deny_all(),
                    "allowedTools": policy.allowed_tools,
                    "allowedExecutables": policy.allowed_executables,
                    "maxActionsPerTurn": policy.max_actions_per_turn,
                }),
            )
            .await
            .context("Failed to write audit log")?;
        Ok(())
    }

    /// Set the workspace root and record the change
    pub async fn set_workspace(&self, path: &Path) -> Result<std::path::PathBuf> {
        let root = self
            .workspace
            .set(path)
            .with_context(|| format!("Cannot use '{}' as the workspace", path.display()))?;
        self.audit
            .record(
                EventKind::WorkspaceChanged,
                json!({ "root": root.display().to_string() }),
            )
            .await
            .context("Failed to write audit log")?;
        Ok(root)
    }

    /// Clear the workspace root and record the change
    pub async fn clear_workspace(&self) -> Result<()> {
        self.workspace
            .clear()
            .context("Failed to clear the workspace root")?;
        self.audit
            .record(EventKind::WorkspaceChanged, json!({ "root": null }))
            .await
            .context("Failed to write audit log")?;
        Ok(())
    }
}

/// Build the configured planner
pub fn build_planner(settings: &PlannerSettings) -> Result<SharedPlanner> {
    match settings.kind {
        PlannerKind::Rules => {
            info!("Using rule-based planner");
            Ok(Arc::new(RuleBasedPlanner::new()))
        }
        PlannerKind::Llm => {
            let mut client_config = OpenAiConfig::new()
                .with_base_url(&settings.base_url)
                .with_model(&settings.model)
                .with_timeout(Duration::from_secs(settings.timeout_secs));
            if let Some(var) = &settings.api_key_env {
                match std::env::var(var) {
                    Ok(key) if !key.is_empty() => client_config = client_config.with_api_key(key),
                    _ => warn!(env = %var, "Planner API key variable is not set"),
                }
            }

            info!(base_url = %settings.base_url, model = %settings.model, "Using model-backed planner");
            let client = OpenAiCompatibleClient::new(client_config)
                .context("Failed to create the planner client")?;
            Ok(Arc::new(LlmPlanner::new(Arc::new(client))))
        }
    }
}
