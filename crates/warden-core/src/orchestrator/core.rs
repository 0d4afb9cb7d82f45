//! Orchestrator core structure
//!
//! Contains the `Orchestrator` struct and its builder methods. Every
//! collaborator is an explicit dependency handed in at construction.

use crate::approval::ApprovalHandler;
use crate::model::ChatMessage;
use crate::planner::SharedPlanner;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use warden_audit::SharedAuditSink;
use warden_policy::{SharedPolicyEngine, WorkspaceRoot};
use warden_tools::HandlerRegistry;

use super::config::OrchestratorConfig;

/// Turn driver for one session
pub struct Orchestrator {
    pub(crate) planner: SharedPlanner,
    pub(crate) policy: SharedPolicyEngine,
    pub(crate) workspace: Arc<WorkspaceRoot>,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) approval: Arc<dyn ApprovalHandler>,
    pub(crate) audit: SharedAuditSink,
    pub(crate) config: OrchestratorConfig,
    pub(crate) history: Mutex<Vec<ChatMessage>>,
    /// Held for the whole of a turn so turns never overlap
    pub(crate) turn_lock: Mutex<()>,
}

impl Orchestrator {
    /// Create an orchestrator with the built-in handlers
    #[must_use]
    pub fn new(
        planner: SharedPlanner,
        policy: SharedPolicyEngine,
        workspace: Arc<WorkspaceRoot>,
        approval: Arc<dyn ApprovalHandler>,
        audit: SharedAuditSink,
    ) -> Self {
        let registry = Arc::new(HandlerRegistry::with_defaults(
            policy.clone(),
            workspace.clone(),
        ));

        info!(
            planner = %planner.name(),
            audit = %audit.name(),
            handlers = registry.len(),
            "Orchestrator created"
        );

        Self {
            planner,
            policy,
            workspace,
            registry,
            approval,
            audit,
            config: OrchestratorConfig::default(),
            history: Mutex::new(Vec::new()),
            turn_lock: Mutex::new(()),
        }
    }

    /// Replace the handler registry
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// The configuration
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// The policy engine
    #[must_use]
    pub fn policy(&self) -> &SharedPolicyEngine {
        &self.policy
    }

    /// The workspace root store
    #[must_use]
    pub fn workspace(&self) -> &Arc<WorkspaceRoot> {
        &self.workspace
    }

    /// The active planner's name
    #[must_use]
    pub fn planner_name(&self) -> &str {
        self.planner.name()
    }

    /// Snapshot of the retained conversation history
    pub async fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().await.clone()
    }
}
