//! Registry - Capability handlers and dispatch by tool name
//!
//! Every handler re-authorizes through [`HandlerContext::authorize`] before
//! acting, whoever called it.

use crate::result::ToolResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_policy::{PolicyDecision, SharedPolicyEngine, ToolCall, WorkspaceRoot};

/// What every handler needs to re-validate a call
#[derive(Debug, Clone)]
pub struct HandlerContext {
    /// Shared policy engine
    pub policy: SharedPolicyEngine,
    /// Shared workspace root
    pub workspace: Arc<WorkspaceRoot>,
}

impl HandlerContext {
    /// Create a new context
    #[must_use]
    pub fn new(policy: SharedPolicyEngine, workspace: Arc<WorkspaceRoot>) -> Self {
        Self { policy, workspace }
    }

    /// Re-run policy for `call` and resolve the workspace root.
    ///
    /// On denial, or when no valid root is set, returns the denial result
    /// the handler should hand back as-is.
    pub fn authorize(
        &self,
        call: &ToolCall,
    ) -> std::result::Result<(PathBuf, PolicyDecision), ToolResult> {
        let root = self.workspace.current();
        let decision = self.policy.evaluate(call, root.as_deref());
        if !decision.allowed {
            warn!(tool = %call.name, reason = %decision.reason, "Handler denied call");
            return Err(ToolResult::denied(call, decision.reason));
        }
        match root {
            Some(root) => Ok((root, decision)),
            None => {
                warn!(tool = %call.name, "Handler denied call without workspace root");
                Err(ToolResult::denied(call, "No workspace root is set"))
            }
        }
    }
}

/// One bounded capability
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    /// Tool name this handler serves
    fn name(&self) -> &str;

    /// Handle a call. Denials and validation errors come back as results.
    async fn handle(&self, call: &ToolCall) -> ToolResult;
}

/// Registry mapping tool names to handlers
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn CapabilityHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `file_search`, `file_read` and `command_exec`
    #[must_use]
    pub fn with_defaults(policy: SharedPolicyEngine, workspace: Arc<WorkspaceRoot>) -> Self {
        let context = HandlerContext::new(policy, workspace);
        let mut registry = Self::new();
        crate::builtins::register_builtins(&mut registry, &context);
        registry
    }

    /// Register a handler, replacing any handler with the same name
    pub fn register(&mut self, handler: Arc<dyn CapabilityHandler>) {
        let name = handler.name().to_string();
        debug!(tool = %name, "Registering handler");
        self.handlers.insert(name, handler);
    }

    /// Get a handler by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn CapabilityHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Check if a handler exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered tool names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get handler count
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
