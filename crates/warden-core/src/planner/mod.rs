//! Planner - Where proposals come from
//!
//! The planner is a pure proposal source behind one interface. Nothing it
//! returns is trusted: risk fields are reassigned by the policy engine and
//! every action is re-checked by its handler.

use crate::error::Result;
use crate::model::{AgentPlan, ChatMessage};
use std::sync::Arc;

pub mod client;
pub mod llm;
pub mod rules;

pub use client::{CompletionClient, CompletionMessage, OpenAiCompatibleClient, OpenAiConfig};
pub use llm::{parse_plan, LlmPlanner};
pub use rules::RuleBasedPlanner;

/// Turns conversation history into a plan
#[async_trait::async_trait]
pub trait Planner: Send + Sync {
    /// Plan the next turn from the full retained history
    async fn plan(&self, history: &[ChatMessage]) -> Result<AgentPlan>;

    /// Planner name (for logging)
    fn name(&self) -> &str;
}

/// Shared planner handle
pub type SharedPlanner = Arc<dyn Planner>;
