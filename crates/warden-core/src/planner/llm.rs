//! LLM planner - Plans produced by a chat model
//!
//! The model is asked for a single JSON object and nothing else. Whatever
//! comes back is parsed strictly: anything outside the plan contract is a
//! [`Error::Planning`] and the turn fails closed. Risk fields the model
//! volunteers are ignored.

use super::client::{CompletionClient, CompletionMessage};
use super::Planner;
use crate::error::{Error, Result};
use crate::model::{AgentPlan, ChatMessage, ProposedAction, Role};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use warden_policy::ToolCall;

/// Fixed system prompt describing the plan contract
pub const SYSTEM_PROMPT: &str = r#"You are the planner for Warden, a local assistant that can only propose actions.
You never execute anything yourself. Every action you propose is checked by a policy engine and may need human approval.

Available tools:
- file_search: {"query"?: string, "modifiedAfter"?: "YYYY-MM-DD", "modifiedBefore"?: "YYYY-MM-DD", "limit"?: integer}
  Searches file names and metadata inside the workspace.
- file_read: {"path": string, "maxBytes"?: integer}
  Reads the start of one file inside the workspace. Paths are relative to the workspace root.
- command_exec: {"executablePath": absolute path string, "args": [string], "timeoutSeconds"?: integer}
  Runs one allowlisted binary without a shell.

Reply with exactly one JSON object and no other text:
{"summary": string, "questions": [string], "actions": [{"title": string, "justification": string, "tool": string, "arguments": object}]}

If the request is ambiguous, put your questions in "questions" and leave "actions" empty."#;

#[derive(Debug, Deserialize)]
struct RawPlan {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    title: String,
    #[serde(default)]
    justification: String,
    tool: String,
    #[serde(default = "empty_object")]
    arguments: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Remove a surrounding Markdown code fence, if any
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse model output into a plan.
///
/// Every action comes back unassessed (High risk) regardless of what the
/// model claimed.
pub fn parse_plan(text: &str) -> Result<AgentPlan> {
    let body = strip_code_fence(text);
    let raw: RawPlan = serde_json::from_str(body)
        .map_err(|e| Error::Planning(format!("planner reply is not a valid plan: {}", e)))?;

    let mut actions = Vec::with_capacity(raw.actions.len());
    for (index, action) in raw.actions.into_iter().enumerate() {
        if action.tool.trim().is_empty() {
            return Err(Error::Planning(format!("action {} has no tool", index)));
        }
        if !action.arguments.is_object() {
            return Err(Error::Planning(format!(
                "action {} arguments must be an object",
                index
            )));
        }
        let title = if action.title.is_empty() {
            action.tool.clone()
        } else {
            action.title
        };
        actions.push(ProposedAction::new(
            title,
            action.justification,
            ToolCall::new(action.tool, action.arguments),
        ));
    }

    Ok(AgentPlan {
        summary: raw.summary,
        questions: raw.questions,
        actions,
    })
}

/// Model-backed planner
pub struct LlmPlanner {
    client: Arc<dyn CompletionClient>,
}

impl LlmPlanner {
    /// Create a planner over a completion client
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    fn build_messages(history: &[ChatMessage]) -> Vec<CompletionMessage> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(CompletionMessage::new(Role::System, SYSTEM_PROMPT));
        messages.extend(
            history
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| CompletionMessage::new(m.role, m.text.clone())),
        );
        messages
    }
}

#[async_trait::async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, history: &[ChatMessage]) -> Result<AgentPlan> {
        let messages = Self::build_messages(history);
        let reply = self.client.complete(&messages).await?;
        match parse_plan(&reply) {
            Ok(plan) => {
                debug!(
                    model = %self.client.model(),
                    actions = plan.actions.len(),
                    questions = plan.questions.len(),
                    "Model plan parsed"
                );
                Ok(plan)
            }
            Err(e) => {
                warn!(model = %self.client.model(), error = %e, "Rejected model plan");
                Err(e)
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests;
