//! Model - Conversation and plan types
//!
//! A planner produces an [`AgentPlan`] of [`ProposedAction`]s. Every action
//! starts at High risk and only the orchestrator, through the policy engine,
//! moves it anywhere else.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_policy::{PolicyDecision, RiskLevel, ToolCall};

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human
    User,
    /// Warden's replies
    Assistant,
    /// Out-of-band instructions
    System,
}

impl Role {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One immutable entry of the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identity
    pub id: Uuid,
    /// Author
    pub role: Role,
    /// Text content
    pub text: String,
    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped now
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a user message
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// A tool call with a title, justification and an engine-assigned risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    /// Short human-readable title
    pub title: String,
    /// Why the planner wants this
    pub justification: String,
    /// The underlying call
    pub call: ToolCall,
    /// Risk assigned by the policy engine
    pub risk: RiskLevel,
    /// Whether a human must approve before execution
    pub requires_approval: bool,
}

impl ProposedAction {
    /// Create an unassessed action (High risk until evaluated)
    #[must_use]
    pub fn new(title: impl Into<String>, justification: impl Into<String>, call: ToolCall) -> Self {
        Self {
            title: title.into(),
            justification: justification.into(),
            call,
            risk: RiskLevel::High,
            requires_approval: false,
        }
    }

    /// Action identity (the call identity)
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.call.id
    }

    /// Tool name
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.call.name
    }

    /// Apply a policy decision's risk
    pub fn assess(&mut self, decision: &PolicyDecision) {
        self.risk = decision.risk;
        self.requires_approval = decision.risk.requires_approval();
    }
}

/// The planner's output for one turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPlan {
    /// One-line summary
    pub summary: String,
    /// Clarifying questions; non-empty means "ask before acting"
    #[serde(default)]
    pub questions: Vec<String>,
    /// Proposed actions, in execution order
    #[serde(default)]
    pub actions: Vec<ProposedAction>,
}

impl AgentPlan {
    /// Create an empty plan
    #[must_use]
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            questions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// A plan that only asks
    #[must_use]
    pub fn clarify(question: impl Into<String>) -> Self {
        Self::new("Need clarification").with_question(question)
    }

    /// Add a clarifying question
    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.questions.push(question.into());
        self
    }

    /// Add an action
    #[must_use]
    pub fn with_action(mut self, action: ProposedAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Whether the plan asks before acting
    #[must_use]
    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_policy::TOOL_FILE_READ;

    #[test]
    fn test_action_starts_high_until_assessed() {
        let mut action = ProposedAction::new(
            "Read README.md",
            "asked for it",
            ToolCall::new(TOOL_FILE_READ, serde_json::json!({"path": "README.md"})),
        );
        assert_eq!(action.risk, RiskLevel::High);
        assert!(!action.requires_approval);

        action.assess(&PolicyDecision::allow(RiskLevel::Medium, "exec"));
        assert_eq!(action.risk, RiskLevel::Medium);
        assert!(action.requires_approval);
        assert_eq!(action.id(), action.call.id);
    }

    #[test]
    fn test_plan_builders() {
        let plan = AgentPlan::clarify("Which year?");
        assert!(plan.has_questions());
        assert!(plan.actions.is_empty());
        assert!(!AgentPlan::new("nothing").has_questions());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(ChatMessage::user("hi").role.as_str(), "user");
    }
}
