//! Warden Core - Turn orchestration
//!
//! This crate drives one conversation turn from message to reply:
//! - Model: chat messages, proposed actions and plans
//! - Planner: rule-based and model-backed proposal sources
//! - Approval: suspending a turn until a human signs off
//! - Orchestrator: plan, validate, approve, execute, summarize
//! - Error: the failure taxonomy and user-facing messages

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod approval;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod planner;

pub use approval::{
    ApprovalDecision, ApprovalError, ApprovalHandler, ApprovalManager, ApprovalRequest,
    SharedApprovalManager,
};
pub use error::{format_error_for_cli, Error, Result, UserFriendlyError};
pub use model::{AgentPlan, ChatMessage, ProposedAction, Role};
pub use orchestrator::{Orchestrator, OrchestratorConfig, TurnOutcome, TurnStatus};
pub use planner::{
    CompletionClient, CompletionMessage, LlmPlanner, OpenAiCompatibleClient, OpenAiConfig,
    Planner, RuleBasedPlanner, SharedPlanner,
};
