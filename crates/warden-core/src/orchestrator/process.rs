//! Turn processing
//!
//! Plan, validate, approve, execute, summarize. Every denial is terminal for
//! the turn and every error that escapes a step ends the turn closed.

use crate::approval::ApprovalRequest;
use crate::error::{Error, Result};
use crate::model::{ChatMessage, ProposedAction};
use serde_json::json;
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use warden_audit::EventKind;

use super::core::Orchestrator;
use super::helpers::output_digest;
use super::summary::summarize;
use super::types::{TurnOutcome, TurnStatus};

/// Reply when a High-risk action is proposed
const HIGH_RISK_REASON: &str = "High-risk actions are blocked in MVP.";

impl Orchestrator {
    /// Process one user message and return the turn's single reply.
    ///
    /// Turns are serialized. Denials and failures come back as an outcome;
    /// `Err` is returned only when the audit log cannot record the failure.
    #[instrument(skip(self, text), fields(planner = %self.planner.name()))]
    pub async fn process_message(&self, text: &str) -> Result<TurnOutcome> {
        let _turn = self.turn_lock.lock().await;

        match self.run_turn(text).await {
            Ok(outcome) => {
                info!(
                    status = %outcome.status,
                    executed = outcome.results.len(),
                    failed = outcome.failed_count(),
                    "Turn finished"
                );
                Ok(outcome)
            }
            Err(err) => self.fail_closed(err).await,
        }
    }

    async fn run_turn(&self, text: &str) -> Result<TurnOutcome> {
        // Planning
        let message = ChatMessage::user(text);
        let message_id = message.id;
        self.push_history(message).await;
        self.audit(
            EventKind::UserMessage,
            json!({ "messageId": message_id.to_string(), "text": text }),
        )
        .await?;

        let history = self.history().await;
        let plan = self.planner.plan(&history).await?;
        self.audit(
            EventKind::PlanReceived,
            json!({
                "planner": self.planner.name(),
                "summary": plan.summary,
                "questions": plan.questions.len(),
                "actions": plan.actions.iter().map(|a| json!({
                    "actionId": a.id().to_string(),
                    "tool": a.tool(),
                    "title": a.title,
                })).collect::<Vec<_>>(),
            }),
        )
        .await?;

        if plan.has_questions() {
            return self
                .finish(plan.questions.join("\n"), TurnStatus::Clarifying, Vec::new())
                .await;
        }

        // Validating
        let max_actions = self.policy.config().max_actions_per_turn;
        if plan.actions.len() > max_actions {
            let reason = format!(
                "The plan proposes {} actions but at most {} are allowed per turn",
                plan.actions.len(),
                max_actions
            );
            return self.deny_turn(reason, None).await;
        }

        let root = self.workspace.current();
        let mut actions = plan.actions;
        for action in &mut actions {
            let decision = self.policy.evaluate(&action.call, root.as_deref());
            if !decision.allowed {
                warn!(tool = %action.tool(), reason = %decision.reason, "Action denied");
                return self.deny_turn(decision.reason, Some(&*action)).await;
            }
            if decision.risk.is_blocking() {
                warn!(tool = %action.tool(), "High-risk action blocked");
                return self
                    .deny_turn(HIGH_RISK_REASON.to_string(), Some(&*action))
                    .await;
            }
            action.assess(&decision);
        }

        if actions.is_empty() {
            let reply = if plan.summary.trim().is_empty() {
                "No actions proposed.".to_string()
            } else {
                plan.summary
            };
            return self.finish(reply, TurnStatus::NoActions, Vec::new()).await;
        }

        // AwaitingApproval
        let approved = self.request_approval(&actions).await?;
        let actions: Vec<ProposedAction> = actions
            .into_iter()
            .filter(|a| !a.requires_approval || approved.contains(&a.id()))
            .collect();
        if actions.is_empty() {
            return self
                .finish("No actions executed.".to_string(), TurnStatus::NoActions, Vec::new())
                .await;
        }

        // Executing
        if self.workspace.current().is_none() {
            return Err(Error::SystemFault(
                "workspace root is missing or no longer a directory".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(actions.len());
        for action in &actions {
            let Some(handler) = self.registry.get(action.tool()) else {
                return Err(Error::Validation(format!("unknown tool '{}'", action.tool())));
            };

            let result = handler.handle(&action.call).await;
            self.audit(
                EventKind::ActionExecuted,
                json!({
                    "actionId": action.id().to_string(),
                    "tool": action.tool(),
                    "title": action.title,
                    "risk": action.risk.as_str(),
                    "isError": result.is_error,
                    "error": result.error,
                    "durationMs": result.duration_ms,
                    "output": output_digest(&result),
                }),
            )
            .await?;

            // A handler-level denial ends the turn; later actions never run
            if result.is_denied() {
                let reason = result
                    .error
                    .unwrap_or_else(|| "denied at execution time".to_string());
                warn!(tool = %action.tool(), reason = %reason, "Action denied by handler");
                return self.deny_turn(reason, Some(action)).await;
            }
            results.push(result);
        }

        // Summarizing
        let reply = summarize(&actions, &results);
        self.finish(reply, TurnStatus::Completed, results).await
    }

    /// Ask for approval of the Medium-risk subset, if any.
    ///
    /// Returns the approved ids, restricted to the ids that were asked about.
    async fn request_approval(&self, actions: &[ProposedAction]) -> Result<HashSet<Uuid>> {
        let pending: Vec<ProposedAction> = actions
            .iter()
            .filter(|a| a.requires_approval)
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(HashSet::new());
        }

        let request = ApprovalRequest::new(pending);
        let token = request.token;
        let requested = request.action_ids();
        self.audit(
            EventKind::ApprovalRequested,
            json!({
                "token": token.to_string(),
                "actions": request.actions.iter().map(|a| json!({
                    "actionId": a.id().to_string(),
                    "tool": a.tool(),
                    "title": a.title,
                })).collect::<Vec<_>>(),
            }),
        )
        .await?;

        info!(token = %token, actions = requested.len(), "Awaiting approval");
        let decision = self.approval.request_approval(request).await?;
        let approved: HashSet<Uuid> = decision
            .approved_ids()
            .intersection(&requested)
            .copied()
            .collect();

        let mut approved_ids: Vec<String> = approved.iter().map(Uuid::to_string).collect();
        approved_ids.sort();
        self.audit(
            EventKind::ApprovalReplied,
            json!({
                "token": token.to_string(),
                "cancelled": decision.is_cancelled(),
                "approved": approved_ids,
            }),
        )
        .await?;

        Ok(approved)
    }
}
