//! Orchestrator helpers
//!
//! Audit, history and reply plumbing shared by every turn exit.

use crate::error::{Error, Result, UserFriendlyError};
use crate::model::{ChatMessage, ProposedAction};
use serde_json::json;
use tracing::{debug, error};
use warden_audit::EventKind;
use warden_tools::ToolResult;

use super::core::Orchestrator;
use super::types::{TurnOutcome, TurnStatus};

impl Orchestrator {
    /// Append an audit event; failure is a system fault
    pub(crate) async fn audit(&self, event: EventKind, payload: serde_json::Value) -> Result<()> {
        debug!(event = %event, "Audit event");
        self.audit.append(event, payload).await?;
        Ok(())
    }

    /// Append to history, dropping the oldest messages past the limit
    pub(crate) async fn push_history(&self, message: ChatMessage) {
        let mut history = self.history.lock().await;
        history.push(message);
        let limit = self.config.history_limit.max(1);
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
    }

    /// Audit the reply, then deliver it
    pub(crate) async fn finish(
        &self,
        reply: String,
        status: TurnStatus,
        results: Vec<ToolResult>,
    ) -> Result<TurnOutcome> {
        self.audit(
            EventKind::AssistantMessage,
            json!({ "status": status.as_str(), "text": reply }),
        )
        .await?;
        self.push_history(ChatMessage::assistant(reply.clone())).await;

        Ok(TurnOutcome {
            reply,
            status,
            results,
        })
    }

    /// Deny the whole turn
    pub(crate) async fn deny_turn(
        &self,
        reason: String,
        action: Option<&ProposedAction>,
    ) -> Result<TurnOutcome> {
        let payload = match action {
            Some(action) => json!({
                "actionId": action.id().to_string(),
                "tool": action.tool(),
                "title": action.title,
                "reason": reason,
            }),
            None => json!({ "reason": reason }),
        };
        self.audit(EventKind::ActionDenied, payload).await?;

        let reply = Error::PolicyDenial(reason).user_message();
        self.finish(reply, TurnStatus::Denied, Vec::new()).await
    }

    /// End the turn closed.
    ///
    /// The `fail_closed` entry is written before the reply is delivered; if
    /// even that cannot be written, the error is returned to the caller.
    pub(crate) async fn fail_closed(&self, err: Error) -> Result<TurnOutcome> {
        error!(error = %err, "Turn failed closed");

        self.audit(
            EventKind::FailClosed,
            json!({ "error": err.to_string(), "systemFault": err.is_system_fault() }),
        )
        .await?;

        let reply = err.user_message();
        self.push_history(ChatMessage::assistant(reply.clone())).await;

        Ok(TurnOutcome {
            reply,
            status: TurnStatus::FailedClosed,
            results: Vec::new(),
        })
    }
}

/// Compact, content-free view of a tool result for the audit log
pub(crate) fn output_digest(result: &ToolResult) -> serde_json::Value {
    const KEYS: &[&str] = &[
        "exitCode",
        "didTimeout",
        "stdoutTruncated",
        "stderrTruncated",
        "path",
        "size",
        "bytesRead",
        "truncated",
        "isBinary",
        "count",
        "denied",
        "validationError",
    ];

    let mut digest = serde_json::Map::new();
    if let Some(output) = result.output.as_object() {
        for key in KEYS {
            if let Some(value) = output.get(*key) {
                digest.insert((*key).to_string(), value.clone());
            }
        }
    }
    serde_json::Value::Object(digest)
}
