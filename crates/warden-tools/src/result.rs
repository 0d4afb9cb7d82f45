//! Result - The one structured value every handler returns

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_policy::ToolCall;

/// Result of one executed (or refused) tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Identity of the call this answers
    pub call_id: Uuid,
    /// Tool name
    pub name: String,
    /// Structured output
    pub output: serde_json::Value,
    /// Whether the call failed or was refused
    pub is_error: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl ToolResult {
    /// Create a successful result
    #[must_use]
    pub fn success(call: &ToolCall, output: serde_json::Value, duration_ms: u64) -> Self {
        Self {
            call_id: call.id,
            name: call.name.clone(),
            output,
            is_error: false,
            error: None,
            duration_ms,
        }
    }

    /// Create a failed result that still carries output
    #[must_use]
    pub fn failure(
        call: &ToolCall,
        error: impl Into<String>,
        output: serde_json::Value,
        duration_ms: u64,
    ) -> Self {
        Self {
            call_id: call.id,
            name: call.name.clone(),
            output,
            is_error: true,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Create a policy denial
    #[must_use]
    pub fn denied(call: &ToolCall, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::failure(
            call,
            reason.clone(),
            serde_json::json!({ "denied": true, "reason": reason }),
            0,
        )
    }

    /// Create a request-level validation error
    #[must_use]
    pub fn invalid(call: &ToolCall, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::failure(
            call,
            reason.clone(),
            serde_json::json!({ "validationError": true, "reason": reason }),
            0,
        )
    }

    /// Whether this result is a policy denial
    #[must_use]
    pub fn is_denied(&self) -> bool {
        self.output
            .get("denied")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
