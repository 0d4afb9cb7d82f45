//! Event - Audit record schema
//!
//! One record per line: an RFC 3339 timestamp, an event tag and a payload
//! that has already been through [`crate::redact`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// User message appended to history
    UserMessage,
    /// Planner returned a plan
    PlanReceived,
    /// Policy (or the per-turn cap) denied the turn
    ActionDenied,
    /// Medium-risk actions handed to the approval collaborator
    ApprovalRequested,
    /// Approval collaborator replied
    ApprovalReplied,
    /// A capability handler ran
    ActionExecuted,
    /// Reply delivered to the user
    AssistantMessage,
    /// The turn failed closed on a system fault
    FailClosed,
    /// Workspace root set or cleared
    WorkspaceChanged,
    /// Policy configuration loaded at startup
    PolicyLoaded,
}

impl EventKind {
    /// Returns the string representation of the event kind
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserMessage => "user_message",
            Self::PlanReceived => "plan_received",
            Self::ActionDenied => "action_denied",
            Self::ApprovalRequested => "approval_requested",
            Self::ApprovalReplied => "approval_replied",
            Self::ActionExecuted => "action_executed",
            Self::AssistantMessage => "assistant_message",
            Self::FailClosed => "fail_closed",
            Self::WorkspaceChanged => "workspace_changed",
            Self::PolicyLoaded => "policy_loaded",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_message" => Ok(Self::UserMessage),
            "plan_received" => Ok(Self::PlanReceived),
            "action_denied" => Ok(Self::ActionDenied),
            "approval_requested" => Ok(Self::ApprovalRequested),
            "approval_replied" => Ok(Self::ApprovalReplied),
            "action_executed" => Ok(Self::ActionExecuted),
            "assistant_message" => Ok(Self::AssistantMessage),
            "fail_closed" => Ok(Self::FailClosed),
            "workspace_changed" => Ok(Self::WorkspaceChanged),
            "policy_loaded" => Ok(Self::PolicyLoaded),
            _ => Err(format!("unknown audit event: {s}")),
        }
    }
}

/// One line of the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// Event tag
    pub event: EventKind,
    /// Redacted payload
    pub payload: serde_json::Value,
}

impl AuditRecord {
    /// Create a record stamped now. The payload is stored as given.
    #[must_use]
    pub fn new(event: EventKind, payload: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_round_trip() {
        for kind in [
            EventKind::UserMessage,
            EventKind::ActionDenied,
            EventKind::FailClosed,
            EventKind::PolicyLoaded,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("tool_call".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_record_serializes_tag() {
        let record = AuditRecord::new(EventKind::ApprovalReplied, serde_json::json!({"n": 0}));
        let line = serde_json::to_string(&record).unwrap();
        assert!(line.contains("\"event\":\"approval_replied\""));
        assert!(line.contains("\"timestamp\":\""));
    }
}
