use crate::model::ProposedAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

/// Approval bookkeeping errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApprovalError {
    /// No pending request with that token
    #[error("approval request not found")]
    NotFound,
}

/// A set of Medium-risk actions awaiting sign-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Pending-approval token
    pub token: Uuid,
    /// Exactly the actions that need approval
    pub actions: Vec<ProposedAction>,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl ApprovalRequest {
    /// Create a request with a fresh token
    #[must_use]
    pub fn new(actions: Vec<ProposedAction>) -> Self {
        Self {
            token: Uuid::new_v4(),
            actions,
            created_at: Utc::now(),
        }
    }

    /// Identities of the actions in this request
    #[must_use]
    pub fn action_ids(&self) -> HashSet<Uuid> {
        self.actions.iter().map(ProposedAction::id).collect()
    }
}

/// The user's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// These action ids were approved (possibly none)
    Approved(HashSet<Uuid>),
    /// The user cancelled; nothing is approved
    Cancelled,
}

impl ApprovalDecision {
    /// Approved ids (empty for a cancellation)
    #[must_use]
    pub fn approved_ids(&self) -> HashSet<Uuid> {
        match self {
            Self::Approved(ids) => ids.clone(),
            Self::Cancelled => HashSet::new(),
        }
    }

    /// Whether the user cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
