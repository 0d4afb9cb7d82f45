//! Terminal approval presenter
//!
//! Receives pending approval requests from the manager, asks with a
//! multi-select, and resolves or cancels the request.

use inquire::{InquireError, MultiSelect};
use std::fmt;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;
use warden_core::{ApprovalRequest, ProposedAction, SharedApprovalManager};

/// One selectable action
struct Choice {
    id: Uuid,
    label: String,
}

impl Choice {
    fn new(action: &ProposedAction) -> Self {
        let mut label = format!("[{}] {}", action.risk, action.title);
        if !action.justification.is_empty() {
            label.push_str(&format!(" ({})", action.justification));
        }
        Self {
            id: action.id(),
            label,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Spawn the presenter task
pub fn spawn(
    manager: SharedApprovalManager,
    mut requests: UnboundedReceiver<ApprovalRequest>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(request) = requests.recv().await {
            let token = request.token;
            let choices: Vec<Choice> = request.actions.iter().map(Choice::new).collect();

            let answer = tokio::task::spawn_blocking(move || {
                MultiSelect::new("Approve these actions? (space to select, enter to confirm)", choices)
                    .with_help_message("Unselected actions are skipped. Esc cancels all.")
                    .prompt()
            })
            .await;

            let outcome = match answer {
                Ok(Ok(selected)) => {
                    debug!(token = %token, approved = selected.len(), "Approval answered");
                    manager
                        .resolve(token, selected.into_iter().map(|c| c.id))
                        .await
                }
                Ok(Err(InquireError::OperationCanceled | InquireError::OperationInterrupted)) => {
                    manager.cancel(token).await
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "Approval prompt failed; cancelling");
                    manager.cancel(token).await
                }
                Err(e) => {
                    warn!(error = %e, "Approval prompt task failed; cancelling");
                    manager.cancel(token).await
                }
            };

            if let Err(e) = outcome {
                warn!(token = %token, error = %e, "Approval request was no longer pending");
            }
        }
    })
}
