use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::traits::ApprovalHandler;
use super::types::{ApprovalDecision, ApprovalError, ApprovalRequest};
use crate::error::{Error, Result};

struct Pending {
    request: ApprovalRequest,
    resolver: oneshot::Sender<ApprovalDecision>,
}

/// Channel-based approval manager
///
/// Each request is published on an mpsc channel for the presentation layer
/// and parked behind a oneshot resolver. `resolve`/`cancel` complete it; if
/// the resolver is dropped the turn sees a cancellation.
pub struct ApprovalManager {
    pending: RwLock<HashMap<Uuid, Pending>>,
    notifier: mpsc::UnboundedSender<ApprovalRequest>,
}

impl ApprovalManager {
    /// Create a manager and the receiver the presentation layer listens on
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ApprovalRequest>) {
        let (notifier, receiver) = mpsc::unbounded_channel();
        (
            Self {
                pending: RwLock::new(HashMap::new()),
                notifier,
            },
            receiver,
        )
    }

    /// Requests still waiting for an answer
    pub async fn pending(&self) -> Vec<ApprovalRequest> {
        let pending = self.pending.read().await;
        pending.values().map(|p| p.request.clone()).collect()
    }

    /// Approve the given action ids of the request `token`.
    ///
    /// Ids that are not part of the request are ignored.
    pub async fn resolve(
        &self,
        token: Uuid,
        approved: impl IntoIterator<Item = Uuid>,
    ) -> std::result::Result<(), ApprovalError> {
        let pending = self
            .pending
            .write()
            .await
            .remove(&token)
            .ok_or(ApprovalError::NotFound)?;

        let allowed = pending.request.action_ids();
        let approved = approved
            .into_iter()
            .filter(|id| allowed.contains(id))
            .collect();
        if pending.resolver.send(ApprovalDecision::Approved(approved)).is_err() {
            debug!(token = %token, "Approval waiter already gone");
        }
        Ok(())
    }

    /// Cancel the request `token` (equivalent to approving nothing)
    pub async fn cancel(&self, token: Uuid) -> std::result::Result<(), ApprovalError> {
        let pending = self
            .pending
            .write()
            .await
            .remove(&token)
            .ok_or(ApprovalError::NotFound)?;
        if pending.resolver.send(ApprovalDecision::Cancelled).is_err() {
            debug!(token = %token, "Approval waiter already gone");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ApprovalHandler for ApprovalManager {
    async fn request_approval(&self, request: ApprovalRequest) -> Result<ApprovalDecision> {
        let token = request.token;
        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(
            token,
            Pending {
                request: request.clone(),
                resolver: tx,
            },
        );

        if self.notifier.send(request).is_err() {
            self.pending.write().await.remove(&token);
            warn!(token = %token, "No approval presenter is listening");
            return Err(Error::Approval(
                "no approval presenter is listening".to_string(),
            ));
        }
        info!(token = %token, "Waiting for approval");

        match rx.await {
            Ok(decision) => Ok(decision),
            Err(_) => {
                warn!(token = %token, "Approval resolver dropped, treating as cancelled");
                Ok(ApprovalDecision::Cancelled)
            }
        }
    }
}
