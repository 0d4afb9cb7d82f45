use super::types::{ApprovalDecision, ApprovalRequest};

/// The approval collaborator
#[async_trait::async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Present `request` and wait for the user's answer
    async fn request_approval(&self, request: ApprovalRequest) -> crate::Result<ApprovalDecision>;
}
