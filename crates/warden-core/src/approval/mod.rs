//! Approval - Human sign-off for Medium-risk actions
//!
//! The orchestrator hands a pending-approval request to an
//! [`ApprovalHandler`] and suspends until it answers. There is no timeout:
//! the user acts or cancels, and cancellation means zero approved.

use std::sync::Arc;

pub mod manager;
pub mod traits;
pub mod types;

pub use manager::ApprovalManager;
pub use traits::ApprovalHandler;
pub use types::{ApprovalDecision, ApprovalError, ApprovalRequest};

/// Shared approval manager type
pub type SharedApprovalManager = Arc<ApprovalManager>;
