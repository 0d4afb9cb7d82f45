//! Warden Policy - Deterministic gatekeeping for planner proposals
//!
//! This crate holds the pieces every other Warden crate consults before
//! touching the real system:
//! - Model: tool calls and risk levels shared across crates
//! - Config: the policy document and its deny-by-default fallback
//! - Containment: the one canonical "is this path inside the root" check
//! - Workspace: the persisted, revalidated workspace root
//! - Engine: the pure evaluator that allows or denies a tool call

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod containment;
pub mod engine;
pub mod error;
pub mod model;
pub mod workspace;

pub use config::PolicyConfig;
pub use containment::{is_contained, resolve_candidate, resolve_path, resolve_within};
pub use engine::{PolicyDecision, PolicyEngine, SharedPolicyEngine};
pub use error::{Error, Result};
pub use model::{RiskLevel, ToolCall, TOOL_COMMAND_EXEC, TOOL_FILE_READ, TOOL_FILE_SEARCH};
pub use workspace::{default_state_file, WorkspaceRoot};
