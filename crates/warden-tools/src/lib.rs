//! Warden Tools - Bounded capabilities behind the policy engine
//!
//! This crate provides the only code that touches the real system:
//! - Registry: the handler trait, its context, and dispatch by tool name
//! - Builtins: `file_search`, `file_read` and `command_exec`
//! - Sandbox: the one-process-per-call executor behind `command_exec`
//! - Result: the structured value every handler returns

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builtins;
pub mod error;
pub mod registry;
pub mod result;
pub mod sandbox;

pub use builtins::{CommandExecHandler, FileReadHandler, FileSearchHandler};
pub use error::{Error, Result};
pub use registry::{CapabilityHandler, HandlerContext, HandlerRegistry};
pub use result::ToolResult;
pub use sandbox::{ExecOutput, ExecRequest, SandboxedExecutor};
