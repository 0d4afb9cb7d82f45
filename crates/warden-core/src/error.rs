//! Error types for warden-core
//!
//! Denials and validation failures inside a turn are normally resolved into
//! replies and [`warden_tools::ToolResult`]s; these variants are for the
//! conditions that end a turn or never reach one. Byte and time caps are not
//! errors at all: they surface as truncation and timeout flags.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Policy refused the request
    #[error("policy denial: {0}")]
    PolicyDenial(String),

    /// Malformed arguments or plan contents
    #[error("validation error: {0}")]
    Validation(String),

    /// A process failed to spawn or exited non-zero
    #[error("execution error: {0}")]
    Execution(String),

    /// Workspace missing, log unwritable, configuration unreadable
    #[error("system fault: {0}")]
    SystemFault(String),

    /// The planner failed or returned something outside the plan contract
    #[error("planning error: {0}")]
    Planning(String),

    /// The approval collaborator failed
    #[error("approval error: {0}")]
    Approval(String),

    /// Policy crate error
    #[error("policy error: {0}")]
    Policy(#[from] warden_policy::Error),

    /// Tool crate error
    #[error("tool error: {0}")]
    Tool(#[from] warden_tools::Error),

    /// Audit log error
    #[error("audit error: {0}")]
    Audit(#[from] warden_audit::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error must end the turn closed (logged as `fail_closed`)
    #[must_use]
    pub fn is_system_fault(&self) -> bool {
        matches!(
            self,
            Error::SystemFault(_) | Error::Audit(_) | Error::Policy(_)
        )
    }
}

/// Trait for user-friendly error messages
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::PolicyDenial(reason) => format!("🛑 Request denied: {}", reason),
            Error::Validation(msg) => format!("⚠️ Invalid request: {}", msg),
            Error::Execution(msg) => format!("⚡ Execution failed: {}", msg),
            Error::SystemFault(_) | Error::Audit(_) | Error::Policy(_) => {
                "❌ The request was stopped because the system is not in a safe state.".to_string()
            }
            Error::Planning(msg) => format!("📋 Planning failed: {}", msg),
            Error::Approval(msg) => format!("✋ Approval failed: {}", msg),
            Error::Tool(e) => format!("🔧 Tool error: {}", e),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            Error::PolicyDenial(_) => Some(
                "💡 Try a narrower request, such as reading or searching inside the workspace."
                    .to_string(),
            ),
            Error::Validation(_) => {
                Some("💡 Check the file paths and arguments and try again.".to_string())
            }
            Error::SystemFault(_) | Error::Audit(_) | Error::Policy(_) => Some(
                "💡 Check that the workspace root exists and the audit log is writable.".to_string(),
            ),
            Error::Planning(_) => {
                Some("💡 Try rephrasing the request in a single, concrete step.".to_string())
            }
            _ => None,
        }
    }
}

/// Format an error for display in the CLI
pub fn format_error_for_cli(error: &Error) -> String {
    let mut output = error.user_message();
    output.push('\n');

    if let Some(suggestion) = error.suggestion() {
        output.push_str(&suggestion);
        output.push('\n');
    }

    output
}
