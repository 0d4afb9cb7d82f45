use super::{elapsed_ms, positive_int_arg};
use crate::error::{Error, Result};
use crate::registry::{CapabilityHandler, HandlerContext};
use crate::result::ToolResult;
use crate::sandbox::{ExecRequest, SandboxedExecutor};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;
use warden_policy::{ToolCall, TOOL_COMMAND_EXEC};

/// Ceiling for a per-call `timeoutSeconds` override
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// Runs one allowlisted binary through the sandboxed executor
pub struct CommandExecHandler {
    context: HandlerContext,
    executor: SandboxedExecutor,
}

impl CommandExecHandler {
    /// Create a new command handler
    #[must_use]
    pub fn new(context: HandlerContext) -> Self {
        Self {
            context,
            executor: SandboxedExecutor::new(),
        }
    }

    fn build_request(&self, call: &ToolCall, root: PathBuf) -> Result<ExecRequest> {
        let config = self.context.policy.config();

        let executable = call.str_arg("executablePath").ok_or_else(|| {
            Error::InvalidInput("'executablePath' must be a string".to_string())
        })?;
        let raw_args = call
            .arg("args")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                Error::InvalidInput("'args' must be an array of strings".to_string())
            })?;
        let args = raw_args
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                arg.as_str().map(str::to_string).ok_or_else(|| {
                    Error::InvalidInput(format!("argument {} is not a string", index))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let timeout_secs = positive_int_arg(call, "timeoutSeconds")?
            .unwrap_or(config.default_timeout_seconds)
            .min(MAX_TIMEOUT_SECS);

        Ok(ExecRequest {
            executable: PathBuf::from(executable),
            args,
            working_dir: root,
            timeout: Duration::from_secs(timeout_secs),
            max_stdout_bytes: config.max_stdout_bytes,
            max_stderr_bytes: config.max_stderr_bytes,
        })
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for CommandExecHandler {
    fn name(&self) -> &str {
        TOOL_COMMAND_EXEC
    }

    async fn handle(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();

        let root = match self.context.authorize(call) {
            Ok((root, _)) => root,
            Err(denied) => return denied,
        };
        let request = match self.build_request(call, root) {
            Ok(request) => request,
            Err(e) => return ToolResult::invalid(call, e.to_string()),
        };

        info!(
            executable = %request.executable.display(),
            args = request.args.len(),
            timeout_secs = request.timeout.as_secs(),
            "Executing command"
        );

        let output = match self.executor.run(&request).await {
            Ok(output) => output,
            Err(e) => return ToolResult::invalid(call, e.to_string()),
        };

        let error = if output.did_timeout {
            Some(format!(
                "Command timed out after {}s",
                request.timeout.as_secs()
            ))
        } else if output.exit_code != 0 {
            let detail = output.stderr.lines().next().unwrap_or_default();
            Some(if detail.is_empty() {
                format!("Command exited with code {}", output.exit_code)
            } else {
                format!("Command exited with code {}: {}", output.exit_code, detail)
            })
        } else {
            None
        };

        let value = match serde_json::to_value(&output) {
            Ok(value) => value,
            Err(e) => {
                return ToolResult::failure(
                    call,
                    e.to_string(),
                    serde_json::Value::Null,
                    elapsed_ms(start),
                );
            }
        };
        match error {
            Some(error) => ToolResult::failure(call, error, value, elapsed_ms(start)),
            None => ToolResult::success(call, value, elapsed_ms(start)),
        }
    }
}

#[cfg(test)]
mod tests;
