use super::{elapsed_ms, positive_int_arg};
use crate::registry::{CapabilityHandler, HandlerContext};
use crate::result::ToolResult;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::path::Path;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::debug;
use warden_policy::{resolve_candidate, resolve_within, ToolCall, TOOL_FILE_READ};

/// Bytes read when the call does not ask for a length (50 KiB)
pub const DEFAULT_READ_BYTES: u64 = 50 * 1024;

/// Upper bound on any single read (200 KiB)
pub const HARD_READ_CAP: u64 = 200 * 1024;

/// Bounded read of one file inside the workspace
pub struct FileReadHandler {
    context: HandlerContext,
}

impl FileReadHandler {
    /// Create a new file read handler
    #[must_use]
    pub fn new(context: HandlerContext) -> Self {
        Self { context }
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for FileReadHandler {
    fn name(&self) -> &str {
        TOOL_FILE_READ
    }

    async fn handle(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();

        let root = match self.context.authorize(call) {
            Ok((root, _)) => root,
            Err(denied) => return denied,
        };
        let Some(path) = call.str_arg("path") else {
            return ToolResult::invalid(call, "'path' must be a string");
        };
        let requested = match positive_int_arg(call, "maxBytes") {
            Ok(requested) => requested,
            Err(e) => return ToolResult::invalid(call, e.to_string()),
        };
        let cap = requested.unwrap_or(DEFAULT_READ_BYTES).min(HARD_READ_CAP);

        let candidate = resolve_candidate(&root, path);
        let Some(resolved) = resolve_within(&root, &candidate) else {
            return ToolResult::denied(
                call,
                format!("Path '{}' is outside the workspace root", path),
            );
        };

        let metadata = match tokio::fs::metadata(&resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ToolResult::failure(
                    call,
                    format!("File '{}' does not exist", path),
                    serde_json::Value::Null,
                    elapsed_ms(start),
                );
            }
            Err(e) => {
                return ToolResult::failure(
                    call,
                    format!("Cannot stat '{}': {}", path, e),
                    serde_json::Value::Null,
                    elapsed_ms(start),
                );
            }
        };
        if metadata.is_dir() {
            return ToolResult::failure(
                call,
                format!("'{}' is a directory", path),
                serde_json::Value::Null,
                elapsed_ms(start),
            );
        }

        debug!(path = %resolved.display(), cap, size = metadata.len(), "Reading file");

        let contents = match read_capped(&resolved, cap).await {
            Ok(contents) => contents,
            Err(e) => {
                return ToolResult::failure(
                    call,
                    format!("Cannot read '{}': {}", path, e),
                    serde_json::Value::Null,
                    elapsed_ms(start),
                );
            }
        };

        let truncated = metadata.len() > cap;
        let text = if contents.contains(&0) {
            None
        } else {
            std::str::from_utf8(&contents).ok()
        };
        let (is_binary, encoding, content) = match text {
            Some(text) => (false, "utf-8", text.to_string()),
            None => (true, "base64", BASE64.encode(&contents)),
        };

        ToolResult::success(
            call,
            serde_json::json!({
                "path": resolved.display().to_string(),
                "size": metadata.len(),
                "bytesRead": contents.len(),
                "truncated": truncated,
                "isBinary": is_binary,
                "encoding": encoding,
                "content": content,
            }),
            elapsed_ms(start),
        )
    }
}

async fn read_capped(path: &Path, cap: u64) -> std::io::Result<Vec<u8>> {
    let file = tokio::fs::File::open(path).await?;
    let mut contents = Vec::new();
    file.take(cap).read_to_end(&mut contents).await?;
    Ok(contents)
}

#[cfg(test)]
mod tests;
