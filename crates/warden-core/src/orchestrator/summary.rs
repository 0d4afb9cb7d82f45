//! Reply text for executed actions

use crate::model::ProposedAction;
use warden_policy::{TOOL_COMMAND_EXEC, TOOL_FILE_READ, TOOL_FILE_SEARCH};
use warden_tools::ToolResult;

/// Longest stdout or file excerpt quoted back in a reply
const MAX_QUOTED_CHARS: usize = 4000;

/// Summarize executed actions.
///
/// The first line is either a success count or the failure count with the
/// first error; a line per action follows.
pub(crate) fn summarize(actions: &[ProposedAction], results: &[ToolResult]) -> String {
    let failures: Vec<&ToolResult> = results.iter().filter(|r| r.is_error).collect();

    let mut reply = match failures.first() {
        None => format!("Completed {} action(s) successfully.", results.len()),
        Some(first) => format!(
            "Executed {} action(s); {} failed. First error: {}",
            results.len(),
            failures.len(),
            first.error.as_deref().unwrap_or("unknown error")
        ),
    };

    for (action, result) in actions.iter().zip(results) {
        reply.push_str("\n- ");
        reply.push_str(&action.title);
        reply.push_str(": ");
        reply.push_str(&describe(result));
    }
    reply
}

fn describe(result: &ToolResult) -> String {
    if result.is_error {
        let mut line = format!(
            "failed: {}",
            result.error.as_deref().unwrap_or("unknown error")
        );
        if result.name == TOOL_COMMAND_EXEC {
            if let Some(stderr) = non_empty_str(&result.output, "stderr") {
                line.push('\n');
                line.push_str(&quote(stderr));
            }
        }
        return line;
    }

    let output = &result.output;
    match result.name.as_str() {
        TOOL_FILE_SEARCH => {
            let count = output.get("count").and_then(|v| v.as_u64()).unwrap_or(0);
            let mut line = format!("found {} file(s)", count);
            if output.get("truncated").and_then(|v| v.as_bool()) == Some(true) {
                line.push_str(" (more results not shown)");
            }
            if let Some(items) = output.get("results").and_then(|v| v.as_array()) {
                for item in items {
                    if let Some(path) = item.get("path").and_then(|v| v.as_str()) {
                        line.push_str("\n    ");
                        line.push_str(path);
                    }
                }
            }
            line
        }
        TOOL_FILE_READ => {
            let read = output.get("bytesRead").and_then(|v| v.as_u64()).unwrap_or(0);
            let size = output.get("size").and_then(|v| v.as_u64()).unwrap_or(0);
            let mut line = format!("read {} of {} byte(s)", read, size);
            if output.get("truncated").and_then(|v| v.as_bool()) == Some(true) {
                line.push_str(", truncated");
            }
            if output.get("isBinary").and_then(|v| v.as_bool()) == Some(true) {
                line.push_str(", binary content (base64)");
            } else if let Some(content) = non_empty_str(output, "content") {
                line.push('\n');
                line.push_str(&quote(content));
            }
            line
        }
        TOOL_COMMAND_EXEC => {
            let code = output.get("exitCode").and_then(|v| v.as_i64()).unwrap_or(0);
            let mut line = format!("exit code {}", code);
            if output.get("stdoutTruncated").and_then(|v| v.as_bool()) == Some(true) {
                line.push_str(", output truncated");
            }
            if let Some(stdout) = non_empty_str(output, "stdout") {
                line.push('\n');
                line.push_str(&quote(stdout));
            }
            line
        }
        _ => "done".to_string(),
    }
}

fn non_empty_str<'a>(output: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    output
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
}

fn quote(text: &str) -> String {
    let mut excerpt: String = text.chars().take(MAX_QUOTED_CHARS).collect();
    if excerpt.len() < text.len() {
        excerpt.push_str("\n…");
    }
    let body = excerpt.trim_end();
    format!("```\n{}\n```", body)
}
