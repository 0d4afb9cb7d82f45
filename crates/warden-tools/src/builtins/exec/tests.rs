use super::*;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use warden_policy::{PolicyConfig, PolicyEngine, WorkspaceRoot};

fn config() -> PolicyConfig {
    PolicyConfig {
        allowed_tools: vec![TOOL_COMMAND_EXEC.to_string()],
        allowed_executables: vec![
            "/bin/echo".to_string(),
            "/bin/sleep".to_string(),
            "/bin/ls".to_string(),
            "/bin/cat".to_string(),
        ],
        max_actions_per_turn: 5,
        default_timeout_seconds: 5,
        ..PolicyConfig::deny_all()
    }
}

fn handler_with(config: PolicyConfig, root: &Path) -> CommandExecHandler {
    CommandExecHandler::new(HandlerContext::new(
        Arc::new(PolicyEngine::new(config)),
        Arc::new(WorkspaceRoot::fixed(root).unwrap()),
    ))
}

fn exec_call(args: serde_json::Value) -> ToolCall {
    ToolCall::new(TOOL_COMMAND_EXEC, args)
}

#[cfg(unix)]
#[tokio::test]
async fn test_runs_allowlisted_binary() {
    let dir = tempfile::tempdir().unwrap();
    let result = handler_with(config(), dir.path())
        .handle(&exec_call(
            json!({"executablePath": "/bin/echo", "args": ["hi"]}),
        ))
        .await;

    assert!(!result.is_error, "{:?}", result.error);
    assert_eq!(result.output["exitCode"], 0);
    assert_eq!(result.output["stdout"], "hi\n");
    assert_eq!(result.output["stdoutTruncated"], false);
    assert_eq!(result.output["stderrTruncated"], false);
    assert_eq!(result.output["didTimeout"], false);
}

#[cfg(unix)]
#[tokio::test]
async fn test_runs_in_workspace_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "m").unwrap();

    let result = handler_with(config(), dir.path())
        .handle(&exec_call(json!({"executablePath": "/bin/ls", "args": []})))
        .await;
    assert!(result.output["stdout"]
        .as_str()
        .unwrap()
        .contains("marker.txt"));
}

#[tokio::test]
async fn test_blocked_token_denied_without_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let result = handler_with(config(), dir.path())
        .handle(&exec_call(
            json!({"executablePath": "/bin/echo", "args": ["a;b"]}),
        ))
        .await;
    assert!(result.is_denied());
    assert!(result.output.get("exitCode").is_none());
}

#[tokio::test]
async fn test_not_allowlisted_denied() {
    let dir = tempfile::tempdir().unwrap();
    let result = handler_with(config(), dir.path())
        .handle(&exec_call(
            json!({"executablePath": "/usr/bin/curl", "args": []}),
        ))
        .await;
    assert!(result.is_denied());
}

#[tokio::test]
async fn test_invalid_timeout_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = handler_with(config(), dir.path())
        .handle(&exec_call(json!({
            "executablePath": "/bin/echo",
            "args": [],
            "timeoutSeconds": "soon"
        })))
        .await;
    assert!(result.is_error);
    assert!(!result.is_denied());
    assert_eq!(result.output["validationError"], true);
}

#[test]
fn test_timeout_override_clamped() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_with(config(), dir.path());
    let call = exec_call(json!({
        "executablePath": "/bin/echo",
        "args": [],
        "timeoutSeconds": 100_000
    }));
    let request = handler
        .build_request(&call, dir.path().to_path_buf())
        .unwrap();
    assert_eq!(request.timeout, Duration::from_secs(MAX_TIMEOUT_SECS));

    let default = handler
        .build_request(
            &exec_call(json!({"executablePath": "/bin/echo", "args": []})),
            dir.path().to_path_buf(),
        )
        .unwrap();
    assert_eq!(default.timeout, Duration::from_secs(5));
}

#[test]
fn test_non_string_arg_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let handler = handler_with(config(), dir.path());
    let call = exec_call(json!({"executablePath": "/bin/echo", "args": ["ok", 3]}));
    let err = handler
        .build_request(&call, dir.path().to_path_buf())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_timeout_flagged_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = handler_with(config(), dir.path())
        .handle(&exec_call(json!({
            "executablePath": "/bin/sleep",
            "args": ["30"],
            "timeoutSeconds": 1
        })))
        .await;

    assert!(result.is_error);
    assert_eq!(result.output["didTimeout"], true);
    assert_ne!(result.output["exitCode"], 0);
    assert!(result.error.unwrap().contains("timed out"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_output_cap_from_policy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("big.txt"), "z".repeat(10_000)).unwrap();
    let config = PolicyConfig {
        max_stdout_bytes: 100,
        ..config()
    };

    let result = handler_with(config, dir.path())
        .handle(&exec_call(
            json!({"executablePath": "/bin/cat", "args": ["big.txt"]}),
        ))
        .await;
    assert!(!result.is_error);
    assert_eq!(result.output["stdoutTruncated"], true);
    assert_eq!(result.output["stdout"].as_str().unwrap().len(), 100);
}

#[cfg(unix)]
#[tokio::test]
async fn test_non_zero_exit_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = handler_with(config(), dir.path())
        .handle(&exec_call(
            json!({"executablePath": "/bin/ls", "args": ["no-such-entry"]}),
        ))
        .await;
    assert!(result.is_error);
    assert!(!result.is_denied());
    assert!(result.error.unwrap().contains("exited with code"));
}
