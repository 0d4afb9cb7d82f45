use super::*;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use warden_policy::{PolicyConfig, PolicyEngine, WorkspaceRoot};

fn handler(root: &Path) -> FileReadHandler {
    let config = PolicyConfig {
        allowed_tools: vec![TOOL_FILE_READ.to_string()],
        max_actions_per_turn: 5,
        ..PolicyConfig::deny_all()
    };
    FileReadHandler::new(HandlerContext::new(
        Arc::new(PolicyEngine::new(config)),
        Arc::new(WorkspaceRoot::fixed(root).unwrap()),
    ))
}

fn read_call(args: serde_json::Value) -> ToolCall {
    ToolCall::new(TOOL_FILE_READ, args)
}

#[tokio::test]
async fn test_reads_small_text_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("README.md"), "# Hello\n").unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "README.md"})))
        .await;

    assert!(!result.is_error, "{:?}", result.error);
    assert_eq!(result.output["content"], "# Hello\n");
    assert_eq!(result.output["truncated"], false);
    assert_eq!(result.output["isBinary"], false);
    assert_eq!(result.output["size"], 8);
}

#[tokio::test]
async fn test_truncates_at_requested_cap() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("big.txt"), "a".repeat(5000)).unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "big.txt", "maxBytes": 1000})))
        .await;

    assert!(!result.is_error);
    assert_eq!(result.output["truncated"], true);
    assert_eq!(result.output["bytesRead"], 1000);
    assert_eq!(result.output["content"].as_str().unwrap().len(), 1000);
}

#[tokio::test]
async fn test_default_cap_applies() {
    let dir = tempfile::tempdir().unwrap();
    let size = DEFAULT_READ_BYTES as usize + 10;
    fs::write(dir.path().join("big.txt"), "b".repeat(size)).unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "big.txt"})))
        .await;

    assert_eq!(result.output["truncated"], true);
    assert_eq!(result.output["bytesRead"], DEFAULT_READ_BYTES);
}

#[tokio::test]
async fn test_hard_cap_wins_over_request() {
    let dir = tempfile::tempdir().unwrap();
    let size = HARD_READ_CAP as usize + 1;
    fs::write(dir.path().join("huge.txt"), "c".repeat(size)).unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "huge.txt", "maxBytes": 10_000_000})))
        .await;

    assert_eq!(result.output["truncated"], true);
    assert_eq!(result.output["bytesRead"], HARD_READ_CAP);
}

#[tokio::test]
async fn test_exact_cap_not_truncated() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("exact.txt"), "d".repeat(100)).unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "exact.txt", "maxBytes": 100})))
        .await;
    assert_eq!(result.output["truncated"], false);
}

#[tokio::test]
async fn test_binary_detected_by_nul() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("blob.bin"), [0x41u8, 0x00, 0x42]).unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "blob.bin"})))
        .await;

    assert_eq!(result.output["isBinary"], true);
    assert_eq!(result.output["encoding"], "base64");
    assert_eq!(result.output["content"], BASE64.encode([0x41u8, 0x00, 0x42]));
}

#[tokio::test]
async fn test_binary_detected_by_invalid_utf8() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("latin1.txt"), [0x63u8, 0x61, 0x66, 0xe9]).unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "latin1.txt"})))
        .await;
    assert_eq!(result.output["isBinary"], true);
}

#[tokio::test]
async fn test_missing_file_and_directory_rejected() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("docs")).unwrap();
    let handler = handler(dir.path());

    let missing = handler.handle(&read_call(json!({"path": "nope.txt"}))).await;
    assert!(missing.is_error);
    assert!(!missing.is_denied());
    assert!(missing.error.unwrap().contains("does not exist"));

    let directory = handler.handle(&read_call(json!({"path": "docs"}))).await;
    assert!(directory.is_error);
    assert!(directory.error.unwrap().contains("directory"));
}

#[tokio::test]
async fn test_escape_denied() {
    let dir = tempfile::tempdir().unwrap();
    let ws = dir.path().join("ws");
    fs::create_dir(&ws).unwrap();
    fs::write(dir.path().join("secret.txt"), "s").unwrap();

    let result = handler(&ws)
        .handle(&read_call(json!({"path": "../secret.txt"})))
        .await;
    assert!(result.is_denied());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlink_escape_denied() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "s").unwrap();
    std::os::unix::fs::symlink(outside.path().join("secret.txt"), dir.path().join("link.txt"))
        .unwrap();

    let result = handler(dir.path())
        .handle(&read_call(json!({"path": "link.txt"})))
        .await;
    assert!(result.is_denied());
}

#[cfg(unix)]
#[tokio::test]
async fn test_parent_past_missing_dir_cannot_reach_symlink() {
    let dir = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    fs::write(outside.path().join("secret.txt"), "TOP SECRET").unwrap();
    std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
    let handler = handler(dir.path());

    for path in ["link/secret.txt", "nope/../link/secret.txt"] {
        let result = handler.handle(&read_call(json!({ "path": path }))).await;
        assert!(result.is_denied(), "{} should be denied", path);
        assert!(result.output.get("content").is_none());
    }
}

#[tokio::test]
async fn test_invalid_max_bytes() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let handler = handler(dir.path());

    for bad in [json!(0), json!(-5), json!("ten"), json!(1.5)] {
        let result = handler
            .handle(&read_call(json!({"path": "a.txt", "maxBytes": bad})))
            .await;
        assert!(result.is_error);
        assert_eq!(result.output["validationError"], true);
    }
}

#[tokio::test]
async fn test_denied_when_tool_not_allowed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "a").unwrap();
    let handler = FileReadHandler::new(HandlerContext::new(
        Arc::new(PolicyEngine::deny_all()),
        Arc::new(WorkspaceRoot::fixed(dir.path()).unwrap()),
    ));

    let result = handler.handle(&read_call(json!({"path": "a.txt"}))).await;
    assert!(result.is_denied());
}
