use super::*;
use tokio::sync::Mutex;
use warden_policy::{RiskLevel, TOOL_FILE_READ};

/// Completion client returning a canned reply and recording what it saw
struct FakeClient {
    reply: Result<String>,
    seen: Mutex<Vec<CompletionMessage>>,
}

impl FakeClient {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for FakeClient {
    async fn complete(&self, messages: &[CompletionMessage]) -> Result<String> {
        self.seen.lock().await.extend_from_slice(messages);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(Error::Planning(e.to_string())),
        }
    }

    fn model(&self) -> &str {
        "fake"
    }
}

#[test]
fn test_parse_plain_json() {
    let plan = parse_plan(
        r#"{"summary":"read it","questions":[],"actions":[
            {"title":"Read README","justification":"asked","tool":"file_read","arguments":{"path":"README.md"}}
        ]}"#,
    )
    .unwrap();
    assert_eq!(plan.summary, "read it");
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.actions[0].tool(), TOOL_FILE_READ);
    assert_eq!(plan.actions[0].call.arguments["path"], "README.md");
}

#[test]
fn test_parse_fenced_json() {
    let text = "```json\n{\"summary\":\"ask\",\"questions\":[\"Which file?\"]}\n```";
    let plan = parse_plan(text).unwrap();
    assert_eq!(plan.questions, vec!["Which file?".to_string()]);
    assert!(plan.actions.is_empty());
}

#[test]
fn test_model_risk_is_ignored() {
    let plan = parse_plan(
        r#"{"summary":"","actions":[{"title":"x","tool":"command_exec","risk":"low","requiresApproval":false,
            "arguments":{"executablePath":"/bin/ls","args":[]}}]}"#,
    )
    .unwrap();
    assert_eq!(plan.actions[0].risk, RiskLevel::High);
    assert!(!plan.actions[0].requires_approval);
}

#[test]
fn test_prose_is_rejected() {
    assert!(matches!(
        parse_plan("Sure! I'll read the README for you."),
        Err(Error::Planning(_))
    ));
}

#[test]
fn test_missing_tool_is_rejected() {
    assert!(parse_plan(r#"{"summary":"","actions":[{"title":"x","arguments":{}}]}"#).is_err());
    assert!(parse_plan(r#"{"summary":"","actions":[{"tool":" ","arguments":{}}]}"#).is_err());
}

#[test]
fn test_non_object_arguments_rejected() {
    assert!(parse_plan(r#"{"actions":[{"tool":"file_read","arguments":"README.md"}]}"#).is_err());
}

#[test]
fn test_missing_title_falls_back_to_tool() {
    let plan = parse_plan(r#"{"actions":[{"tool":"file_search"}]}"#).unwrap();
    assert_eq!(plan.actions[0].title, "file_search");
    assert!(plan.actions[0].call.arguments.is_object());
}

#[tokio::test]
async fn test_planner_sends_system_prompt_and_history() {
    let client = Arc::new(FakeClient::replying(r#"{"summary":"nothing","actions":[]}"#));
    let planner = LlmPlanner::new(client.clone());
    let history = vec![ChatMessage::user("hello"), ChatMessage::assistant("hi")];

    let plan = planner.plan(&history).await.unwrap();
    assert_eq!(plan.summary, "nothing");

    let seen = client.seen.lock().await;
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].role, "system");
    assert_eq!(seen[0].content, SYSTEM_PROMPT);
    assert_eq!(seen[1].content, "hello");
    assert_eq!(seen[2].role, "assistant");
}

#[tokio::test]
async fn test_planner_rejects_garbage() {
    let planner = LlmPlanner::new(Arc::new(FakeClient::replying("not json")));
    let result = planner.plan(&[ChatMessage::user("read a.txt")]).await;
    assert!(matches!(result, Err(Error::Planning(_))));
}

#[tokio::test]
async fn test_client_failure_propagates() {
    let client = FakeClient {
        reply: Err(Error::Planning("connection refused".to_string())),
        seen: Mutex::new(Vec::new()),
    };
    let planner = LlmPlanner::new(Arc::new(client));
    let result = planner.plan(&[ChatMessage::user("read a.txt")]).await;
    assert!(matches!(result, Err(Error::Planning(msg)) if msg.contains("connection refused")));
}
