//! Orchestrator tests

use super::{Orchestrator, OrchestratorConfig, TurnStatus};
use crate::approval::{ApprovalDecision, ApprovalHandler, ApprovalRequest};
use crate::error::{Error, Result};
use crate::model::{AgentPlan, ChatMessage, ProposedAction};
use crate::planner::{Planner, RuleBasedPlanner};
use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;
use warden_audit::{AuditRecord, AuditSink, EventKind, MemoryAuditSink};
use warden_policy::{
    PolicyConfig, PolicyEngine, ToolCall, WorkspaceRoot, TOOL_COMMAND_EXEC, TOOL_FILE_READ,
    TOOL_FILE_SEARCH,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use warden_tools::{CapabilityHandler, HandlerRegistry, ToolResult};

mock! {
    pub Approver {}

    #[async_trait]
    impl ApprovalHandler for Approver {
        async fn request_approval(&self, request: ApprovalRequest) -> Result<ApprovalDecision>;
    }
}

/// Planner returning a fixed plan every turn
struct FixedPlanner(AgentPlan);

#[async_trait]
impl Planner for FixedPlanner {
    async fn plan(&self, _history: &[ChatMessage]) -> Result<AgentPlan> {
        Ok(self.0.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct FailingPlanner;

#[async_trait]
impl Planner for FailingPlanner {
    async fn plan(&self, _history: &[ChatMessage]) -> Result<AgentPlan> {
        Err(Error::Planning("model returned prose".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Audit sink that refuses every write
struct BrokenSink;

#[async_trait]
impl AuditSink for BrokenSink {
    async fn append(&self, _event: EventKind, _payload: serde_json::Value) -> warden_audit::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }

    async fn recent(&self, _n: usize) -> warden_audit::Result<Vec<AuditRecord>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "broken"
    }
}

fn test_policy() -> PolicyConfig {
    PolicyConfig {
        allowed_tools: vec![
            TOOL_FILE_SEARCH.to_string(),
            TOOL_FILE_READ.to_string(),
            TOOL_COMMAND_EXEC.to_string(),
        ],
        allowed_executables: vec!["/bin/echo".to_string(), "/bin/ls".to_string()],
        max_actions_per_turn: 5,
        ..PolicyConfig::deny_all()
    }
}

struct Harness {
    dir: TempDir,
    sink: Arc<MemoryAuditSink>,
    orchestrator: Orchestrator,
}

fn harness(planner: Arc<dyn Planner>, approver: MockApprover) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("README.md"), "# Hello\n").unwrap();
    let workspace = Arc::new(WorkspaceRoot::fixed(dir.path()).unwrap());
    let sink = Arc::new(MemoryAuditSink::new());
    let orchestrator = Orchestrator::new(
        planner,
        Arc::new(PolicyEngine::new(test_policy())),
        workspace,
        Arc::new(approver),
        sink.clone(),
    );
    Harness {
        dir,
        sink,
        orchestrator,
    }
}

fn fixed(plan: AgentPlan) -> Arc<dyn Planner> {
    Arc::new(FixedPlanner(plan))
}

fn read_action(path: &str) -> ProposedAction {
    ProposedAction::new(
        format!("Read {}", path),
        "test",
        ToolCall::new(TOOL_FILE_READ, json!({ "path": path })),
    )
}

fn exec_action(executable: &str, args: &[&str]) -> ProposedAction {
    ProposedAction::new(
        format!("Run {}", executable),
        "test",
        ToolCall::new(
            TOOL_COMMAND_EXEC,
            json!({ "executablePath": executable, "args": args }),
        ),
    )
}

/// Handler that refuses every call
struct RefusingHandler;

#[async_trait]
impl CapabilityHandler for RefusingHandler {
    fn name(&self) -> &str {
        TOOL_FILE_READ
    }

    async fn handle(&self, call: &ToolCall) -> ToolResult {
        ToolResult::denied(call, "Path 'README.md' is outside the workspace root")
    }
}

/// Handler that counts calls and succeeds
#[derive(Default)]
struct CountingHandler {
    calls: AtomicUsize,
}

#[async_trait]
impl CapabilityHandler for CountingHandler {
    fn name(&self) -> &str {
        TOOL_COMMAND_EXEC
    }

    async fn handle(&self, call: &ToolCall) -> ToolResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ToolResult::success(call, json!({ "exitCode": 0 }), 0)
    }
}

fn never_asked() -> MockApprover {
    let mut approver = MockApprover::new();
    approver.expect_request_approval().never();
    approver
}

#[test]
fn test_config_defaults() {
    assert_eq!(OrchestratorConfig::default().history_limit, 200);
    assert_eq!(OrchestratorConfig::new().with_history_limit(0).history_limit, 1);
}

#[test]
fn test_turn_status_serialization() {
    assert_eq!(
        serde_json::to_string(&TurnStatus::FailedClosed).unwrap(),
        "\"failed_closed\""
    );
    assert_eq!(TurnStatus::NoActions.to_string(), "no_actions");
}

#[tokio::test]
async fn test_low_risk_read_runs_without_approval() {
    let h = harness(
        fixed(AgentPlan::new("read").with_action(read_action("README.md"))),
        never_asked(),
    );

    let outcome = h.orchestrator.process_message("read README.md").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert!(outcome.reply.starts_with("Completed 1 action(s) successfully."));
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].output["content"], "# Hello\n");

    assert_eq!(
        h.sink.events().await,
        vec![
            EventKind::UserMessage,
            EventKind::PlanReceived,
            EventKind::ActionExecuted,
            EventKind::AssistantMessage,
        ]
    );
}

#[tokio::test]
async fn test_questions_stop_the_turn() {
    let plan = AgentPlan::clarify("Which year?").with_action(read_action("README.md"));
    let h = harness(fixed(plan), never_asked());

    let outcome = h.orchestrator.process_message("files after May 1").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Clarifying);
    assert_eq!(outcome.reply, "Which year?");
    assert!(outcome.results.is_empty());
    assert!(!h.sink.events().await.contains(&EventKind::ActionExecuted));
}

#[tokio::test]
async fn test_one_bad_action_poisons_the_turn() {
    let plan = AgentPlan::new("two")
        .with_action(read_action("README.md"))
        .with_action(read_action("../outside.txt"));
    let h = harness(fixed(plan), never_asked());

    let outcome = h.orchestrator.process_message("read both").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Denied);
    assert!(outcome.reply.contains("outside the workspace root"));
    assert!(outcome.results.is_empty());

    let events = h.sink.events().await;
    assert!(events.contains(&EventKind::ActionDenied));
    assert!(!events.contains(&EventKind::ActionExecuted));
}

#[tokio::test]
async fn test_too_many_actions_denied() {
    let mut plan = AgentPlan::new("many");
    for _ in 0..6 {
        plan = plan.with_action(read_action("README.md"));
    }
    let h = harness(fixed(plan), never_asked());

    let outcome = h.orchestrator.process_message("read a lot").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Denied);
    assert!(outcome.reply.contains("at most 5"));
    assert!(!h.sink.events().await.contains(&EventKind::ActionExecuted));
}

#[tokio::test]
async fn test_empty_plan_replies_with_summary() {
    let h = harness(fixed(AgentPlan::new("Nothing to do here.")), never_asked());
    let outcome = h.orchestrator.process_message("hello").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::NoActions);
    assert_eq!(outcome.reply, "Nothing to do here.");
}

#[tokio::test]
async fn test_cancelled_approval_skips_medium_but_runs_low() {
    let plan = AgentPlan::new("mixed")
        .with_action(exec_action("/bin/ls", &[]))
        .with_action(read_action("README.md"));

    let mut approver = MockApprover::new();
    approver
        .expect_request_approval()
        .times(1)
        .withf(|request| {
            request.actions.len() == 1 && request.actions[0].tool() == TOOL_COMMAND_EXEC
        })
        .returning(|_| Ok(ApprovalDecision::Cancelled));
    let h = harness(fixed(plan), approver);

    let outcome = h.orchestrator.process_message("ls and read").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].name, TOOL_FILE_READ);

    let records = h.sink.records().await;
    let replied = records
        .iter()
        .find(|r| r.event == EventKind::ApprovalReplied)
        .unwrap();
    assert_eq!(replied.payload["cancelled"], true);
    assert_eq!(
        records
            .iter()
            .filter(|r| r.event == EventKind::ActionExecuted)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_unknown_approved_ids_are_ignored() {
    let plan = AgentPlan::new("ls").with_action(exec_action("/bin/ls", &[]));
    let mut approver = MockApprover::new();
    approver.expect_request_approval().times(1).returning(|_| {
        let mut ids = HashSet::new();
        ids.insert(uuid::Uuid::new_v4());
        Ok(ApprovalDecision::Approved(ids))
    });
    let h = harness(fixed(plan), approver);

    let outcome = h.orchestrator.process_message("run ls").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::NoActions);
    assert_eq!(outcome.reply, "No actions executed.");
    assert!(!h.sink.events().await.contains(&EventKind::ActionExecuted));
}

#[cfg(unix)]
#[tokio::test]
async fn test_approved_command_runs() {
    let plan = AgentPlan::new("echo").with_action(exec_action("/bin/echo", &["hello"]));
    let mut approver = MockApprover::new();
    approver
        .expect_request_approval()
        .times(1)
        .returning(|request| Ok(ApprovalDecision::Approved(request.action_ids())));
    let h = harness(fixed(plan), approver);

    let outcome = h.orchestrator.process_message("run echo hello").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Completed);
    assert_eq!(outcome.results[0].output["stdout"], "hello\n");
    assert!(outcome.reply.contains("exit code 0"));

    let events = h.sink.events().await;
    assert_eq!(
        events,
        vec![
            EventKind::UserMessage,
            EventKind::PlanReceived,
            EventKind::ApprovalRequested,
            EventKind::ApprovalReplied,
            EventKind::ActionExecuted,
            EventKind::AssistantMessage,
        ]
    );
}

#[tokio::test]
async fn test_approval_failure_fails_closed() {
    let plan = AgentPlan::new("ls").with_action(exec_action("/bin/ls", &[]));
    let mut approver = MockApprover::new();
    approver
        .expect_request_approval()
        .times(1)
        .returning(|_| Err(Error::Approval("no presenter".to_string())));
    let h = harness(fixed(plan), approver);

    let outcome = h.orchestrator.process_message("run ls").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::FailedClosed);
    assert!(h.sink.events().await.contains(&EventKind::FailClosed));
    assert!(!h.sink.events().await.contains(&EventKind::ActionExecuted));
}

#[tokio::test]
async fn test_planner_failure_fails_closed() {
    let h = harness(Arc::new(FailingPlanner), never_asked());
    let outcome = h.orchestrator.process_message("read README.md").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::FailedClosed);
    assert!(outcome.reply.contains("model returned prose"));
    assert_eq!(
        h.sink.events().await,
        vec![EventKind::UserMessage, EventKind::FailClosed]
    );
}

#[tokio::test]
async fn test_missing_root_fails_closed_at_execution() {
    let h = harness(
        fixed(AgentPlan::new("search").with_action(ProposedAction::new(
            "Search",
            "test",
            ToolCall::new(TOOL_FILE_SEARCH, json!({})),
        ))),
        never_asked(),
    );
    h.orchestrator.workspace().clear().unwrap();

    let outcome = h.orchestrator.process_message("find files").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::FailedClosed);
    assert!(!outcome.reply.contains(h.dir.path().to_str().unwrap()));
    let records = h.sink.records().await;
    let fail = records
        .iter()
        .find(|r| r.event == EventKind::FailClosed)
        .unwrap();
    assert_eq!(fail.payload["systemFault"], true);
}

#[tokio::test]
async fn test_unregistered_tool_fails_closed() {
    let h = harness(
        fixed(AgentPlan::new("read").with_action(read_action("README.md"))),
        never_asked(),
    );
    let orchestrator = h
        .orchestrator
        .with_registry(Arc::new(HandlerRegistry::new()));

    let outcome = orchestrator.process_message("read README.md").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::FailedClosed);
    assert!(outcome.reply.contains("unknown tool"));
    assert!(!h.sink.events().await.contains(&EventKind::ActionExecuted));
}

#[tokio::test]
async fn test_audit_failure_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(
        Arc::new(RuleBasedPlanner::new()),
        Arc::new(PolicyEngine::new(test_policy())),
        Arc::new(WorkspaceRoot::fixed(dir.path()).unwrap()),
        Arc::new(never_asked()),
        Arc::new(BrokenSink),
    );

    let result = orchestrator.process_message("find files").await;
    assert!(matches!(result, Err(Error::Audit(_))));
}

#[tokio::test]
async fn test_history_is_bounded() {
    let h = harness(fixed(AgentPlan::new("nothing")), never_asked());
    let orchestrator = h
        .orchestrator
        .with_config(OrchestratorConfig::new().with_history_limit(3));

    for i in 0..4 {
        orchestrator.process_message(&format!("message {}", i)).await.unwrap();
    }
    let history = orchestrator.history().await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[2].text, "nothing");
    assert_eq!(history[1].text, "message 3");
}

#[tokio::test]
async fn test_handler_denial_ends_turn() {
    let read = read_action("README.md");
    let exec = exec_action("/bin/echo", &["hi"]);

    let mut approver = MockApprover::new();
    approver
        .expect_request_approval()
        .times(1)
        .returning(|request| Ok(ApprovalDecision::Approved(request.action_ids())));

    let h = harness(
        fixed(AgentPlan::new("read then run").with_action(read).with_action(exec)),
        approver,
    );
    let counting = Arc::new(CountingHandler::default());
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(RefusingHandler));
    registry.register(counting.clone());
    let orchestrator = h.orchestrator.with_registry(Arc::new(registry));

    let outcome = orchestrator.process_message("read then run").await.unwrap();
    assert_eq!(outcome.status, TurnStatus::Denied);
    assert!(outcome.reply.contains("outside the workspace root"));
    assert!(outcome.results.is_empty());
    assert_eq!(counting.calls.load(Ordering::SeqCst), 0);

    let events = h.sink.events().await;
    let executed = events
        .iter()
        .filter(|e| **e == EventKind::ActionExecuted)
        .count();
    assert_eq!(executed, 1);
    assert_eq!(events[events.len() - 2], EventKind::ActionDenied);
    assert_eq!(events.last(), Some(&EventKind::AssistantMessage));
}
