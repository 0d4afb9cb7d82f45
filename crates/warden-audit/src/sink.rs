//! Sink - The seam the orchestrator writes audit events through

use crate::error::Result;
use crate::event::{AuditRecord, EventKind};
use crate::redact::redact;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Append-only audit sink
///
/// Implementations redact the payload before it is stored and preserve
/// append order.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one event
    async fn append(&self, event: EventKind, payload: serde_json::Value) -> Result<()>;

    /// The last `n` records, oldest first
    async fn recent(&self, n: usize) -> Result<Vec<AuditRecord>>;

    /// Sink name (for logging)
    fn name(&self) -> &str;
}

/// Shared sink handle
pub type SharedAuditSink = Arc<dyn AuditSink>;

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record appended so far
    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().await.clone()
    }

    /// Event tags in append order
    pub async fn events(&self) -> Vec<EventKind> {
        self.records.lock().await.iter().map(|r| r.event).collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, event: EventKind, payload: serde_json::Value) -> Result<()> {
        let record = AuditRecord::new(event, redact(payload));
        self.records.lock().await.push(record);
        Ok(())
    }

    async fn recent(&self, n: usize) -> Result<Vec<AuditRecord>> {
        let records = self.records.lock().await;
        let start = records.len().saturating_sub(n);
        Ok(records[start..].to_vec())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_sink_order_and_recent() {
        let sink = MemoryAuditSink::new();
        sink.append(EventKind::UserMessage, json!({"text": "hi"}))
            .await
            .unwrap();
        sink.append(EventKind::PlanReceived, json!({"actions": 0}))
            .await
            .unwrap();
        sink.append(EventKind::AssistantMessage, json!({"text": "ok"}))
            .await
            .unwrap();

        assert_eq!(
            sink.events().await,
            vec![
                EventKind::UserMessage,
                EventKind::PlanReceived,
                EventKind::AssistantMessage
            ]
        );
        let recent = sink.recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].event, EventKind::PlanReceived);
        assert_eq!(sink.recent(10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_memory_sink_redacts() {
        let sink = MemoryAuditSink::new();
        sink.append(EventKind::UserMessage, json!({"text": "ghp_abcdef"}))
            .await
            .unwrap();
        let records = sink.records().await;
        assert_eq!(records[0].payload["text"], crate::redact::REDACTION_MARKER);
    }
}
