//! Warden Audit - The system of record
//!
//! This crate provides the append-only audit log:
//! - Event: the record schema and event vocabulary
//! - Redact: payload redaction applied before anything is persisted
//! - Log: the rotating NDJSON file behind a single writer lock
//! - Sink: the trait the orchestrator writes through, plus an in-memory sink

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod event;
pub mod log;
pub mod redact;
pub mod sink;

pub use error::{Error, Result};
pub use event::{AuditRecord, EventKind};
pub use log::{AuditConfig, AuditLog, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_BYTES};
pub use redact::{redact, REDACTION_MARKER};
pub use sink::{AuditSink, MemoryAuditSink, SharedAuditSink};
