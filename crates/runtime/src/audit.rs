//! Audit events for tool attempts.
//!
//! Every control-plane invocation produces exactly one record through
//! [`AuditSink::emit`]. The sink validates the event before writing it and
//! never returns an error: anything that goes wrong on the audit path is
//! turned into a minimal fallback record so the caller still gets a reply.

use crate::audit_logger::AuditWriter;
use crate::outcome::{Decision, Outcome, MAX_SUMMARY_CHARS};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, warn};

pub const AUDIT_EVENT: &str = "tool_attempt";
pub const FALLBACK_EVENT: &str = "tool_attempt_invalid";

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Audit field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Audit result_summary is {0} chars, over the limit")]
    SummaryTooLong(usize),

    #[error("Audit timestamp is negative: {0}")]
    InvalidTimestamp(i64),

    #[error("Unexpected audit event name: {0}")]
    UnexpectedEvent(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fields the control plane supplies for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditDraft {
    pub trace_id: String,
    pub tool_name: String,
    pub decision: Decision,
    pub reason: String,
    pub outcome: Outcome,
    pub params_redacted: BTreeMap<String, String>,
    pub result_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditEvent {
    pub timestamp_ms: i64,
    pub event: String,
    pub trace_id: String,
    pub tool_name: String,
    pub decision: Decision,
    pub reason: String,
    pub outcome: Outcome,
    pub params_redacted: BTreeMap<String, String>,
    pub result_summary: String,
}

impl AuditEvent {
    pub fn from_draft(draft: AuditDraft, timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            event: AUDIT_EVENT.to_string(),
            trace_id: draft.trace_id,
            tool_name: draft.tool_name,
            decision: draft.decision,
            reason: draft.reason,
            outcome: draft.outcome,
            params_redacted: draft.params_redacted,
            result_summary: draft.result_summary,
        }
    }

    /// Decision and outcome are closed enums, so only the free-form fields
    /// need checking.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.timestamp_ms < 0 {
            return Err(AuditError::InvalidTimestamp(self.timestamp_ms));
        }
        if self.event != AUDIT_EVENT {
            return Err(AuditError::UnexpectedEvent(self.event.clone()));
        }
        for (name, value) in [
            ("trace_id", &self.trace_id),
            ("tool_name", &self.tool_name),
            ("reason", &self.reason),
            ("result_summary", &self.result_summary),
        ] {
            if value.trim().is_empty() {
                return Err(AuditError::EmptyField(name));
            }
        }
        let summary_len = self.result_summary.chars().count();
        if summary_len > MAX_SUMMARY_CHARS {
            return Err(AuditError::SummaryTooLong(summary_len));
        }
        Ok(())
    }

    pub fn to_record(&self) -> Result<String, AuditError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }
}

pub struct AuditSink {
    writer: Arc<dyn AuditWriter>,
}

impl AuditSink {
    pub fn new(writer: Arc<dyn AuditWriter>) -> Self {
        Self { writer }
    }

    /// Writes one record for the attempt. Never fails.
    pub async fn emit(&self, draft: AuditDraft) {
        let event = AuditEvent::from_draft(draft, chrono::Utc::now().timestamp_millis());

        let record = match event.to_record() {
            Ok(record) => record,
            Err(err) => {
                warn!(trace_id = %event.trace_id, error = %err, "Audit event rejected, writing fallback");
                fallback_record(&event, &err)
            }
        };

        let trace_id = if event.trace_id.is_empty() {
            "unknown"
        } else {
            event.trace_id.as_str()
        };
        if let Err(err) = self.writer.write(trace_id, &record).await {
            error!(trace_id, error = %err, record = %record, "Audit write failed");
        }
    }
}

fn fallback_record(event: &AuditEvent, err: &AuditError) -> String {
    json!({
        "timestamp_ms": event.timestamp_ms.max(0),
        "event": FALLBACK_EVENT,
        "trace_id": if event.trace_id.is_empty() { "unknown" } else { event.trace_id.as_str() },
        "tool_name": event.tool_name,
        "error": err.to_string(),
    })
    .to_string()
}
