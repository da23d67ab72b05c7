//! Caller-facing types: what goes into the control plane and what comes out.

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// One structured tool call from any caller, agent loop included.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub tool_name: String,
    pub payload: Value,
    pub trace_id: Option<String>,
    pub approval_token: Option<String>,
}

impl Invocation {
    pub fn new(tool_name: impl Into<String>, payload: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            payload,
            trace_id: None,
            approval_token: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_approval_token(mut self, token: impl Into<String>) -> Self {
        self.approval_token = Some(token.into());
        self
    }
}

/// Machine-readable reason a call was refused before the handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCode {
    ToolNotAllowed,
    ApprovalRequired,
    ToolNotFound,
    InvalidRequest,
}

impl RejectionCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionCode::ToolNotAllowed => "tool_not_allowed",
            RejectionCode::ApprovalRequired => "approval_required",
            RejectionCode::ToolNotFound => "tool_not_found",
            RejectionCode::InvalidRequest => "invalid_request",
        }
    }
}

/// Keys the control plane owns in a reply body. Handler fields with these
/// names are dropped.
pub const RESERVED_KEYS: [&str; 3] = ["ok", "error", "trace_id"];

/// Success-shaped handler response: `ok` plus handler fields, or `ok=false`
/// with a guardrail code.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub ok: bool,
    pub fields: Map<String, Value>,
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn to_map(&self) -> Map<String, Value> {
        let mut body: Map<String, Value> = self
            .fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        body.insert("ok".into(), Value::Bool(self.ok));
        if let Some(error) = &self.error {
            body.insert("error".into(), Value::String(error.clone()));
        }
        body
    }
}

impl Serialize for ToolResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplyBody {
    Rejected(RejectionCode),
    Completed(ToolResponse),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvocationReply {
    pub trace_id: String,
    pub body: ReplyBody,
}

impl InvocationReply {
    pub fn rejected(trace_id: impl Into<String>, code: RejectionCode) -> Self {
        Self {
            trace_id: trace_id.into(),
            body: ReplyBody::Rejected(code),
        }
    }

    pub fn completed(trace_id: impl Into<String>, response: ToolResponse) -> Self {
        Self {
            trace_id: trace_id.into(),
            body: ReplyBody::Completed(response),
        }
    }

    pub fn rejection(&self) -> Option<RejectionCode> {
        match &self.body {
            ReplyBody::Rejected(code) => Some(*code),
            ReplyBody::Completed(_) => None,
        }
    }

    pub fn response(&self) -> Option<&ToolResponse> {
        match &self.body {
            ReplyBody::Completed(response) => Some(response),
            ReplyBody::Rejected(_) => None,
        }
    }

    /// JSON body for a transport, trace id included.
    pub fn to_json(&self) -> Value {
        match &self.body {
            ReplyBody::Rejected(code) => json!({
                "trace_id": self.trace_id,
                "rejected": true,
                "detail": code.as_str(),
            }),
            ReplyBody::Completed(response) => {
                let mut body = response.to_map();
                body.insert("trace_id".into(), Value::String(self.trace_id.clone()));
                Value::Object(body)
            }
        }
    }
}

/// Unexpected failure after the audit record was written. The message stays
/// generic; the detail is only exposed for server-side logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Tool invocation failed (trace_id={trace_id})")]
pub struct InvocationFault {
    pub trace_id: String,
    pub tool_name: String,
    detail: String,
}

impl InvocationFault {
    pub fn new(
        trace_id: impl Into<String>,
        tool_name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            trace_id: trace_id.into(),
            tool_name: tool_name.into(),
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn to_json(&self) -> Value {
        json!({"error": "internal_error", "trace_id": self.trace_id})
    }
}
