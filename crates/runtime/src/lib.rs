//! Toolgate runtime: the audited control plane every tool call goes through.
//!
//! lookup → permission gate → approval gate → executor → classifier → audit,
//! with one trace id threaded through all of it.

pub mod audit;
pub mod audit_logger;
pub mod bootstrap;
pub mod config;
pub mod control_plane;
pub mod executor;
pub mod interfaces;
pub mod outcome;
pub mod span;
pub mod telemetry;
pub mod trace;

pub use audit::{AuditDraft, AuditError, AuditEvent, AuditSink};
pub use audit_logger::{AuditWriter, FanoutAuditWriter, JsonlAuditWriter, TracingAuditWriter};
pub use bootstrap::{default_registry, BootstrapError};
pub use config::{ConfigError, ControlPlaneConfig};
pub use control_plane::ControlPlane;
pub use executor::{ExecutionResult, ToolExecutor};
pub use interfaces::{
    Invocation, InvocationFault, InvocationReply, RejectionCode, ReplyBody, ToolResponse,
};
pub use outcome::{Attempt, Classification, Decision, Outcome, OutcomeClassifier, MAX_SUMMARY_CHARS};
pub use span::{SpanStatus, SpanTimer};
pub use trace::{TraceContext, TRACE_HEADER};
