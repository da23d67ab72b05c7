use crate::audit::{AuditDraft, AuditSink};
use crate::executor::{ExecutionResult, ToolExecutor};
use crate::interfaces::{Invocation, InvocationFault, InvocationReply, RejectionCode, ToolResponse};
use crate::outcome::{Attempt, OutcomeClassifier};
use crate::span::{SpanStatus, SpanTimer};
use crate::trace::TraceContext;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use toolgate_policy::approval::REASON_APPROVED;
use toolgate_policy::{ApprovalGate, PermissionGate, ToolDecision};
use toolgate_tools::{RegisteredTool, ToolRegistry};
use tracing::{error, info, warn};

pub const REASON_NOT_REGISTERED: &str = "tool_not_registered";
pub const REASON_INVALID_REQUEST: &str = "invalid_request";
/// Key placed in `params_redacted` when the tool's redactor panicked.
pub const REDACTION_FAILED: &str = "redaction_failed";

/// The single entry point for tool calls.
///
/// Every call to [`ControlPlane::invoke`] writes exactly one audit record,
/// and writes it before returning, whichever branch the call takes.
pub struct ControlPlane {
    registry: Arc<ToolRegistry>,
    permissions: PermissionGate,
    approvals: ApprovalGate,
    executor: ToolExecutor,
    audit: AuditSink,
}

impl ControlPlane {
    pub fn new(
        registry: Arc<ToolRegistry>,
        permissions: PermissionGate,
        approvals: ApprovalGate,
        audit: AuditSink,
    ) -> Self {
        Self {
            registry,
            permissions,
            approvals,
            executor: ToolExecutor::new(),
            audit,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn invoke(&self, invocation: Invocation) -> Result<InvocationReply, InvocationFault> {
        let trace = TraceContext::resolve(invocation.trace_id.as_deref());
        let span = SpanTimer::start("tool_invocation", trace.id());

        let result = self.run(&trace, invocation).await;

        span.finish(if result.is_ok() {
            SpanStatus::Ok
        } else {
            SpanStatus::Error
        });
        result
    }

    async fn run(
        &self,
        trace: &TraceContext,
        invocation: Invocation,
    ) -> Result<InvocationReply, InvocationFault> {
        let Invocation {
            tool_name,
            payload,
            approval_token,
            ..
        } = invocation;
        info!(trace_id = %trace, tool = %tool_name, "Dispatching tool");

        let lookup = self.registry.lookup(&tool_name);
        let params = match &lookup {
            Ok(tool) => redact_params(trace, tool, &payload),
            Err(_) => BTreeMap::new(),
        };

        // 1. Permission, before revealing whether the name is registered
        let permission = self.permissions.decide(&tool_name);
        if !permission.allowed {
            warn!(trace_id = %trace, tool = %tool_name, reason = %permission.reason, "Permission denied");
            self.record(trace, &tool_name, Attempt::Denied(&permission), params)
                .await;
            return Ok(InvocationReply::rejected(trace.id(), RejectionCode::ToolNotAllowed));
        }

        // 2. Lookup
        let tool = match lookup {
            Ok(tool) => tool,
            Err(err) => {
                warn!(trace_id = %trace, error = %err, "Unknown tool");
                let decision = ToolDecision::deny(REASON_NOT_REGISTERED);
                self.record(trace, &tool_name, Attempt::Denied(&decision), params)
                    .await;
                return Ok(InvocationReply::rejected(trace.id(), RejectionCode::ToolNotFound));
            }
        };

        // 3. Approval
        let approval = self
            .approvals
            .decide(&tool_name, &payload, approval_token.as_deref());
        if !approval.allowed {
            warn!(trace_id = %trace, tool = %tool_name, "Approval required");
            self.record(trace, &tool_name, Attempt::Denied(&approval), params)
                .await;
            return Ok(InvocationReply::rejected(trace.id(), RejectionCode::ApprovalRequired));
        }

        // 4. Request contract
        if let Err(violation) = tool.check_request(&payload) {
            warn!(trace_id = %trace, tool = %tool_name, %violation, "Request rejected");
            let decision = ToolDecision::deny(REASON_INVALID_REQUEST);
            self.record(trace, &tool_name, Attempt::Denied(&decision), params)
                .await;
            return Ok(InvocationReply::rejected(trace.id(), RejectionCode::InvalidRequest));
        }

        let decision = if approval.reason == REASON_APPROVED {
            approval
        } else {
            permission
        };

        // 5. Execute, then audit before replying
        let result = self.executor.execute(&tool, payload, trace).await;
        let attempt = Attempt::Executed {
            decision: &decision,
            result: &result,
        };
        self.record(trace, &tool_name, attempt, params).await;

        match result {
            ExecutionResult::Success(output) => Ok(InvocationReply::completed(
                trace.id(),
                ToolResponse {
                    ok: true,
                    fields: output.fields,
                    error: None,
                },
            )),
            ExecutionResult::Guardrail(code) => Ok(InvocationReply::completed(
                trace.id(),
                ToolResponse {
                    ok: false,
                    fields: Map::new(),
                    error: Some(code.to_string()),
                },
            )),
            ExecutionResult::Failure { code, message } => {
                error!(trace_id = %trace, tool = %tool_name, %code, %message, "Tool failed unexpectedly");
                Err(InvocationFault::new(
                    trace.id(),
                    tool_name,
                    format!("{}: {}", code, message),
                ))
            }
            ExecutionResult::Crash(detail) => {
                Err(InvocationFault::new(trace.id(), tool_name, detail))
            }
        }
    }

    async fn record(
        &self,
        trace: &TraceContext,
        tool_name: &str,
        attempt: Attempt<'_>,
        params_redacted: BTreeMap<String, String>,
    ) {
        let classification = OutcomeClassifier::classify(attempt);
        self.audit
            .emit(AuditDraft {
                trace_id: trace.id().to_string(),
                tool_name: tool_name.to_string(),
                decision: classification.decision,
                reason: attempt.reason().to_string(),
                outcome: classification.outcome,
                params_redacted,
                result_summary: classification.summary,
            })
            .await;
    }
}

/// Runs the tool's redactor so that a panic in it still leaves the
/// invocation audited.
fn redact_params(
    trace: &TraceContext,
    tool: &RegisteredTool,
    payload: &Value,
) -> BTreeMap<String, String> {
    match catch_unwind(AssertUnwindSafe(|| tool.spec.redactor.redact(payload))) {
        Ok(params) => params,
        Err(_) => {
            error!(trace_id = %trace, tool = tool.name(), "Redactor panicked");
            BTreeMap::from([(REDACTION_FAILED.to_string(), "true".to_string())])
        }
    }
}
