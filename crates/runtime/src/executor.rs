use crate::span::{SpanStatus, SpanTimer};
use crate::trace::TraceContext;
use serde_json::Value;
use std::any::Any;
use toolgate_tools::{GuardrailCode, RegisteredTool, ToolError, ToolOutput};
use tracing::{error, warn};

/// What happened when the handler ran.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    Success(ToolOutput),
    /// Expected domain failure from the closed guardrail set.
    Guardrail(GuardrailCode),
    /// Structured failure whose code is outside the guardrail set.
    Failure { code: String, message: String },
    /// The handler panicked or its task died.
    Crash(String),
}

impl ExecutionResult {
    fn span_status(&self) -> SpanStatus {
        match self {
            ExecutionResult::Success(_) | ExecutionResult::Guardrail(_) => SpanStatus::Ok,
            ExecutionResult::Failure { .. } | ExecutionResult::Crash(_) => SpanStatus::Error,
        }
    }
}

/// Runs handlers inside a failure boundary.
///
/// Each call is spawned on its own task, so a handler panic surfaces as a
/// `JoinError` instead of unwinding through the control plane.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutor;

impl ToolExecutor {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        tool: &RegisteredTool,
        request: Value,
        trace: &TraceContext,
    ) -> ExecutionResult {
        let timer = SpanTimer::start("tool_handler", trace.id());
        let handler = tool.spec.handler.clone();

        let result = match tokio::spawn(async move { handler.call(request).await }).await {
            Ok(Ok(output)) => match tool.check_response(&output.to_value()) {
                Ok(()) => ExecutionResult::Success(output),
                Err(violation) => {
                    warn!(trace_id = %trace, tool = tool.name(), %violation, "Handler response violates schema");
                    ExecutionResult::Failure {
                        code: "invalid_response".into(),
                        message: violation.to_string(),
                    }
                }
            },
            Ok(Err(ToolError::Guardrail(code))) => ExecutionResult::Guardrail(code),
            Ok(Err(err)) => ExecutionResult::Failure {
                code: err.code().to_string(),
                message: err.to_string(),
            },
            Err(join_err) if join_err.is_panic() => {
                let detail = panic_detail(join_err.into_panic());
                error!(trace_id = %trace, tool = tool.name(), %detail, "Tool handler panicked");
                ExecutionResult::Crash(detail)
            }
            Err(_) => {
                error!(trace_id = %trace, tool = tool.name(), "Tool handler task cancelled");
                ExecutionResult::Crash("handler task cancelled".into())
            }
        };

        timer.finish(result.span_status());
        result
    }
}

fn panic_detail(payload: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}
