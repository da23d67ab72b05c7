use crate::traits::{Redactor, ToolHandler};
use serde_json::{json, Value};
use std::sync::Arc;

/// A registered tool: its contract, its handler and its audit redactor,
/// bound together once at startup.
#[derive(Clone)]
pub struct ToolSpec {
    pub name: String,
    pub request_schema: Value,
    pub response_schema: Value,
    pub handler: Arc<dyn ToolHandler>,
    pub redactor: Arc<dyn Redactor>,
}

impl ToolSpec {
    /// Spec with permissive object schemas; tighten with the `with_*` methods.
    pub fn new(
        name: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
        redactor: Arc<dyn Redactor>,
    ) -> Self {
        Self {
            name: name.into(),
            request_schema: json!({"type": "object"}),
            response_schema: json!({"type": "object"}),
            handler,
            redactor,
        }
    }

    pub fn with_request_schema(mut self, schema: Value) -> Self {
        self.request_schema = schema;
        self
    }

    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.response_schema = schema;
        self
    }
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
