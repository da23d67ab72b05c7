use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Successful handler response.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Handler-specific response fields returned to the caller.
    pub fields: Map<String, Value>,
    /// Short log-safe detail, e.g. `bytes=12`.
    pub summary: Option<String>,
}

impl ToolOutput {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, request: Value) -> Result<ToolOutput, ToolError>;
}

/// Maps a raw request to the fields that are safe to write to the audit log.
pub trait Redactor: Send + Sync {
    fn redact(&self, request: &Value) -> BTreeMap<String, String>;
}
