use crate::error::{GuardrailCode, ToolError};
use crate::redact::FieldRedactor;
use crate::sandbox::path_guard::{DataDirGuard, DEFAULT_DATA_DIR};
use crate::spec::ToolSpec;
use crate::traits::{ToolHandler, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

pub const DEFAULT_MAX_READ_BYTES: u64 = 64_000;
const PREVIEW_CHARS: usize = 200;

#[derive(Deserialize)]
struct ReadFileRequest {
    path: String,
}

/// Read-only access to files under the workspace data directory, capped in
/// size.
#[derive(Debug, Clone)]
pub struct ReadFileTool {
    guard: DataDirGuard,
    max_bytes: u64,
    sensitive_suffix: Option<String>,
}

impl ReadFileTool {
    pub const NAME: &'static str = "read_file";

    pub fn new(workspace_root: impl AsRef<Path>) -> io::Result<Self> {
        Self::with_data_dir(workspace_root, DEFAULT_DATA_DIR)
    }

    pub fn with_data_dir(
        workspace_root: impl AsRef<Path>,
        data_dir: impl AsRef<Path>,
    ) -> io::Result<Self> {
        Ok(Self {
            guard: DataDirGuard::new(workspace_root, data_dir)?,
            max_bytes: DEFAULT_MAX_READ_BYTES,
            sensitive_suffix: None,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Refuse files with this suffix unless the request named them directly,
    /// which is the form the approval gate inspects.
    pub fn with_sensitive_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.sensitive_suffix = Some(suffix.into());
        self
    }

    pub fn request_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Path relative to the workspace root, e.g. data/sample.txt"
                }
            },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    pub fn response_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "bytes": {"type": "integer", "minimum": 0},
                "preview": {"type": "string"}
            },
            "required": ["bytes", "preview"]
        })
    }

    /// Binds this tool to its contract and a redactor that logs only `path`.
    pub fn into_spec(self) -> ToolSpec {
        ToolSpec::new(
            Self::NAME,
            Arc::new(self),
            Arc::new(FieldRedactor::new(["path"])),
        )
        .with_request_schema(Self::request_schema())
        .with_response_schema(Self::response_schema())
    }
}

#[async_trait]
impl ToolHandler for ReadFileTool {
    async fn call(&self, request: Value) -> Result<ToolOutput, ToolError> {
        let request: ReadFileRequest =
            serde_json::from_value(request).map_err(|e| ToolError::Validation(e.to_string()))?;

        let target = self.guard.resolve(&request.path)?;
        if let Some(suffix) = &self.sensitive_suffix {
            let requested = self.guard.lexical(&request.path);
            if has_suffix(&target, suffix) && !has_suffix(&requested, suffix) {
                warn!(path = %request.path, "read_file target is sensitive under another name");
                return Err(GuardrailCode::SensitiveTarget.into());
            }
        }

        let metadata = tokio::fs::metadata(&target)
            .await
            .map_err(|_| GuardrailCode::FileNotFound)?;
        if !metadata.is_file() {
            return Err(GuardrailCode::FileNotFound.into());
        }
        if metadata.len() > self.max_bytes {
            return Err(GuardrailCode::FileTooLarge.into());
        }

        let file = tokio::fs::File::open(&target).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ToolError::Guardrail(GuardrailCode::FileNotFound),
            _ => ToolError::from_code("read_failed", e.to_string()),
        })?;

        // the file may grow between stat and read
        let mut raw = Vec::new();
        file.take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut raw)
            .await
            .map_err(|e| ToolError::from_code("read_failed", e.to_string()))?;
        if raw.len() as u64 > self.max_bytes {
            return Err(GuardrailCode::FileTooLarge.into());
        }

        let content = String::from_utf8_lossy(&raw);
        let bytes = content.len();
        let preview: String = content.chars().take(PREVIEW_CHARS).collect();
        debug!(bytes, "read_file completed");

        let mut fields = Map::new();
        fields.insert("bytes".into(), json!(bytes));
        fields.insert("preview".into(), Value::String(preview));
        Ok(ToolOutput::new(fields).with_summary(format!("bytes={}", bytes)))
    }
}

fn has_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(suffix))
}
