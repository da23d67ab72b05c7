pub mod error;
pub mod file_tools;
pub mod redact;
pub mod registry;
pub mod sandbox;
pub mod schema;
pub mod spec;
pub mod traits;

pub use error::{GuardrailCode, ToolError};
pub use file_tools::ReadFileTool;
pub use redact::FieldRedactor;
pub use registry::{RegisteredTool, RegistryError, ToolRegistry, ToolRegistryBuilder};
pub use sandbox::DataDirGuard;
pub use schema::{ContractSchema, SchemaError, SchemaViolation};
pub use spec::ToolSpec;
pub use traits::{Redactor, ToolHandler, ToolOutput};
