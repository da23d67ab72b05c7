use crate::schema::{ContractSchema, SchemaViolation};
use crate::spec::ToolSpec;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool name: {0:?}")]
    InvalidName(String),

    #[error("Tool {tool} has an invalid {which} schema: {message}")]
    InvalidSchema {
        tool: String,
        which: &'static str,
        message: String,
    },
}

/// A spec whose request and response schemas have been compiled.
#[derive(Debug)]
pub struct RegisteredTool {
    pub spec: ToolSpec,
    request: ContractSchema,
    response: ContractSchema,
}

impl RegisteredTool {
    pub fn compile(spec: ToolSpec) -> Result<Self, RegistryError> {
        let invalid = |which: &'static str, message: String| RegistryError::InvalidSchema {
            tool: spec.name.clone(),
            which,
            message,
        };
        let request = ContractSchema::compile(&spec.request_schema)
            .map_err(|err| invalid("request", err.0))?;
        let response = ContractSchema::compile(&spec.response_schema)
            .map_err(|err| invalid("response", err.0))?;
        Ok(Self {
            spec,
            request,
            response,
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn check_request(&self, request: &Value) -> Result<(), SchemaViolation> {
        self.request.check(request)
    }

    pub fn check_response(&self, response: &Value) -> Result<(), SchemaViolation> {
        self.response.check(response)
    }
}

/// Collects tool specs during startup.
#[derive(Default, Debug)]
pub struct ToolRegistryBuilder {
    tools: BTreeMap<String, Arc<RegisteredTool>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: ToolSpec) -> Result<&mut Self, RegistryError> {
        if spec.name.trim().is_empty() || spec.name.trim() != spec.name {
            return Err(RegistryError::InvalidName(spec.name));
        }
        if self.tools.contains_key(&spec.name) {
            return Err(RegistryError::AlreadyRegistered(spec.name));
        }
        let name = spec.name.clone();
        self.tools.insert(name, Arc::new(RegisteredTool::compile(spec)?));
        Ok(self)
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry { tools: self.tools }
    }
}

/// Read-only tool table. Has no mutating methods once built, so it can be
/// shared behind an `Arc` and read concurrently without locks.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<RegisteredTool>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<RegisteredTool>, RegistryError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Tool names in sorted order.
    pub fn list(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::redact::FieldRedactor;
    use crate::traits::{ToolHandler, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct Noop;

    #[async_trait]
    impl ToolHandler for Noop {
        async fn call(&self, _request: Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(Map::new()))
        }
    }

    fn spec(name: &str) -> ToolSpec {
        ToolSpec::new(name, Arc::new(Noop), Arc::new(FieldRedactor::none()))
    }

    #[test]
    fn test_register_and_lookup() {
        let mut builder = ToolRegistry::builder();
        builder.register(spec("read_file")).unwrap();
        let registry = builder.build();

        assert_eq!(registry.lookup("read_file").unwrap().name(), "read_file");
        assert_eq!(
            registry.lookup("missing").unwrap_err(),
            RegistryError::NotFound("missing".into())
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut builder = ToolRegistry::builder();
        builder.register(spec("read_file")).unwrap();
        let err = builder.register(spec("read_file")).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyRegistered("read_file".into()));
    }

    #[test]
    fn test_list_is_sorted() {
        let mut builder = ToolRegistry::builder();
        builder
            .register(spec("zeta"))
            .unwrap()
            .register(spec("alpha"))
            .unwrap()
            .register(spec("mid"))
            .unwrap();
        let registry = builder.build();
        assert_eq!(registry.list(), vec!["alpha", "mid", "zeta"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut builder = ToolRegistry::builder();
        assert!(matches!(
            builder.register(spec(" ")),
            Err(RegistryError::InvalidName(_))
        ));
        assert!(matches!(
            builder.register(spec("read_file ")),
            Err(RegistryError::InvalidName(_))
        ));
    }

    #[test]
    fn test_malformed_schema_rejected_at_registration() {
        let mut builder = ToolRegistry::builder();
        let err = builder
            .register(spec("broken").with_request_schema(json!({"type": "strnig"})))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidSchema { which: "request", .. }
        ));
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_compiled_contract_checks_payloads() {
        let tool = RegisteredTool::compile(
            spec("strict")
                .with_request_schema(json!({"type": "object", "required": ["path"]}))
                .with_response_schema(json!({"type": "object", "required": ["bytes"]})),
        )
        .unwrap();
        assert!(tool.check_request(&json!({"path": "a"})).is_ok());
        assert!(tool.check_request(&json!({})).is_err());
        assert!(tool.check_response(&json!({"bytes": 1})).is_ok());
        assert!(tool.check_response(&json!({"preview": ""})).is_err());
    }
}
