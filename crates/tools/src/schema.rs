//! Compiled request and response contracts.
//!
//! Schemas are compiled once, when a tool is registered, so a malformed
//! contract fails startup instead of letting payloads through.

use jsonschema::{Draft, Validator};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid schema: {0}")]
pub struct SchemaError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct SchemaViolation {
    pub message: String,
}

pub struct ContractSchema {
    raw: Value,
    validator: Validator,
}

impl ContractSchema {
    pub fn compile(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|err| SchemaError(err.to_string()))?;
        Ok(Self {
            raw: schema.clone(),
            validator,
        })
    }

    /// Reports the first violation only.
    pub fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        if self.validator.is_valid(value) {
            return Ok(());
        }
        let message = self
            .validator
            .iter_errors(value)
            .next()
            .map_or_else(|| "schema validation failed".to_string(), |err| err.to_string());
        Err(SchemaViolation { message })
    }
}

impl std::fmt::Debug for ContractSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ContractSchema").field(&self.raw).finish()
    }
}
