//! Startup wiring: config → registry, gates and audit sink.

use crate::audit::{AuditError, AuditSink};
use crate::audit_logger::{AuditWriter, FanoutAuditWriter, JsonlAuditWriter, TracingAuditWriter};
use crate::config::{ConfigError, ControlPlaneConfig};
use crate::control_plane::ControlPlane;
use std::sync::Arc;
use thiserror::Error;
use toolgate_policy::{ApprovalGate, PermissionGate};
use toolgate_tools::{ReadFileTool, RegistryError, ToolRegistry};
use tracing::info;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] std::io::Error),
}

/// Registry with the built-in tools.
pub fn default_registry(config: &ControlPlaneConfig) -> Result<ToolRegistry, BootstrapError> {
    let read_file = ReadFileTool::with_data_dir(&config.workspace_root, &config.data_dir)?
        .with_max_bytes(config.max_read_bytes)
        .with_sensitive_suffix(config.sensitive_suffix.as_str());

    let mut builder = ToolRegistry::builder();
    builder.register(read_file.into_spec())?;
    Ok(builder.build())
}

impl ControlPlane {
    pub fn from_config(config: &ControlPlaneConfig) -> Result<Self, BootstrapError> {
        config.validate()?;
        let registry = default_registry(config)?;

        let mut writers: Vec<Arc<dyn AuditWriter>> = vec![Arc::new(TracingAuditWriter)];
        if let Some(path) = &config.audit_log {
            writers.push(Arc::new(JsonlAuditWriter::new(path)?));
        }

        let permissions = PermissionGate::new(config.allowed_tools.iter().cloned());
        info!(
            tools = ?registry.list(),
            allowed = ?permissions.allowed_tools().collect::<Vec<_>>(),
            "Control plane initialized"
        );

        Ok(ControlPlane::new(
            Arc::new(registry),
            permissions,
            ApprovalGate::for_path_suffix(&config.sensitive_suffix, &config.approval_token),
            AuditSink::new(Arc::new(FanoutAuditWriter::new(writers))),
        ))
    }
}
