use crate::audit::AuditError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

pub const AUDIT_TARGET: &str = "toolgate::audit";

/// Destination for serialized audit records, tagged with their trace id.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    async fn write(&self, trace_id: &str, record: &str) -> Result<(), AuditError>;
}

/// Emits records through `tracing`, so they share the process log stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditWriter;

#[async_trait]
impl AuditWriter for TracingAuditWriter {
    async fn write(&self, trace_id: &str, record: &str) -> Result<(), AuditError> {
        info!(target: AUDIT_TARGET, trace_id, audit = record, "tool_attempt");
        Ok(())
    }
}

/// Append-only JSON-lines file, one record per line, synced per write.
pub struct JsonlAuditWriter {
    log_path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditWriter {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self, AuditError> {
        let log_path = log_path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            log_path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

#[async_trait]
impl AuditWriter for JsonlAuditWriter {
    async fn write(&self, _trace_id: &str, record: &str) -> Result<(), AuditError> {
        let mut file = self.file.lock();
        writeln!(file, "{}", record)?;
        file.sync_all()?;
        Ok(())
    }
}

/// Writes every record to each inner writer. All writers are attempted; the
/// first error is returned.
#[derive(Default)]
pub struct FanoutAuditWriter {
    writers: Vec<Arc<dyn AuditWriter>>,
}

impl FanoutAuditWriter {
    pub fn new(writers: Vec<Arc<dyn AuditWriter>>) -> Self {
        Self { writers }
    }
}

#[async_trait]
impl AuditWriter for FanoutAuditWriter {
    async fn write(&self, trace_id: &str, record: &str) -> Result<(), AuditError> {
        let mut first_err = None;
        for writer in &self.writers {
            if let Err(err) = writer.write(trace_id, record).await {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
