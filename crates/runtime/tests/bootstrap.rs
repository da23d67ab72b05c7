#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Wiring from configuration to a working control plane.

use serde_json::{json, Value};
use std::path::PathBuf;
use toolgate_runtime::*;

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/sample.txt"), "sample").unwrap();
    dir
}

fn config(dir: &tempfile::TempDir, allowed: &[&str]) -> ControlPlaneConfig {
    ControlPlaneConfig {
        allowed_tools: allowed.iter().map(|s| s.to_string()).collect(),
        workspace_root: dir.path().to_path_buf(),
        audit_log: Some(dir.path().join("logs/audit.jsonl")),
        ..ControlPlaneConfig::default()
    }
}

fn audit_lines(path: &PathBuf) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[tokio::test]
async fn test_from_config_registers_read_file() {
    let dir = workspace();
    let plane = ControlPlane::from_config(&config(&dir, &[])).unwrap();
    assert_eq!(plane.registry().list(), vec!["read_file"]);
}

#[tokio::test]
async fn test_jsonl_audit_trail() {
    let dir = workspace();
    let config = config(&dir, &["read_file"]);
    let plane = ControlPlane::from_config(&config).unwrap();

    let reply = plane
        .invoke(Invocation::new("read_file", json!({"path": "data/sample.txt"})).with_trace_id("JSONL-1"))
        .await
        .unwrap();
    assert!(reply.response().unwrap().ok);

    plane
        .invoke(Invocation::new("read_file", json!({"path": "data/x.secret"})).with_trace_id("JSONL-2"))
        .await
        .unwrap();

    let lines = audit_lines(config.audit_log.as_ref().unwrap());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["trace_id"], "JSONL-1");
    assert_eq!(lines[0]["result_summary"], "ok bytes=6");
    assert_eq!(lines[1]["trace_id"], "JSONL-2");
    assert_eq!(lines[1]["reason"], "approval_required");
}

#[tokio::test]
async fn test_byte_cap_from_config() {
    let dir = workspace();
    let mut config = config(&dir, &["read_file"]);
    config.max_read_bytes = 3;
    let plane = ControlPlane::from_config(&config).unwrap();

    let reply = plane
        .invoke(Invocation::new("read_file", json!({"path": "data/sample.txt"})))
        .await
        .unwrap();
    assert_eq!(reply.response().unwrap().error.as_deref(), Some("file_too_large"));
}

#[test]
fn test_missing_workspace_fails_startup() {
    let config = ControlPlaneConfig {
        workspace_root: PathBuf::from("/definitely/not/here"),
        ..ControlPlaneConfig::default()
    };
    assert!(matches!(
        ControlPlane::from_config(&config),
        Err(BootstrapError::Workspace(_))
    ));
}
