//! Process configuration for the control plane.
//!
//! Loaded once at startup from the environment or a YAML file and then only
//! read.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toolgate_policy::parse_allowlist;
use toolgate_tools::file_tools::DEFAULT_MAX_READ_BYTES;
use toolgate_tools::sandbox::path_guard::DEFAULT_DATA_DIR;

pub const ENV_ALLOWED_TOOLS: &str = "MCP_ALLOWED_TOOLS";
pub const ENV_APPROVAL_TOKEN: &str = "TOOLGATE_APPROVAL_TOKEN";
pub const ENV_SENSITIVE_SUFFIX: &str = "TOOLGATE_SENSITIVE_SUFFIX";
pub const ENV_WORKSPACE_ROOT: &str = "TOOLGATE_WORKSPACE_ROOT";
pub const ENV_DATA_DIR: &str = "TOOLGATE_DATA_DIR";
pub const ENV_MAX_READ_BYTES: &str = "TOOLGATE_MAX_READ_BYTES";
pub const ENV_AUDIT_LOG: &str = "TOOLGATE_AUDIT_LOG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlPlaneConfig {
    /// Deny-by-default: empty means no tool may run.
    pub allowed_tools: Vec<String>,
    pub approval_token: String,
    pub sensitive_suffix: String,
    pub workspace_root: PathBuf,
    pub data_dir: PathBuf,
    pub max_read_bytes: u64,
    pub audit_log: Option<PathBuf>,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            allowed_tools: Vec::new(),
            approval_token: "approved".to_string(),
            sensitive_suffix: ".secret".to_string(),
            workspace_root: PathBuf::from("."),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
            audit_log: None,
        }
    }
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_ALLOWED_TOOLS) {
            config.allowed_tools = parse_allowlist(&raw).into_iter().collect();
        }
        if let Some(token) = lookup(ENV_APPROVAL_TOKEN) {
            config.approval_token = token;
        }
        if let Some(suffix) = lookup(ENV_SENSITIVE_SUFFIX) {
            config.sensitive_suffix = suffix;
        }
        if let Some(root) = lookup(ENV_WORKSPACE_ROOT) {
            config.workspace_root = PathBuf::from(root);
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_MAX_READ_BYTES) {
            config.max_read_bytes = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                key: ENV_MAX_READ_BYTES,
                message: format!("{}: {:?}", e, raw),
            })?;
        }
        if let Some(path) = lookup(ENV_AUDIT_LOG).filter(|p| !p.trim().is_empty()) {
            config.audit_log = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Relative `workspace_root` and `audit_log` resolve against the file's
    /// directory.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if config.workspace_root.is_relative() {
            config.workspace_root = base.join(&config.workspace_root);
        }
        if let Some(log) = config.audit_log.as_mut() {
            if log.is_relative() {
                *log = base.join(&*log);
            }
        }
        config.allowed_tools = config
            .allowed_tools
            .iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.approval_token.is_empty() {
            return Err(ConfigError::Invalid {
                key: "approval_token",
                message: "must not be empty".into(),
            });
        }
        if self.sensitive_suffix.is_empty() {
            return Err(ConfigError::Invalid {
                key: "sensitive_suffix",
                message: "must not be empty".into(),
            });
        }
        if self.max_read_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_read_bytes",
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_deny_everything() {
        let config = ControlPlaneConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.allowed_tools.is_empty());
        assert_eq!(config.approval_token, "approved");
        assert_eq!(config.sensitive_suffix, ".secret");
        assert_eq!(config.max_read_bytes, 64_000);
        assert!(config.audit_log.is_none());
    }

    #[test]
    fn test_env_allowlist_parsed() {
        let config = ControlPlaneConfig::from_lookup(lookup(&[
            ("MCP_ALLOWED_TOOLS", " read_file, ,echo "),
            ("TOOLGATE_MAX_READ_BYTES", "1024"),
        ]))
        .unwrap();
        assert_eq!(config.allowed_tools, vec!["echo", "read_file"]);
        assert_eq!(config.max_read_bytes, 1024);
    }

    #[test]
    fn test_bad_byte_cap() {
        let err = ControlPlaneConfig::from_lookup(lookup(&[("TOOLGATE_MAX_READ_BYTES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "TOOLGATE_MAX_READ_BYTES", .. }));

        let err = ControlPlaneConfig::from_lookup(lookup(&[("TOOLGATE_MAX_READ_BYTES", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "max_read_bytes", .. }));
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = ControlPlaneConfig::from_lookup(lookup(&[("TOOLGATE_APPROVAL_TOKEN", "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "approval_token", .. }));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolgate.yaml");
        std::fs::write(
            &path,
            "allowed_tools: [read_file, ' ']\nworkspace_root: ws\naudit_log: logs/audit.jsonl\n",
        )
        .unwrap();

        let config = ControlPlaneConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.allowed_tools, vec!["read_file"]);
        assert_eq!(config.workspace_root, dir.path().join("ws"));
        assert_eq!(config.audit_log, Some(dir.path().join("logs/audit.jsonl")));
        assert_eq!(config.approval_token, "approved");
    }

    #[test]
    fn test_yaml_unknown_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toolgate.yaml");
        std::fs::write(&path, "allow_tools: [read_file]\n").unwrap();
        assert!(matches!(
            ControlPlaneConfig::from_yaml_file(&path),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_yaml_missing_file() {
        assert!(matches!(
            ControlPlaneConfig::from_yaml_file("/nonexistent/toolgate.yaml"),
            Err(ConfigError::NotFound(_))
        ));
    }
}
