use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const REASON_ALLOWLISTED: &str = "allowlisted";
pub const REASON_NOT_ALLOWLISTED: &str = "tool_not_allowlisted";

/// Outcome of a single gate check. Produced fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDecision {
    pub allowed: bool,
    pub reason: String,
}

impl ToolDecision {
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Parses `"read_file, other_tool"` into a set of tool names.
pub fn parse_allowlist(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deny-by-default allowlist over tool names.
///
/// Only the tool name is inspected here; request bodies are the approval
/// gate's concern.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    allowed: BTreeSet<String>,
}

impl PermissionGate {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_csv(raw: &str) -> Self {
        Self {
            allowed: parse_allowlist(raw),
        }
    }

    pub fn decide(&self, tool_name: &str) -> ToolDecision {
        if self.allowed.contains(tool_name) {
            ToolDecision::allow(REASON_ALLOWLISTED)
        } else {
            ToolDecision::deny(REASON_NOT_ALLOWLISTED)
        }
    }

    pub fn allowed_tools(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}
