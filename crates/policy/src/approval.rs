//! Human-in-the-loop approval for sensitive targets.
//!
//! The gate is a composition of two pluggable parts: a classifier that says
//! whether a request touches something sensitive, and a matcher that says
//! whether the caller's token counts as approval. Either can be swapped
//! without touching the pipeline.

use crate::permissions::ToolDecision;
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Component, Path};

pub const REASON_APPROVAL_REQUIRED: &str = "approval_required";
pub const REASON_APPROVED: &str = "approved";
pub const REASON_NOT_SENSITIVE: &str = "approval_not_required";

pub trait SensitivityClassifier: Send + Sync {
    fn is_sensitive(&self, tool_name: &str, request: &Value) -> bool;
}

pub trait ApprovalMatcher: Send + Sync {
    fn approves(&self, token: Option<&str>) -> bool;
}

/// Flags requests whose path field names a file with a restricted suffix.
///
/// The check runs on the last component of the lexically normalized path,
/// so `data/x.secret/`, `data/x.secret/.` and `data/y/../x.secret` are all
/// caught.
#[derive(Debug, Clone)]
pub struct SuffixClassifier {
    field: String,
    suffix: String,
}

impl SuffixClassifier {
    pub fn new(field: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            suffix: suffix.into(),
        }
    }
}

impl SensitivityClassifier for SuffixClassifier {
    fn is_sensitive(&self, _tool_name: &str, request: &Value) -> bool {
        request
            .get(&self.field)
            .and_then(Value::as_str)
            .map(|target| {
                let target = target.trim_end();
                target.ends_with(&self.suffix)
                    || target_name(target)
                        .is_some_and(|name| name.to_string_lossy().ends_with(&self.suffix))
            })
            .unwrap_or(false)
    }
}

/// Final path segment after resolving `.` and `..` without the filesystem.
pub fn target_name(raw: &str) -> Option<&OsStr> {
    let mut segments: Vec<&OsStr> = Vec::new();
    for component in Path::new(raw).components() {
        match component {
            Component::Normal(segment) => segments.push(segment),
            Component::ParentDir => {
                segments.pop();
            }
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
        }
    }
    segments.last().copied()
}

/// Accepts only a token exactly equal to the configured value.
#[derive(Debug, Clone)]
pub struct ExactTokenMatcher {
    expected: String,
}

impl ExactTokenMatcher {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }
}

impl ApprovalMatcher for ExactTokenMatcher {
    fn approves(&self, token: Option<&str>) -> bool {
        matches!(token, Some(t) if !self.expected.is_empty() && t == self.expected)
    }
}

pub struct ApprovalGate {
    classifier: Box<dyn SensitivityClassifier>,
    matcher: Box<dyn ApprovalMatcher>,
}

impl ApprovalGate {
    pub fn new(
        classifier: impl SensitivityClassifier + 'static,
        matcher: impl ApprovalMatcher + 'static,
    ) -> Self {
        Self {
            classifier: Box::new(classifier),
            matcher: Box::new(matcher),
        }
    }

    /// `path` ending in `suffix` needs `token`.
    pub fn for_path_suffix(suffix: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(
            SuffixClassifier::new("path", suffix),
            ExactTokenMatcher::new(token),
        )
    }

    pub fn decide(&self, tool_name: &str, request: &Value, token: Option<&str>) -> ToolDecision {
        if !self.classifier.is_sensitive(tool_name, request) {
            return ToolDecision::allow(REASON_NOT_SENSITIVE);
        }
        if self.matcher.approves(token) {
            ToolDecision::allow(REASON_APPROVED)
        } else {
            ToolDecision::deny(REASON_APPROVAL_REQUIRED)
        }
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate").finish_non_exhaustive()
    }
}
