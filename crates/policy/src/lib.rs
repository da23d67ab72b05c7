//! Pre-execution gates for tool invocations.
//!
//! Both gates are pure functions over per-call input and read-only
//! configuration, so a single instance can be shared across tasks.

pub mod approval;
pub mod permissions;

pub use approval::{
    ApprovalGate, ApprovalMatcher, ExactTokenMatcher, SensitivityClassifier, SuffixClassifier,
};
pub use permissions::{parse_allowlist, PermissionGate, ToolDecision};
