use crate::executor::ExecutionResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use toolgate_policy::ToolDecision;
use toolgate_tools::redact::truncate_chars;

/// Upper bound on `result_summary`, in characters.
pub const MAX_SUMMARY_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Blocked,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Blocked => "blocked",
            Outcome::Error => "error",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub decision: Decision,
    pub outcome: Outcome,
    pub summary: String,
}

/// What the pipeline knows about an attempt once it stops: refused by a
/// gate, or run under an allowing decision.
#[derive(Debug, Clone, Copy)]
pub enum Attempt<'a> {
    Denied(&'a ToolDecision),
    Executed {
        decision: &'a ToolDecision,
        result: &'a ExecutionResult,
    },
}

impl Attempt<'_> {
    pub fn reason(&self) -> &str {
        match self {
            Attempt::Denied(decision) | Attempt::Executed { decision, .. } => &decision.reason,
        }
    }
}

/// Pure mapping from an attempt to the audited outcome. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeClassifier;

impl OutcomeClassifier {
    pub fn classify(attempt: Attempt<'_>) -> Classification {
        let result = match attempt {
            Attempt::Denied(decision) => {
                return Classification {
                    decision: Decision::Deny,
                    outcome: Outcome::Blocked,
                    summary: bounded(format!("blocked {}", decision.reason)),
                };
            }
            Attempt::Executed { result, .. } => result,
        };

        let (outcome, summary) = match result {
            ExecutionResult::Success(output) => (
                Outcome::Ok,
                match &output.summary {
                    Some(detail) => format!("ok {}", detail),
                    None => "ok".to_string(),
                },
            ),
            ExecutionResult::Guardrail(code) => (Outcome::Blocked, format!("error {}", code)),
            ExecutionResult::Failure { code, .. } => (Outcome::Error, format!("error {}", code)),
            ExecutionResult::Crash(detail) => (Outcome::Error, format!("crash {}", detail)),
        };

        Classification {
            decision: Decision::Allow,
            outcome,
            summary: bounded(summary),
        }
    }
}

fn bounded(summary: String) -> String {
    truncate_chars(&summary, MAX_SUMMARY_CHARS)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::Map;
    use toolgate_tools::{GuardrailCode, ToolOutput};

    fn executed(result: &ExecutionResult) -> Classification {
        let decision = ToolDecision::allow("allowlisted");
        OutcomeClassifier::classify(Attempt::Executed {
            decision: &decision,
            result,
        })
    }

    #[test]
    fn test_policy_deny_is_blocked() {
        let deny = ToolDecision::deny("tool_not_allowlisted");
        let c = OutcomeClassifier::classify(Attempt::Denied(&deny));
        assert_eq!(c.decision, Decision::Deny);
        assert_eq!(c.outcome, Outcome::Blocked);
        assert_eq!(c.summary, "blocked tool_not_allowlisted");
    }

    #[test]
    fn test_reason_comes_from_decision() {
        let deny = ToolDecision::deny("approval_required");
        assert_eq!(Attempt::Denied(&deny).reason(), "approval_required");

        let allow = ToolDecision::allow("approved");
        let result = ExecutionResult::Crash("x".into());
        let attempt = Attempt::Executed {
            decision: &allow,
            result: &result,
        };
        assert_eq!(attempt.reason(), "approved");
    }

    #[test]
    fn test_success_is_ok() {
        let output = ToolOutput::new(Map::new()).with_summary("bytes=11");
        let c = executed(&ExecutionResult::Success(output));
        assert_eq!(c.outcome, Outcome::Ok);
        assert_eq!(c.summary, "ok bytes=11");
    }

    #[test]
    fn test_guardrail_is_blocked() {
        let c = executed(&ExecutionResult::Guardrail(GuardrailCode::PathOutsideDataDir));
        assert_eq!(c.decision, Decision::Allow);
        assert_eq!(c.outcome, Outcome::Blocked);
        assert_eq!(c.summary, "error path_outside_data_dir");
    }

    #[test]
    fn test_unknown_failure_is_error() {
        let c = executed(&ExecutionResult::Failure {
            code: "quota_exceeded".into(),
            message: String::new(),
        });
        assert_eq!(c.outcome, Outcome::Error);
        assert_eq!(c.summary, "error quota_exceeded");
    }

    #[test]
    fn test_crash_is_error_and_bounded() {
        let c = executed(&ExecutionResult::Crash("x".repeat(1000)));
        assert_eq!(c.outcome, Outcome::Error);
        assert!(c.summary.starts_with("crash "));
        assert_eq!(c.summary.chars().count(), MAX_SUMMARY_CHARS);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&Outcome::Blocked).unwrap(), "\"blocked\"");
        assert_eq!(serde_json::to_string(&Decision::Allow).unwrap(), "\"allow\"");
    }

    proptest! {
        #[test]
        fn prop_summary_always_bounded(code in "\\PC{0,400}", reason in "\\PC{0,400}") {
            let c = executed(&ExecutionResult::Failure { code, message: String::new() });
            prop_assert!(c.summary.chars().count() <= MAX_SUMMARY_CHARS);

            let deny = ToolDecision::deny(reason);
            let c = OutcomeClassifier::classify(Attempt::Denied(&deny));
            prop_assert!(c.summary.chars().count() <= MAX_SUMMARY_CHARS);
        }
    }
}
