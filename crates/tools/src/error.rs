use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of expected, domain-level failures a handler may report.
///
/// Anything outside this set is treated as an unexpected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailCode {
    PathOutsideDataDir,
    FileNotFound,
    FileTooLarge,
    /// A path without the sensitive suffix resolved to a file that has it.
    SensitiveTarget,
}

impl GuardrailCode {
    pub const ALL: [GuardrailCode; 4] = [
        GuardrailCode::PathOutsideDataDir,
        GuardrailCode::FileNotFound,
        GuardrailCode::FileTooLarge,
        GuardrailCode::SensitiveTarget,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardrailCode::PathOutsideDataDir => "path_outside_data_dir",
            GuardrailCode::FileNotFound => "file_not_found",
            GuardrailCode::FileTooLarge => "file_too_large",
            GuardrailCode::SensitiveTarget => "sensitive_target",
        }
    }
}

impl fmt::Display for GuardrailCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GuardrailCode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GuardrailCode::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or(())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Guardrail: {0}")]
    Guardrail(GuardrailCode),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Execution failed ({code}): {message}")]
    Execution { code: String, message: String },
}

impl ToolError {
    /// Builds an error from a handler-reported code. Codes in the guardrail
    /// set become [`ToolError::Guardrail`].
    pub fn from_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        match code.parse::<GuardrailCode>() {
            Ok(guardrail) => ToolError::Guardrail(guardrail),
            Err(()) => ToolError::Execution {
                code,
                message: message.into(),
            },
        }
    }

    pub fn code(&self) -> &str {
        match self {
            ToolError::Guardrail(code) => code.as_str(),
            ToolError::Validation(_) => "invalid_request",
            ToolError::Execution { code, .. } => code,
        }
    }
}

impl From<GuardrailCode> for ToolError {
    fn from(code: GuardrailCode) -> Self {
        ToolError::Guardrail(code)
    }
}
