use serde::{Deserialize, Serialize};

/// Where in the pipeline an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Directive or function registration; raised at start-up.
    Registration,
    /// Locating or reading template source.
    Source,
    /// Lowering or running a compiled template.
    Execution,
}

/// Error classification code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Registration
    DuplicateDirective,
    InvalidDirective,
    DuplicateFunction,

    // Source
    TemplateNotFound,
    SourceUnreadable,

    // Execution
    InvalidPath,
    InvalidContext,
    SyntaxError,
    ExecutionError,
    LoopLimitExceeded,
    SerializationError,
}

impl ErrorCode {
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::DuplicateDirective
            | ErrorCode::InvalidDirective
            | ErrorCode::DuplicateFunction => ErrorCategory::Registration,
            ErrorCode::TemplateNotFound | ErrorCode::SourceUnreadable => ErrorCategory::Source,
            ErrorCode::InvalidPath
            | ErrorCode::InvalidContext
            | ErrorCode::SyntaxError
            | ErrorCode::ExecutionError
            | ErrorCode::LoopLimitExceeded
            | ErrorCode::SerializationError => ErrorCategory::Execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCode::TemplateNotFound).unwrap();
        assert_eq!(json, "\"template_not_found\"");
    }
}
