use std::path::PathBuf;

use thiserror::Error;

use super::{ErrorCategory, ErrorCode};

/// Template engine errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Directive already registered: {0}")]
    DuplicateDirective(String),
    #[error("Invalid directive '{name}': {reason}")]
    InvalidDirective { name: String, reason: String },
    #[error("Function already registered: {0}")]
    DuplicateFunction(String),
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid variable path: {0}")]
    InvalidPath(String),
    #[error("Invalid context: {0}")]
    InvalidContext(String),
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("Execution error: {0}")]
    Execution(String),
    #[error("Loop exceeded {0} iterations")]
    LoopLimitExceeded(usize),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TemplateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TemplateError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn syntax(offset: usize, message: impl Into<String>) -> Self {
        TemplateError::Syntax {
            offset,
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TemplateError::DuplicateDirective(_) => ErrorCode::DuplicateDirective,
            TemplateError::InvalidDirective { .. } => ErrorCode::InvalidDirective,
            TemplateError::DuplicateFunction(_) => ErrorCode::DuplicateFunction,
            TemplateError::TemplateNotFound(_) => ErrorCode::TemplateNotFound,
            TemplateError::Io { .. } => ErrorCode::SourceUnreadable,
            TemplateError::InvalidPath(_) => ErrorCode::InvalidPath,
            TemplateError::InvalidContext(_) => ErrorCode::InvalidContext,
            TemplateError::Syntax { .. } => ErrorCode::SyntaxError,
            TemplateError::Execution(_) => ErrorCode::ExecutionError,
            TemplateError::LoopLimitExceeded(_) => ErrorCode::LoopLimitExceeded,
            TemplateError::Serialization(_) => ErrorCode::SerializationError,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.code().category()
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(e: serde_json::Error) -> Self {
        TemplateError::Serialization(e.to_string())
    }
}
