//! Error types for the template engine.
//!
//! - [`TemplateError`]: Every failure surfaced by registration, compilation and rendering.
//! - [`ErrorCode`] / [`ErrorCategory`]: Stable classification of those failures.

pub mod error_context;
pub mod template_error;

pub use error_context::{ErrorCategory, ErrorCode};
pub use template_error::TemplateError;

/// Convenience alias for template-level results.
pub type TemplateResult<T> = Result<T, TemplateError>;
