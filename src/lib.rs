//! # Templar: a directive-and-interpolation template engine
//!
//! `templar` compiles templates written with `%path%` interpolation,
//! `%!path!%` debug dumps and `@directive(args)` blocks into an artifact of
//! instruction tags, caches that artifact on disk keyed by source freshness,
//! and renders it against per-call data:
//!
//! - **Path resolution**: dotted paths (`user.address.city`, `items.0`) walk
//!   maps, arrays and structured records; missing segments render empty.
//! - **Directives**: a pluggable, ordered registry. Built-ins cover
//!   conditionals, loops, inline statements, JSON, dates and dumps.
//! - **Expressions**: a small language with PHP-style loose comparisons,
//!   function calls and assignments, interpreted from a lowered node program.
//! - **Artifact cache**: compiled artifacts are stored under the cache
//!   directory and rebuilt when the source is newer.
//! - **Components**: render partials with props and named slots.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use templar::{DataContext, Templar};
//!
//! let templar = Templar::builder().build().unwrap();
//! let context = DataContext::from_json(json!({"user": {"name": "Ann"}})).unwrap();
//! let html = templar
//!     .render_from_text("@if($user.name)Hello %user.name%@endif", &context)
//!     .unwrap();
//! assert_eq!(html, "Hello Ann");
//! ```
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `components` | Component rendering with slot injection (default) |

pub mod api;
pub mod compiler;
pub mod core;
pub mod directives;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod template;

pub use crate::api::{Templar, TemplarBuilder};
pub use crate::compiler::{
    ArtifactCache, CacheEntry, CacheStats, CompiledArtifact, CompiledTemplate, SyntaxTransformer,
    TemplateCompiler, TemplateSource,
};
pub use crate::core::{DataContext, PathSegment, TemplarConfig, VariableLookup, VariablePath};
pub use crate::directives::{
    create_default_registry, CodeFragment, Directive, DirectiveRegistry, DirectiveSpec,
    FnDirective,
};
pub use crate::engine::{Executor, Node, Program};
pub use crate::error::{ErrorCategory, ErrorCode, TemplateError, TemplateResult};
pub use crate::evaluator::FunctionRegistry;
pub use crate::template::HtmlDumper;
pub use templar_types::{Map, Record, TemplateFunction, Value, ValueDumper};
