pub mod artifact;
pub mod cache;
pub mod compiler;
pub mod transformer;

pub use artifact::{CompiledArtifact, CompiledTemplate, TemplateSource, INLINE_IDENTIFIER};
pub use cache::{ArtifactCache, CacheEntry, CacheStats, ARTIFACT_EXTENSION};
pub use compiler::TemplateCompiler;
pub use transformer::SyntaxTransformer;
