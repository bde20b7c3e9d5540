use tracing::debug;

use super::artifact::{CompiledArtifact, CompiledTemplate, TemplateSource};
use super::transformer::SyntaxTransformer;
use crate::directives::DirectiveRegistry;
use crate::error::TemplateResult;

/// Source text to artifact to program.
pub struct TemplateCompiler<'r> {
    directives: &'r DirectiveRegistry,
}

impl<'r> TemplateCompiler<'r> {
    pub fn new(directives: &'r DirectiveRegistry) -> Self {
        Self { directives }
    }

    /// Run the syntax transformer. Deterministic for a given registry.
    pub fn transform(&self, text: &str) -> CompiledArtifact {
        CompiledArtifact::new(SyntaxTransformer::new(self.directives).transform(text))
    }

    pub fn compile(&self, source: &TemplateSource) -> TemplateResult<CompiledTemplate> {
        let artifact = self.transform(source.text());
        let compiled = CompiledTemplate::from_artifact(artifact)?;
        debug!(
            source = %source.identifier(),
            nodes = compiled.program().len(),
            "Compiled template"
        );
        Ok(compiled)
    }

    pub fn compile_text(&self, text: &str) -> TemplateResult<CompiledTemplate> {
        self.compile(&TemplateSource::inline(text))
    }
}
