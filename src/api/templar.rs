//! Template engine facade.
//!
//! [`Templar`] (constructed directly or via [`TemplarBuilder`]) owns the
//! directive registry, the function table, the value dumper and the artifact
//! cache. Registration needs `&mut self`; rendering only needs `&self`, so a
//! configured engine can be shared across threads.

#[cfg(feature = "components")]
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use templar_types::{TemplateFunction, ValueDumper};

use crate::compiler::{ArtifactCache, CompiledTemplate, TemplateCompiler, TemplateSource};
use crate::core::config::TemplarConfig;
use crate::core::context::DataContext;
use crate::directives::{create_default_registry, CodeFragment, Directive, DirectiveRegistry};
use crate::engine::Executor;
use crate::error::TemplateResult;
use crate::evaluator::FunctionRegistry;
use crate::template::dumper::HtmlDumper;

pub struct Templar {
    config: TemplarConfig,
    directives: DirectiveRegistry,
    functions: FunctionRegistry,
    dumper: Arc<dyn ValueDumper>,
    cache: ArtifactCache,
}

impl Templar {
    /// Engine with the built-in directives, functions and HTML dumper.
    pub fn new(config: TemplarConfig) -> TemplateResult<Self> {
        let cache = ArtifactCache::new(config.cache_path.clone());
        Ok(Self {
            config,
            directives: create_default_registry()?,
            functions: FunctionRegistry::with_builtins(),
            dumper: Arc::new(HtmlDumper),
            cache,
        })
    }

    pub fn builder() -> TemplarBuilder {
        TemplarBuilder::default()
    }

    /// Register a closure directive. Fails on a name collision.
    pub fn register_directive<F>(
        &mut self,
        name: &str,
        has_arguments: bool,
        handler: F,
    ) -> TemplateResult<()>
    where
        F: Fn(&str) -> CodeFragment + Send + Sync + 'static,
    {
        self.directives.register(name, has_arguments, handler)
    }

    /// Register a directive object. Fails on a name collision.
    pub fn add_directive(&mut self, directive: Arc<dyn Directive>) -> TemplateResult<()> {
        self.directives.register_directive(directive)
    }

    pub fn register_function(&mut self, function: Arc<dyn TemplateFunction>) -> TemplateResult<()> {
        self.functions.register(function)
    }

    /// Run a setup callback against this engine, e.g. to register a bundle
    /// of directives and functions in one place.
    pub fn boot<F>(&mut self, setup: F) -> TemplateResult<()>
    where
        F: FnOnce(&mut Self) -> TemplateResult<()>,
    {
        setup(self)
    }

    /// Render `<view_path>/<view>.<extension>`, reusing a fresh artifact.
    pub fn render(&self, view: &str, context: &DataContext) -> TemplateResult<String> {
        let span = tracing::debug_span!("render", view = %view);
        let _enter = span.enter();
        let source = TemplateSource::from_file(self.template_path(view))?;
        let compiled = self.cache.get_or_compile(&source, &self.compiler())?;
        self.execute(&compiled, context)
    }

    /// Compile and render text directly. Never touches the cache.
    pub fn render_from_text(&self, text: &str, context: &DataContext) -> TemplateResult<String> {
        let span = tracing::debug_span!("render_from_text", len = text.len());
        let _enter = span.enter();
        let compiled = self.compile_text(text)?;
        self.execute(&compiled, context)
    }

    pub fn compile_text(&self, text: &str) -> TemplateResult<CompiledTemplate> {
        self.compiler().compile_text(text)
    }

    /// Render `<components_path>/<name>.<extension>` with `props` as its
    /// context, then substitute slot markers in the output.
    #[cfg(feature = "components")]
    pub fn render_component(
        &self,
        name: &str,
        props: &DataContext,
        slots: &BTreeMap<String, String>,
    ) -> TemplateResult<String> {
        let span = tracing::debug_span!("render_component", component = %name);
        let _enter = span.enter();
        let path = self
            .config
            .components_path
            .join(format!("{}.{}", name, self.config.extension));
        let source = TemplateSource::from_file(path)?;
        let compiled = self.cache.get_or_compile(&source, &self.compiler())?;
        let content = self.execute(&compiled, props)?;
        Ok(crate::template::inject_slots(&content, slots))
    }

    pub fn template_path(&self, view: &str) -> PathBuf {
        self.config
            .view_path
            .join(format!("{}.{}", view, self.config.extension))
    }

    pub fn config(&self) -> &TemplarConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn directives(&self) -> &DirectiveRegistry {
        &self.directives
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    fn compiler(&self) -> TemplateCompiler<'_> {
        TemplateCompiler::new(&self.directives)
    }

    fn execute(&self, compiled: &CompiledTemplate, context: &DataContext) -> TemplateResult<String> {
        Executor::new(&self.functions, self.dumper.as_ref())
            .with_max_loop_iterations(self.config.max_loop_iterations)
            .execute(compiled.program(), context)
    }
}

/// Builder for a [`Templar`] with custom directives, functions or dumper.
///
/// Registration errors are collected and reported by [`build`](Self::build).
pub struct TemplarBuilder {
    config: TemplarConfig,
    directives: Vec<Arc<dyn Directive>>,
    functions: Vec<Arc<dyn TemplateFunction>>,
    dumper: Option<Arc<dyn ValueDumper>>,
}

impl Default for TemplarBuilder {
    fn default() -> Self {
        Self {
            config: TemplarConfig::default(),
            directives: Vec::new(),
            functions: Vec::new(),
            dumper: None,
        }
    }
}

impl TemplarBuilder {
    pub fn config(mut self, config: TemplarConfig) -> Self {
        self.config = config;
        self
    }

    pub fn view_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.view_path = path.into();
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = path.into();
        self
    }

    pub fn components_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.components_path = path.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.config.extension = extension.into();
        self
    }

    /// Per-loop iteration cap, 0 = unlimited.
    pub fn max_loop_iterations(mut self, max: usize) -> Self {
        self.config.max_loop_iterations = max;
        self
    }

    pub fn directive(mut self, directive: Arc<dyn Directive>) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn function(mut self, function: Arc<dyn TemplateFunction>) -> Self {
        self.functions.push(function);
        self
    }

    pub fn dumper(mut self, dumper: Arc<dyn ValueDumper>) -> Self {
        self.dumper = Some(dumper);
        self
    }

    pub fn build(self) -> TemplateResult<Templar> {
        let mut templar = Templar::new(self.config)?;
        for directive in self.directives {
            templar.add_directive(directive)?;
        }
        for function in self.functions {
            templar.register_function(function)?;
        }
        if let Some(dumper) = self.dumper {
            templar.dumper = dumper;
        }
        Ok(templar)
    }
}
