use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::fragment::CodeFragment;
use crate::core::variable_path::is_identifier;
use crate::error::{TemplateError, TemplateResult};

/// A directive: `@name` or `@name(args)` rewritten into a code fragment.
pub trait Directive: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the directive takes a parenthesized argument list.
    fn has_arguments(&self) -> bool;

    /// Build the replacement for one occurrence. `argument` is the raw text
    /// between the parentheses (empty for argument-less directives).
    fn compile(&self, argument: &str) -> CodeFragment;
}

/// Closure-backed directive used by [`DirectiveRegistry::register`].
pub struct FnDirective<F> {
    name: String,
    has_arguments: bool,
    handler: F,
}

impl<F> FnDirective<F>
where
    F: Fn(&str) -> CodeFragment + Send + Sync,
{
    pub fn new(name: impl Into<String>, has_arguments: bool, handler: F) -> Self {
        Self {
            name: name.into(),
            has_arguments,
            handler,
        }
    }
}

impl<F> Directive for FnDirective<F>
where
    F: Fn(&str) -> CodeFragment + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn has_arguments(&self) -> bool {
        self.has_arguments
    }

    fn compile(&self, argument: &str) -> CodeFragment {
        (self.handler)(argument)
    }
}

/// A registered directive plus its compiled trigger pattern.
#[derive(Clone)]
pub struct DirectiveSpec {
    directive: Arc<dyn Directive>,
    trigger: Regex,
}

impl DirectiveSpec {
    fn new(directive: Arc<dyn Directive>) -> TemplateResult<Self> {
        let name = directive.name();
        if !is_identifier(name) {
            return Err(TemplateError::InvalidDirective {
                name: name.to_string(),
                reason: "name must match [A-Za-z_][A-Za-z0-9_]*".to_string(),
            });
        }
        let pattern = if directive.has_arguments() {
            format!(r"@{}\s*\(", regex::escape(name))
        } else {
            format!(r"@{}\b", regex::escape(name))
        };
        let trigger = Regex::new(&pattern).map_err(|e| TemplateError::InvalidDirective {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { directive, trigger })
    }

    pub fn name(&self) -> &str {
        self.directive.name()
    }

    pub fn has_arguments(&self) -> bool {
        self.directive.has_arguments()
    }

    pub fn directive(&self) -> &Arc<dyn Directive> {
        &self.directive
    }

    /// Pattern matching `@name(` (with arguments) or `@name` at a word
    /// boundary (without).
    pub fn trigger(&self) -> &Regex {
        &self.trigger
    }

    pub fn compile(&self, argument: &str) -> CodeFragment {
        self.directive.compile(argument)
    }
}

impl fmt::Debug for DirectiveSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveSpec")
            .field("name", &self.name())
            .field("has_arguments", &self.has_arguments())
            .field("trigger", &self.trigger.as_str())
            .finish()
    }
}

/// Ordered directive table. Names are unique; registration order is the
/// order the directive pass applies them in.
#[derive(Debug, Clone, Default)]
pub struct DirectiveRegistry {
    specs: Vec<DirectiveSpec>,
    index: HashMap<String, usize>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a closure directive.
    pub fn register<F>(&mut self, name: &str, has_arguments: bool, handler: F) -> TemplateResult<()>
    where
        F: Fn(&str) -> CodeFragment + Send + Sync + 'static,
    {
        self.register_directive(Arc::new(FnDirective::new(name, has_arguments, handler)))
    }

    /// Register a directive object. Fails without modifying the registry
    /// when the name is taken or not an identifier.
    pub fn register_directive(&mut self, directive: Arc<dyn Directive>) -> TemplateResult<()> {
        if self.index.contains_key(directive.name()) {
            return Err(TemplateError::DuplicateDirective(directive.name().to_string()));
        }
        let spec = DirectiveSpec::new(directive)?;
        tracing::debug!(
            directive = %spec.name(),
            has_arguments = spec.has_arguments(),
            "Registered directive"
        );
        self.index.insert(spec.name().to_string(), self.specs.len());
        self.specs.push(spec);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<&DirectiveSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DirectiveSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(DirectiveSpec::name).collect()
    }
}
