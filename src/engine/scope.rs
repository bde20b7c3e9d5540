use std::collections::HashMap;

use templar_types::Value;

use crate::core::context::DataContext;
use crate::core::variable_path::VariableLookup;
use crate::evaluator::Environment;

/// Render-time scope: locals (loop variables, `@php` assignments) shadow
/// the caller's context. Locals are flat and outlive the loop that set
/// them; the context itself is never written.
pub struct Scope<'c> {
    context: &'c DataContext,
    locals: HashMap<String, Value>,
}

impl<'c> Scope<'c> {
    pub fn new(context: &'c DataContext) -> Self {
        Self {
            context,
            locals: HashMap::new(),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub fn locals(&self) -> &HashMap<String, Value> {
        &self.locals
    }
}

impl VariableLookup for Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals.get(name).or_else(|| self.context.get(name))
    }
}

impl Environment for Scope<'_> {
    fn assign(&mut self, name: &str, value: Value) {
        self.set(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locals_shadow_context() {
        let ctx = DataContext::new().with("name", "ctx").with("other", 1);
        let mut scope = Scope::new(&ctx);
        assert_eq!(scope.lookup("name"), Some(&Value::from("ctx")));
        scope.assign("name", Value::from("local"));
        assert_eq!(scope.lookup("name"), Some(&Value::from("local")));
        assert_eq!(scope.lookup("other"), Some(&Value::Integer(1)));
        assert_eq!(ctx.get("name"), Some(&Value::from("ctx")));
    }
}
