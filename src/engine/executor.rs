use templar_types::{Value, ValueDumper};

use super::program::{Node, Program};
use super::scope::Scope;
use crate::core::context::DataContext;
use crate::error::{TemplateError, TemplateResult};
use crate::evaluator::ast::{Expr, Stmt};
use crate::evaluator::{evaluate, execute_all, is_truthy, to_display_string, FunctionRegistry};
use crate::template::escape::escape_html;

/// Interprets node programs.
///
/// Output is buffered; on any fault the partial buffer is dropped and only
/// the error reaches the caller.
pub struct Executor<'a> {
    functions: &'a FunctionRegistry,
    dumper: &'a dyn ValueDumper,
    max_loop_iterations: usize,
}

impl<'a> Executor<'a> {
    pub fn new(functions: &'a FunctionRegistry, dumper: &'a dyn ValueDumper) -> Self {
        Self {
            functions,
            dumper,
            max_loop_iterations: 0,
        }
    }

    /// Cap on iterations of any single loop, 0 = unlimited.
    pub fn with_max_loop_iterations(mut self, max: usize) -> Self {
        self.max_loop_iterations = max;
        self
    }

    pub fn execute(&self, program: &Program, context: &DataContext) -> TemplateResult<String> {
        let mut scope = Scope::new(context);
        let mut out = String::new();
        self.run(program.nodes(), &mut scope, &mut out)?;
        Ok(out)
    }

    fn run(&self, nodes: &[Node], scope: &mut Scope<'_>, out: &mut String) -> TemplateResult<()> {
        for node in nodes {
            self.node(node, scope, out)?;
        }
        Ok(())
    }

    fn node(&self, node: &Node, scope: &mut Scope<'_>, out: &mut String) -> TemplateResult<()> {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Print(expr) => {
                let value = self.eval(expr, scope)?;
                out.push_str(&escape_html(&to_display_string(&value)));
            }
            Node::Echo(expr) => {
                let value = self.eval(expr, scope)?;
                out.push_str(&to_display_string(&value));
            }
            Node::Dump(expr) => {
                let value = self.eval(expr, scope)?;
                out.push_str(&self.dumper.dump(&value));
            }
            Node::Exec(stmts) => self.exec(stmts, scope)?,
            Node::If {
                branches,
                otherwise,
            } => {
                for (condition, body) in branches {
                    if self.test(condition, scope)? {
                        return self.run(body, scope, out);
                    }
                }
                if let Some(body) = otherwise {
                    self.run(body, scope, out)?;
                }
            }
            Node::Foreach {
                iterable,
                key,
                value,
                body,
            } => {
                let items = iteration_items(self.eval(iterable, scope)?)?;
                let mut guard = self.guard();
                for (k, v) in items {
                    guard.tick()?;
                    if let Some(key) = key {
                        scope.set(key.as_str(), k);
                    }
                    scope.set(value.as_str(), v);
                    self.run(body, scope, out)?;
                }
            }
            Node::For {
                init,
                condition,
                step,
                body,
            } => {
                self.exec(init, scope)?;
                let mut guard = self.guard();
                loop {
                    if let Some(condition) = condition {
                        if !self.test(condition, scope)? {
                            break;
                        }
                    }
                    guard.tick()?;
                    self.run(body, scope, out)?;
                    self.exec(step, scope)?;
                }
            }
            Node::While { condition, body } => {
                let mut guard = self.guard();
                while self.test(condition, scope)? {
                    guard.tick()?;
                    self.run(body, scope, out)?;
                }
            }
            Node::DoWhile { body, condition } => {
                let mut guard = self.guard();
                loop {
                    guard.tick()?;
                    self.run(body, scope, out)?;
                    if !self.test(condition, scope)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> TemplateResult<Value> {
        evaluate(expr, scope, self.functions)
    }

    fn test(&self, expr: &Expr, scope: &Scope<'_>) -> TemplateResult<bool> {
        self.eval(expr, scope).map(|v| is_truthy(&v))
    }

    fn exec(&self, stmts: &[Stmt], scope: &mut Scope<'_>) -> TemplateResult<()> {
        execute_all(stmts, scope, self.functions)
    }

    fn guard(&self) -> LoopGuard {
        LoopGuard {
            limit: self.max_loop_iterations,
            count: 0,
        }
    }
}

struct LoopGuard {
    limit: usize,
    count: usize,
}

impl LoopGuard {
    fn tick(&mut self) -> TemplateResult<()> {
        self.count += 1;
        if self.limit > 0 && self.count > self.limit {
            return Err(TemplateError::LoopLimitExceeded(self.limit));
        }
        Ok(())
    }
}

/// Key/value pairs for `foreach`. Null iterates zero times; scalars fault.
fn iteration_items(value: Value) -> TemplateResult<Vec<(Value, Value)>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (Value::from(i), v))
            .collect()),
        Value::Map(map) => Ok(map.into_iter().map(|(k, v)| (Value::String(k), v)).collect()),
        Value::Record(record) => Ok(record
            .field_names()
            .into_iter()
            .map(|name| {
                let value = record.field(&name).unwrap_or_default();
                (Value::String(name), value)
            })
            .collect()),
        other => Err(TemplateError::Execution(format!(
            "Cannot iterate over {}",
            other.kind()
        ))),
    }
}
