use templar_types::Value;

use super::ast::{AssignOp, BinaryOp, Expr, LogicalOp, Stmt};
use super::functions::FunctionRegistry;
use super::operators::{apply_binary, apply_unary};
use super::type_coercion::is_truthy;
use crate::core::variable_path::{resolve_segment, PathSegment, VariableLookup};
use crate::error::TemplateResult;

/// Variable scope that statements can write to.
pub trait Environment: VariableLookup {
    fn assign(&mut self, name: &str, value: Value);
}

/// Evaluate an expression. Absent paths evaluate to null.
pub fn evaluate<E: Environment + ?Sized>(
    expr: &Expr,
    env: &E,
    functions: &FunctionRegistry,
) -> TemplateResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => Ok(path.resolve(env).unwrap_or_default()),
        Expr::Member { target, segment } => {
            let target = evaluate(target, env, functions)?;
            Ok(resolve_segment(&target, segment).unwrap_or_default())
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, env, functions)?;
            let index = evaluate(index, env, functions)?;
            Ok(index_segment(&index)
                .and_then(|segment| resolve_segment(&target, &segment))
                .unwrap_or_default())
        }
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|a| evaluate(a, env, functions))
                .collect::<TemplateResult<Vec<_>>>()?;
            functions.call(name, &args)
        }
        Expr::Unary { op, operand } => apply_unary(*op, &evaluate(operand, env, functions)?),
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, env, functions)?;
            let right = evaluate(right, env, functions)?;
            apply_binary(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, env, functions)?;
            match op {
                LogicalOp::And if !is_truthy(&left) => Ok(Value::Bool(false)),
                LogicalOp::Or if is_truthy(&left) => Ok(Value::Bool(true)),
                LogicalOp::And | LogicalOp::Or => {
                    Ok(Value::Bool(is_truthy(&evaluate(right, env, functions)?)))
                }
                LogicalOp::Coalesce if left.is_null() => evaluate(right, env, functions),
                LogicalOp::Coalesce => Ok(left),
            }
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if is_truthy(&evaluate(condition, env, functions)?) {
                evaluate(then, env, functions)
            } else {
                evaluate(otherwise, env, functions)
            }
        }
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, env, functions))
            .collect::<TemplateResult<Vec<_>>>()
            .map(Value::Array),
    }
}

/// Run one statement, writing assignments into `env`.
pub fn execute<E: Environment + ?Sized>(
    stmt: &Stmt,
    env: &mut E,
    functions: &FunctionRegistry,
) -> TemplateResult<()> {
    match stmt {
        Stmt::Assign { target, op, value } => {
            let value = evaluate(value, env, functions)?;
            let value = match op {
                AssignOp::Set => value,
                AssignOp::Add => apply_binary(BinaryOp::Add, &current(env, target), &value)?,
                AssignOp::Sub => apply_binary(BinaryOp::Sub, &current(env, target), &value)?,
                AssignOp::Concat => {
                    apply_binary(BinaryOp::Concat, &current(env, target), &value)?
                }
            };
            env.assign(target, value);
        }
        Stmt::Increment(name) => {
            let value = apply_binary(BinaryOp::Add, &current(env, name), &Value::Integer(1))?;
            env.assign(name, value);
        }
        Stmt::Decrement(name) => {
            let value = apply_binary(BinaryOp::Sub, &current(env, name), &Value::Integer(1))?;
            env.assign(name, value);
        }
        Stmt::Expr(expr) => {
            evaluate(expr, env, functions)?;
        }
    }
    Ok(())
}

pub fn execute_all<E: Environment + ?Sized>(
    stmts: &[Stmt],
    env: &mut E,
    functions: &FunctionRegistry,
) -> TemplateResult<()> {
    stmts.iter().try_for_each(|stmt| execute(stmt, env, functions))
}

fn current<E: Environment + ?Sized>(env: &E, name: &str) -> Value {
    env.lookup(name).cloned().unwrap_or_default()
}

/// `a[expr]`: integers index arrays, strings are keys (canonical digits
/// still index), anything else misses.
fn index_segment(index: &Value) -> Option<PathSegment> {
    match index {
        Value::Integer(i) => Some(
            usize::try_from(*i).map_or_else(|_| PathSegment::Key(i.to_string()), PathSegment::Index),
        ),
        Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(PathSegment::Index(*f as usize)),
        Value::String(s) => Some(PathSegment::parse(s)),
        Value::Bool(b) => Some(PathSegment::Index(usize::from(*b))),
        _ => None,
    }
}
