use std::cmp::Ordering;

use templar_types::Value;

use super::ast::{BinaryOp, UnaryOp};
use super::type_coercion::{is_truthy, parse_numeric, to_display_string, to_number, Number};
use crate::error::{TemplateError, TemplateResult};

/// Apply a non short-circuiting binary operator.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> TemplateResult<Value> {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => arithmetic(op, left, right),
        BinaryOp::Div => divide(left, right),
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Concat => Ok(Value::String(format!(
            "{}{}",
            to_display_string(left),
            to_display_string(right)
        ))),
        BinaryOp::Eq => Ok(Value::Bool(loose_equals(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!loose_equals(left, right))),
        BinaryOp::Identical => Ok(Value::Bool(left == right)),
        BinaryOp::NotIdentical => Ok(Value::Bool(left != right)),
        BinaryOp::Lt => compare(left, right).map(|o| Value::Bool(o == Ordering::Less)),
        BinaryOp::Le => compare(left, right).map(|o| Value::Bool(o != Ordering::Greater)),
        BinaryOp::Gt => compare(left, right).map(|o| Value::Bool(o == Ordering::Greater)),
        BinaryOp::Ge => compare(left, right).map(|o| Value::Bool(o != Ordering::Less)),
    }
}

pub fn apply_unary(op: UnaryOp, operand: &Value) -> TemplateResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!is_truthy(operand))),
        UnaryOp::Neg => Ok(match to_number(operand)? {
            Number::Int(i) => i
                .checked_neg()
                .map_or(Value::Float(-(i as f64)), Value::Integer),
            Number::Float(f) => Value::Float(-f),
        }),
    }
}

/// `+ - *` with integer results when both sides are integers and the
/// result fits, floats otherwise.
fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> TemplateResult<Value> {
    let (a, b) = (to_number(left)?, to_number(right)?);
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        let exact = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            _ => x.checked_mul(y),
        };
        if let Some(n) = exact {
            return Ok(Value::Integer(n));
        }
    }
    let (x, y) = (a.as_f64(), b.as_f64());
    Ok(Value::Float(match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        _ => x * y,
    }))
}

fn divide(left: &Value, right: &Value) -> TemplateResult<Value> {
    let (a, b) = (to_number(left)?, to_number(right)?);
    if b.as_f64() == 0.0 {
        return Err(TemplateError::Execution("Division by zero".to_string()));
    }
    if let (Number::Int(x), Number::Int(y)) = (a, b) {
        if let (Some(0), Some(q)) = (x.checked_rem(y), x.checked_div(y)) {
            return Ok(Value::Integer(q));
        }
    }
    Ok(Value::Float(a.as_f64() / b.as_f64()))
}

/// Integer remainder; operands are truncated toward zero first.
fn modulo(left: &Value, right: &Value) -> TemplateResult<Value> {
    let truncate = |n: Number| match n {
        Number::Int(i) => i,
        Number::Float(f) => f.trunc() as i64,
    };
    let (x, y) = (truncate(to_number(left)?), truncate(to_number(right)?));
    if y == 0 {
        return Err(TemplateError::Execution("Modulo by zero".to_string()));
    }
    Ok(Value::Integer(x.checked_rem(y).unwrap_or(0)))
}

/// Loose (`==`) equality.
///
/// Null and booleans compare by truthiness, numbers and numeric strings
/// compare numerically, containers compare element-wise.
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(_), _) | (_, Value::Bool(_)) | (Value::Null, _) | (_, Value::Null) => {
            is_truthy(left) == is_truthy(right)
        }
        (Value::Integer(a), Value::Integer(b)) => a == b,
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            numeric(left) == numeric(right)
        }
        (Value::Integer(_) | Value::Float(_), Value::String(s))
        | (Value::String(s), Value::Integer(_) | Value::Float(_)) => match parse_numeric(s) {
            Some(n) => {
                let other = if matches!(left, Value::String(_)) { right } else { left };
                numeric(other) == Some(n.as_f64())
            }
            None => to_display_string(left) == to_display_string(right),
        },
        (Value::String(a), Value::String(b)) => match (parse_numeric(a), parse_numeric(b)) {
            (Some(x), Some(y)) => x.as_f64() == y.as_f64(),
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| loose_equals(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| loose_equals(v, w)))
        }
        _ => left == right,
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Ordering for `< <= > >=`.
///
/// Numbers (including null, booleans and numeric strings) compare
/// numerically; two non-numeric strings compare lexicographically. Anything
/// else is an execution fault.
pub fn compare(left: &Value, right: &Value) -> TemplateResult<Ordering> {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        if parse_numeric(a).is_none() || parse_numeric(b).is_none() {
            return Ok(a.cmp(b));
        }
    }
    let incomparable = || {
        TemplateError::Execution(format!(
            "Cannot compare {} with {}",
            left.kind(),
            right.kind()
        ))
    };
    if let (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) = (left, right) {
        if parse_numeric(s).is_none() {
            let ordering = "".cmp(s.as_str());
            return Ok(if matches!(left, Value::Null) {
                ordering
            } else {
                ordering.reverse()
            });
        }
    }
    let a = to_number(left).map_err(|_| incomparable())?;
    let b = to_number(right).map_err(|_| incomparable())?;
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => Ok(x.cmp(&y)),
        _ => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(incomparable),
    }
}
