use templar_types::Value;

use crate::error::{TemplateError, TemplateResult};

/// Numeric view of a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Integer(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Template truthiness: null, false, 0, 0.0, "", "0" and empty containers are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Map(map) => !map.is_empty(),
        Value::Record(_) => true,
    }
}

/// Parse a numeric string (surrounding whitespace allowed).
pub fn parse_numeric(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    // reject "inf"/"nan" spellings that f64::from_str accepts
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().map(Number::Float)
}

/// Coerce for arithmetic. Null is 0, booleans are 0/1, numeric strings parse.
pub fn to_number(value: &Value) -> TemplateResult<Number> {
    match value {
        Value::Null => Ok(Number::Int(0)),
        Value::Bool(b) => Ok(Number::Int(i64::from(*b))),
        Value::Integer(i) => Ok(Number::Int(*i)),
        Value::Float(f) => Ok(Number::Float(*f)),
        Value::String(s) => parse_numeric(s).ok_or_else(|| {
            TemplateError::Execution(format!("Cannot convert '{}' to number", s))
        }),
        other => Err(TemplateError::Execution(format!(
            "Cannot convert {} to number",
            other.kind()
        ))),
    }
}

pub fn to_f64(value: &Value) -> TemplateResult<f64> {
    to_number(value).map(Number::as_f64)
}

/// Text form used by interpolation and concatenation.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => format_float(*f),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Map(_) | Value::Record(_) => value.to_json().to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        let text = if f > 0.0 { "INF" } else { "-INF" };
        text.to_string()
    } else {
        f.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::from("")));
        assert!(!is_truthy(&Value::from("0")));
        assert!(is_truthy(&Value::from("0.0")));
        assert!(!is_truthy(&Value::Integer(0)));
        assert!(!is_truthy(&Value::from(json!([]))));
        assert!(is_truthy(&Value::from(json!({"a": 1}))));
        assert!(is_truthy(&Value::Float(0.5)));
    }

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Value::Null).unwrap(), Number::Int(0));
        assert_eq!(to_number(&Value::Bool(true)).unwrap(), Number::Int(1));
        assert_eq!(to_number(&Value::from(" 42 ")).unwrap(), Number::Int(42));
        assert_eq!(to_number(&Value::from("2.5")).unwrap(), Number::Float(2.5));
        assert!(to_number(&Value::from("abc")).is_err());
        assert!(to_number(&Value::from("inf")).is_err());
        assert!(to_number(&Value::from(json!([1]))).is_err());
    }

    #[test]
    fn test_to_display_string() {
        assert_eq!(to_display_string(&Value::Null), "");
        assert_eq!(to_display_string(&Value::Bool(true)), "1");
        assert_eq!(to_display_string(&Value::Bool(false)), "");
        assert_eq!(to_display_string(&Value::Float(3.0)), "3");
        assert_eq!(to_display_string(&Value::Float(0.25)), "0.25");
        assert_eq!(to_display_string(&Value::from(json!([1, "a"]))), r#"[1,"a"]"#);
        assert_eq!(to_display_string(&Value::from(json!({"k": null}))), r#"{"k":null}"#);
    }
}
