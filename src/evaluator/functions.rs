//! Function table for `name(args)` calls inside instructions.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use templar_types::{TemplateFunction, Value};

use super::type_coercion::{is_truthy, to_display_string, to_number, Number};
use crate::error::{TemplateError, TemplateResult};
use crate::template::escape::escape_html;

/// Largest list `range()` will build.
pub const MAX_RANGE_LEN: usize = 1_000_000;

pub const DEFAULT_DATE_FORMAT: &str = "Y-m-d";

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn TemplateFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every built-in function.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for builtin in BUILTINS {
            registry
                .functions
                .insert(builtin.name.to_string(), Arc::new(*builtin));
        }
        registry
    }

    pub fn register(&mut self, function: Arc<dyn TemplateFunction>) -> TemplateResult<()> {
        let name = function.name().to_string();
        if self.functions.contains_key(&name) {
            return Err(TemplateError::DuplicateFunction(name));
        }
        tracing::debug!(function = %name, "Registered template function");
        self.functions.insert(name, function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn TemplateFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Invoke `name`, mapping a missing function or a function failure to
    /// an execution fault.
    pub fn call(&self, name: &str, args: &[Value]) -> TemplateResult<Value> {
        let function = self
            .get(name)
            .ok_or_else(|| TemplateError::Execution(format!("Unknown function '{}'", name)))?;
        function
            .call(args)
            .map_err(|e| TemplateError::Execution(format!("{}(): {}", name, e)))
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

// ================================
// Built-ins
// ================================

type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Clone, Copy)]
struct Builtin {
    name: &'static str,
    call: BuiltinFn,
}

impl TemplateFunction for Builtin {
    fn name(&self) -> &str {
        self.name
    }

    fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.call)(args)
    }
}

const BUILTINS: &[Builtin] = &[
    Builtin { name: "upper", call: upper },
    Builtin { name: "lower", call: lower },
    Builtin { name: "trim", call: trim },
    Builtin { name: "count", call: count },
    Builtin { name: "json", call: json },
    Builtin { name: "date", call: date },
    Builtin { name: "default", call: default },
    Builtin { name: "escape", call: escape },
    Builtin { name: "range", call: range },
    Builtin { name: "join", call: join },
    Builtin { name: "keys", call: keys },
];

fn arg(args: &[Value], index: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    args.get(index).unwrap_or(NULL)
}

fn expect_args(args: &[Value], min: usize, max: usize) -> Result<(), String> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(format!("expected {} argument(s), got {}", expected, args.len()));
    }
    Ok(())
}

fn upper(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 1)?;
    Ok(Value::String(to_display_string(&args[0]).to_uppercase()))
}

fn lower(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 1)?;
    Ok(Value::String(to_display_string(&args[0]).to_lowercase()))
}

fn trim(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 1)?;
    Ok(Value::String(to_display_string(&args[0]).trim().to_string()))
}

fn count(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 1)?;
    let n = match &args[0] {
        Value::Null => 0,
        Value::Array(items) => items.len(),
        Value::Map(map) => map.len(),
        Value::Record(record) => record.field_names().len(),
        Value::String(s) => s.chars().count(),
        _ => 1,
    };
    Ok(Value::from(n))
}

/// Pretty JSON by default; `json(v, false)` gives the compact form.
fn json(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 2)?;
    let pretty = args.get(1).map_or(true, is_truthy);
    let encoded = if pretty {
        serde_json::to_string_pretty(&args[0])
    } else {
        serde_json::to_string(&args[0])
    };
    encoded.map(Value::String).map_err(|e| e.to_string())
}

fn default(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 2, 2)?;
    Ok(match &args[0] {
        Value::Null => args[1].clone(),
        Value::String(s) if s.is_empty() => args[1].clone(),
        other => other.clone(),
    })
}

fn escape(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 1)?;
    Ok(Value::String(escape_html(&to_display_string(&args[0]))))
}

/// Inclusive integer range, stepping down when `start > end`.
fn range(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 2, 3)?;
    let int = |v: &Value| -> Result<i64, String> {
        match to_number(v).map_err(|e| e.to_string())? {
            Number::Int(i) => Ok(i),
            Number::Float(f) => Ok(f as i64),
        }
    };
    let (start, end) = (int(&args[0])?, int(&args[1])?);
    let step = match args.get(2) {
        Some(v) => int(v)?.checked_abs().unwrap_or(i64::MAX),
        None => 1,
    };
    if step == 0 {
        return Err("step must not be zero".to_string());
    }
    let span = start.abs_diff(end) / step.unsigned_abs();
    if span >= MAX_RANGE_LEN as u64 {
        return Err(format!("range exceeds {} elements", MAX_RANGE_LEN));
    }
    let mut items = Vec::with_capacity(span as usize + 1);
    let mut current = start;
    for _ in 0..=span {
        items.push(Value::Integer(current));
        current = if start <= end {
            current.saturating_add(step)
        } else {
            current.saturating_sub(step)
        };
    }
    Ok(Value::Array(items))
}

fn join(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 2)?;
    let separator = to_display_string(arg(args, 1));
    let parts: Vec<String> = match &args[0] {
        Value::Array(items) => items.iter().map(to_display_string).collect(),
        Value::Map(map) => map.values().map(to_display_string).collect(),
        Value::Null => Vec::new(),
        other => return Err(format!("cannot join {}", other.kind())),
    };
    Ok(Value::String(parts.join(&separator)))
}

fn keys(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 1)?;
    Ok(Value::Array(match &args[0] {
        Value::Array(items) => (0..items.len()).map(Value::from).collect(),
        Value::Map(map) => map.keys().map(|k| Value::String(k.clone())).collect(),
        Value::Record(record) => record.field_names().into_iter().map(Value::String).collect(),
        Value::Null => Vec::new(),
        other => return Err(format!("cannot list keys of {}", other.kind())),
    }))
}

// ================================
// Dates
// ================================

/// `date(value, format = "Y-m-d")`.
///
/// Unparseable values yield null so the template prints nothing.
fn date(args: &[Value]) -> Result<Value, String> {
    expect_args(args, 1, 2)?;
    let Some(moment) = parse_moment(&args[0]) else {
        return Ok(Value::Null);
    };
    let format = match args.get(1) {
        Some(Value::Null) | None => DEFAULT_DATE_FORMAT.to_string(),
        Some(v) => to_display_string(v),
    };
    format_moment(&moment, &format).map(Value::String)
}

fn parse_moment(value: &Value) -> Option<DateTime<FixedOffset>> {
    match value {
        Value::Integer(secs) => DateTime::<Utc>::from_timestamp(*secs, 0).map(|d| d.fixed_offset()),
        Value::Float(secs) => {
            DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0).map(|d| d.fixed_offset())
        }
        Value::String(s) => parse_date_string(s.trim()),
        _ => None,
    }
}

fn parse_date_string(s: &str) -> Option<DateTime<FixedOffset>> {
    if s.eq_ignore_ascii_case("now") {
        return Some(Utc::now().fixed_offset());
    }
    if let Ok(secs) = s.parse::<i64>() {
        return DateTime::<Utc>::from_timestamp(secs, 0).map(|d| d.fixed_offset());
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d);
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(d.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc().fixed_offset())
}

fn format_moment(moment: &DateTime<FixedOffset>, format: &str) -> Result<String, String> {
    let strftime = if format.contains('%') {
        format.to_string()
    } else {
        php_to_strftime(format)
    };
    let items: Vec<Item<'_>> = StrftimeItems::new(&strftime).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(format!("invalid date format '{}'", format));
    }
    let mut out = String::new();
    write!(out, "{}", moment.format_with_items(items.into_iter()))
        .map_err(|_| format!("invalid date format '{}'", format))?;
    Ok(out)
}

/// Translate a PHP `date()` format into strftime.
///
/// A backslash escapes the next character; unknown letters pass through.
pub fn php_to_strftime(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        let spec = match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    push_literal(&mut out, next);
                }
                continue;
            }
            'd' => "%d",
            'D' => "%a",
            'j' => "%-d",
            'l' => "%A",
            'N' => "%u",
            'w' => "%w",
            'F' => "%B",
            'm' => "%m",
            'M' => "%b",
            'n' => "%-m",
            'Y' => "%Y",
            'y' => "%y",
            'a' => "%P",
            'A' => "%p",
            'g' => "%-I",
            'G' => "%-H",
            'h' => "%I",
            'H' => "%H",
            'i' => "%M",
            's' => "%S",
            'T' => "%Z",
            'P' => "%:z",
            'O' => "%z",
            'U' => "%s",
            'c' => "%Y-%m-%dT%H:%M:%S%:z",
            'r' => "%a, %d %b %Y %H:%M:%S %z",
            other => {
                push_literal(&mut out, other);
                continue;
            }
        };
        out.push_str(spec);
    }
    out
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Vec<Value>) -> TemplateResult<Value> {
        FunctionRegistry::with_builtins().call(name, &args)
    }

    struct Shout;

    impl TemplateFunction for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn call(&self, args: &[Value]) -> Result<Value, String> {
            Ok(Value::String(format!("{}!", to_display_string(arg(args, 0)))))
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = FunctionRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec![
                "count", "date", "default", "escape", "join", "json", "keys", "lower", "range",
                "trim", "upper"
            ]
        );
    }

    #[test]
    fn test_register_duplicate_fails() {
        let mut registry = FunctionRegistry::with_builtins();
        registry.register(Arc::new(Shout)).unwrap();
        let before = registry.len();
        let err = registry.register(Arc::new(Shout)).unwrap_err();
        assert!(matches!(err, TemplateError::DuplicateFunction(ref n) if n == "shout"));
        assert_eq!(registry.len(), before);
        assert_eq!(
            registry.call("shout", &[Value::from("hi")]).unwrap(),
            Value::from("hi!")
        );
    }

    #[test]
    fn test_unknown_function_is_execution_error() {
        let err = call("nope", vec![]).unwrap_err();
        assert!(matches!(err, TemplateError::Execution(ref m) if m.contains("nope")));
    }

    #[test]
    fn test_string_functions() {
        assert_eq!(call("upper", vec!["abc".into()]).unwrap(), Value::from("ABC"));
        assert_eq!(call("lower", vec!["ÀB".into()]).unwrap(), Value::from("àb"));
        assert_eq!(call("trim", vec!["  x ".into()]).unwrap(), Value::from("x"));
        assert_eq!(
            call("escape", vec!["<b>".into()]).unwrap(),
            Value::from("&lt;b&gt;")
        );
        assert!(call("upper", vec![]).is_err());
    }

    #[test]
    fn test_count_and_keys() {
        let map = Value::from(json!({"b": 1, "a": 2}));
        assert_eq!(call("count", vec![map.clone()]).unwrap(), Value::Integer(2));
        assert_eq!(call("count", vec![Value::Null]).unwrap(), Value::Integer(0));
        assert_eq!(call("keys", vec![map]).unwrap(), Value::from(json!(["b", "a"])));
    }

    #[test]
    fn test_json_pretty_and_compact() {
        let v = Value::from(json!({"a": [1, 2]}));
        assert_eq!(
            call("json", vec![v.clone(), false.into()]).unwrap(),
            Value::from(r#"{"a":[1,2]}"#)
        );
        let pretty = call("json", vec![v]).unwrap();
        assert!(pretty.as_str().unwrap().contains("\n"));
    }

    #[test]
    fn test_default() {
        assert_eq!(
            call("default", vec![Value::Null, "n/a".into()]).unwrap(),
            Value::from("n/a")
        );
        assert_eq!(
            call("default", vec!["x".into(), "n/a".into()]).unwrap(),
            Value::from("x")
        );
    }

    #[test]
    fn test_range_and_join() {
        let r = call("range", vec![1.into(), 4.into()]).unwrap();
        assert_eq!(r, Value::from(json!([1, 2, 3, 4])));
        let down = call("range", vec![5.into(), 1.into(), 2.into()]).unwrap();
        assert_eq!(down, Value::from(json!([5, 3, 1])));
        assert_eq!(
            call("join", vec![r, ", ".into()]).unwrap(),
            Value::from("1, 2, 3, 4")
        );
        assert!(call("range", vec![0.into(), 5_000_000.into()]).is_err());
        assert!(call("range", vec![0.into(), 5.into(), 0.into()]).is_err());
    }

    #[test]
    fn test_date_formats() {
        let ts = Value::Integer(1_700_000_000); // 2023-11-14 22:13:20 UTC
        assert_eq!(call("date", vec![ts.clone()]).unwrap(), Value::from("2023-11-14"));
        assert_eq!(
            call("date", vec![ts.clone(), "d/m/Y H:i".into()]).unwrap(),
            Value::from("14/11/2023 22:13")
        );
        assert_eq!(
            call("date", vec![ts, "%Y".into()]).unwrap(),
            Value::from("2023")
        );
        assert_eq!(
            call("date", vec!["2024-02-29".into(), "D, j M".into()]).unwrap(),
            Value::from("Thu, 29 Feb")
        );
        assert_eq!(
            call("date", vec!["2024-01-05 08:30:00".into(), "\\Y\\: Y".into()]).unwrap(),
            Value::from("Y: 2024")
        );
    }

    #[test]
    fn test_date_unparseable_is_null() {
        assert_eq!(call("date", vec!["not a date".into()]).unwrap(), Value::Null);
        assert_eq!(call("date", vec![Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_php_to_strftime() {
        assert_eq!(php_to_strftime("Y-m-d"), "%Y-%m-%d");
        assert_eq!(php_to_strftime("H:i:s"), "%H:%M:%S");
        assert_eq!(php_to_strftime("\\d"), "d");
    }
}
