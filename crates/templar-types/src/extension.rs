use crate::value::Value;

/// Template function extension point.
pub trait TemplateFunction: Send + Sync {
    fn name(&self) -> &str;
    fn call(&self, args: &[Value]) -> Result<Value, String>;
}

/// Structured pretty-printer used by `%!path!%` and `@dump(...)`.
///
/// Absent values reach the dumper as [`Value::Null`].
pub trait ValueDumper: Send + Sync {
    fn dump(&self, value: &Value) -> String;
}
