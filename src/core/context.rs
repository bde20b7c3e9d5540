use std::collections::HashMap;

use serde::Serialize;
use templar_types::Value;

use super::variable_path::VariableLookup;
use crate::error::{TemplateError, TemplateResult};

/// Per-render data supplied by the caller.
///
/// Every top-level entry is addressable from templates by name. The engine
/// only reads from the context and never keeps it past the render call.
#[derive(Debug, Clone, Default)]
pub struct DataContext {
    vars: HashMap<String, Value>,
}

impl DataContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a context from a JSON object.
    pub fn from_json(value: serde_json::Value) -> TemplateResult<Self> {
        match value {
            serde_json::Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(&v)))
                .collect()),
            other => Err(TemplateError::InvalidContext(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Build a context from any type that serializes to a map.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> TemplateResult<Self> {
        Self::from_json(serde_json::to_value(value)?)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl VariableLookup for DataContext {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

impl From<HashMap<String, serde_json::Value>> for DataContext {
    fn from(map: HashMap<String, serde_json::Value>) -> Self {
        map.into_iter()
            .map(|(k, v)| (k, Value::from_json(&v)))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for DataContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_object() {
        let ctx = DataContext::from_json(json!({"a": 1, "b": "x"})).unwrap();
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("a"), Some(&Value::Integer(1)));
        assert!(ctx.contains("b"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = DataContext::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidContext(_)));
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn test_with_and_insert() {
        let mut ctx = DataContext::new().with("name", "Ann").with("age", 30);
        ctx.insert("age", 31);
        assert_eq!(ctx.lookup("name"), Some(&Value::from("Ann")));
        assert_eq!(ctx.lookup("age"), Some(&Value::Integer(31)));
        assert_eq!(ctx.lookup("missing"), None);
    }

    #[test]
    fn test_from_serialize_struct() {
        #[derive(Serialize)]
        struct Page {
            title: String,
            count: u32,
        }
        let ctx = DataContext::from_serialize(&Page {
            title: "Home".into(),
            count: 3,
        })
        .unwrap();
        assert_eq!(ctx.get("title"), Some(&Value::from("Home")));
        assert_eq!(ctx.get("count"), Some(&Value::Integer(3)));
    }
}
