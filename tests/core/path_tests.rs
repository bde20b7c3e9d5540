use serde_json::json;
use templar::core::resolve_segment;
use templar::{DataContext, PathSegment, Record, TemplateError, Value, VariablePath};

struct Address {
    city: &'static str,
}

impl Record for Address {
    fn type_name(&self) -> &str {
        "Address"
    }

    fn field_names(&self) -> Vec<String> {
        vec!["city".to_string()]
    }

    fn field(&self, name: &str) -> Option<Value> {
        (name == "city").then(|| Value::from(self.city))
    }
}

struct User {
    name: &'static str,
    tags: Vec<&'static str>,
}

impl Record for User {
    fn type_name(&self) -> &str {
        "User"
    }

    fn field_names(&self) -> Vec<String> {
        vec!["name".to_string(), "address".to_string(), "tags".to_string()]
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "name" => Some(Value::from(self.name)),
            "address" => Some(Value::record(Address { city: "Oslo" })),
            "tags" => Some(Value::from(self.tags.clone())),
            _ => None,
        }
    }
}

fn resolve(path: &str, ctx: &DataContext) -> Option<Value> {
    VariablePath::parse(path).unwrap().resolve(ctx)
}

#[test]
fn test_records_and_maps_resolve_identically() {
    let from_map = DataContext::from_json(json!({
        "user": {"name": "Ann", "address": {"city": "Oslo"}, "tags": ["a", "b"]}
    }))
    .unwrap();
    let from_record = DataContext::new().with(
        "user",
        Value::record(User {
            name: "Ann",
            tags: vec!["a", "b"],
        }),
    );

    for path in ["user.name", "user.address.city", "user.tags.1", "user.nope", "user.tags.5"] {
        assert_eq!(
            resolve(path, &from_map),
            resolve(path, &from_record),
            "path {} differs",
            path
        );
    }
    assert_eq!(resolve("user.address.city", &from_record), Some(Value::from("Oslo")));
}

#[test]
fn test_missing_intermediate_is_absent() {
    let ctx = DataContext::from_json(json!({"a": {"b": null}, "n": 5, "s": "text"})).unwrap();
    assert_eq!(resolve("a.b.c", &ctx), None);
    assert_eq!(resolve("missing.deep.path", &ctx), None);
    assert_eq!(resolve("n.0", &ctx), None);
    assert_eq!(resolve("s.length", &ctx), None);
}

#[test]
fn test_stepwise_equals_whole_path() {
    let ctx = DataContext::from_json(json!({
        "orders": [{"items": [{"sku": "X1"}, {"sku": "X2"}]}]
    }))
    .unwrap();
    let path = VariablePath::parse("orders.0.items.1.sku").unwrap();

    let mut current = ctx.get(path.root()).cloned();
    for segment in path.segments() {
        current = current.and_then(|v| resolve_segment(&v, segment));
    }
    assert_eq!(current, path.resolve(&ctx));
    assert_eq!(current, Some(Value::from("X2")));
}

#[test]
fn test_numeric_segments_on_maps_are_keys() {
    let ctx = DataContext::from_json(json!({"codes": {"404": "missing", "007": "agent"}})).unwrap();
    assert_eq!(resolve("codes.404", &ctx), Some(Value::from("missing")));
    assert_eq!(resolve("codes.007", &ctx), Some(Value::from("agent")));
    // non-canonical digits are never array indices
    let ctx = DataContext::from_json(json!({"xs": ["a", "b"]})).unwrap();
    assert_eq!(resolve("xs.01", &ctx), None);
    assert!(matches!(PathSegment::parse("01"), PathSegment::Key(_)));
}

#[test]
fn test_invalid_paths_rejected() {
    for bad in ["", "1abc", "a..b", "a.", ".a", "a-b", "a.b c"] {
        let err = VariablePath::parse(bad).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPath(_)), "{:?} accepted", bad);
    }
}

#[test]
fn test_path_display_round_trips_text() {
    let path: VariablePath = "user.items.0.name".parse().unwrap();
    assert_eq!(path.to_string(), "user.items.0.name");
    assert_eq!(path.segments().len(), 3);
}

#[test]
fn test_context_from_serialize() {
    #[derive(serde::Serialize)]
    struct Page {
        title: String,
        views: u32,
    }
    let ctx = DataContext::from_serialize(&Page {
        title: "Home".to_string(),
        views: 7,
    })
    .unwrap();
    assert_eq!(resolve("title", &ctx), Some(Value::from("Home")));
    assert_eq!(resolve("views", &ctx), Some(Value::Integer(7)));

    let err = DataContext::from_json(json!([1, 2])).unwrap_err();
    assert!(matches!(err, TemplateError::InvalidContext(_)));
}
