//! HTML value dumper behind `%!path!%` and `@dump(...)`.

use templar_types::{Record, Value, ValueDumper};

use super::escape::escape_html;
use crate::evaluator::type_coercion::to_display_string;

/// Nesting depth after which containers print a warning instead.
pub const MAX_DEPTH: usize = 10;
/// Nested strings longer than this many characters are truncated.
pub const MAX_STRING_LEN: usize = 100;

/// Stylesheet for the markup produced by [`HtmlDumper`]. Not emitted by the
/// dumper itself; include it once per page if wanted.
pub const DUMP_STYLES: &str = r#"<style>
.templar-dump { font-family: ui-monospace, Menlo, Consolas, monospace; font-size: 13px; background: #1e1e1e; color: #d4d4d4; padding: 12px 16px; border-radius: 6px; margin: 8px 0; line-height: 1.5; }
.templar-dump .type { color: #4ec9b0; font-weight: 600; }
.templar-dump .key { color: #9cdcfe; }
.templar-dump .prefix { color: #555; }
.templar-dump .empty { color: #6a9955; }
.templar-dump .items, .templar-dump .properties { margin-left: 8px; padding-left: 12px; border-left: 1px solid #333; }
.templar-val.templar-string { color: #ce9178; }
.templar-val.templar-int, .templar-val.templar-float { color: #b5cea8; }
.templar-val.templar-bool { color: #569cd6; }
.templar-val.templar-null { color: #6a9955; font-style: italic; }
.templar-val.templar-warning { color: #f44747; font-weight: bold; }
</style>"#;

/// Tree-style HTML dumper.
///
/// Scalars become `<span class="templar-val templar-KIND">`, arrays and maps
/// become `array(N)` trees, records show their type name and fields. A
/// top-level string is printed escaped without decoration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlDumper;

impl HtmlDumper {
    pub fn new() -> Self {
        HtmlDumper
    }

    fn value(&self, value: &Value, depth: usize) -> String {
        match value {
            Value::Null => wrap("null", "null"),
            Value::Bool(b) => wrap(if *b { "true" } else { "false" }, "bool"),
            Value::Integer(_) => wrap(&to_display_string(value), "int"),
            Value::Float(_) => wrap(&to_display_string(value), "float"),
            Value::String(s) => {
                let display = truncate(s);
                wrap(&format!("\"{}\"", escape_html(&display)), "string")
            }
            Value::Array(items) => self.tree(
                items.len(),
                items.iter().enumerate().map(|(i, v)| (i.to_string(), v.clone())),
                depth,
            ),
            Value::Map(map) => self.tree(
                map.len(),
                map.iter().map(|(k, v)| (k.clone(), v.clone())),
                depth,
            ),
            Value::Record(record) => self.record(record.as_ref(), depth),
        }
    }

    fn tree(&self, count: usize, entries: impl Iterator<Item = (String, Value)>, depth: usize) -> String {
        if depth > MAX_DEPTH {
            return wrap("*MAX DEPTH*", "warning");
        }
        let mut html = String::from(r#"<div class="templar-dump array">"#);
        html.push_str(&format!(r#"<span class="type">array({})</span>"#, count));
        if count == 0 {
            html.push_str(r#" <span class="empty">[]</span>"#);
        } else {
            html.push_str(r#"<div class="items">"#);
            for (i, (key, value)) in entries.enumerate() {
                self.entry(&mut html, "item", i + 1 == count, &key, &value, depth);
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }

    fn record(&self, record: &dyn Record, depth: usize) -> String {
        if depth > MAX_DEPTH {
            return wrap("*MAX DEPTH*", "warning");
        }
        let mut html = String::from(r#"<div class="templar-dump object">"#);
        html.push_str(&format!(
            r#"<span class="type">{}</span>"#,
            escape_html(record.type_name())
        ));
        let names = record.field_names();
        if names.is_empty() {
            html.push_str(r#" <span class="empty">{}</span>"#);
        } else {
            html.push_str(r#"<div class="properties">"#);
            for (i, name) in names.iter().enumerate() {
                let value = record.field(name).unwrap_or_default();
                self.entry(&mut html, "prop", i + 1 == names.len(), name, &value, depth);
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
        html
    }

    fn entry(&self, html: &mut String, class: &str, last: bool, key: &str, value: &Value, depth: usize) {
        let prefix = if last { "└─" } else { "├─" };
        html.push_str(&format!(
            r#"<div class="{}"><span class="prefix">{}</span> <span class="key">{}</span>: {}</div>"#,
            class,
            prefix,
            escape_html(key),
            self.value(value, depth + 1)
        ));
    }
}

impl ValueDumper for HtmlDumper {
    fn dump(&self, value: &Value) -> String {
        match value {
            Value::String(s) => escape_html(s),
            other => self.value(other, 0),
        }
    }
}

fn wrap(text: &str, kind: &str) -> String {
    format!(r#"<span class="templar-val templar-{}">{}</span>"#, kind, text)
}

fn truncate(s: &str) -> std::borrow::Cow<'_, str> {
    match s.char_indices().nth(MAX_STRING_LEN) {
        Some((cut, _)) => format!("{}...", &s[..cut]).into(),
        None => s.into(),
    }
}
