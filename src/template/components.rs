use std::collections::BTreeMap;

const SLOT_MARKER: &str = "@slot";

/// Replace `@slot('name')` markers with slot content. When a `default` slot
/// is given it also fills every bare `@slot` not followed by `(`.
///
/// Slot content is inserted verbatim; it is expected to be rendered HTML.
pub fn inject_slots(content: &str, slots: &BTreeMap<String, String>) -> String {
    let mut out = content.to_string();
    for (name, slot) in slots {
        out = out.replace(&format!("{}('{}')", SLOT_MARKER, name), slot);
    }
    if let Some(default) = slots.get("default") {
        out = replace_bare_slots(&out, default);
    }
    out
}

fn replace_bare_slots(content: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(pos) = rest.find(SLOT_MARKER) {
        let after = &rest[pos + SLOT_MARKER.len()..];
        let bare = !after.starts_with('(')
            && !after
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
        out.push_str(&rest[..pos]);
        if bare {
            out.push_str(replacement);
        } else {
            out.push_str(SLOT_MARKER);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}
