use std::borrow::Cow;

/// HTML-escape `& < > " '` for element and attribute contexts.
pub fn escape_html(input: &str) -> String {
    escape_html_cow(input).into_owned()
}

/// Like [`escape_html`] but borrows when nothing needs escaping.
pub fn escape_html_cow(input: &str) -> Cow<'_, str> {
    let Some(first) = input.find(['&', '<', '>', '"', '\'']) else {
        return Cow::Borrowed(input);
    };
    let mut out = String::with_capacity(input.len() + 16);
    out.push_str(&input[..first]);
    for c in input[first..].chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
