//! Source-to-artifact rewriting.
//!
//! Three passes run in order, each a leftmost-first, non-overlapping global
//! replacement over the output of the previous one:
//!
//! 1. `%path%` becomes an escaped print instruction,
//! 2. `%!path!%` becomes a dump instruction,
//! 3. every registered directive, in registration order, is expanded.
//!
//! Because directives run one after another over the same text, a fragment
//! emitted by an earlier directive can be matched by a later one.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::directives::{CodeFragment, DirectiveRegistry, DirectiveSpec};

static INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)%").unwrap()
});

static DEBUG_INTERPOLATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%!([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z0-9_]+)*)!%").unwrap()
});

pub struct SyntaxTransformer<'r> {
    directives: &'r DirectiveRegistry,
}

impl<'r> SyntaxTransformer<'r> {
    pub fn new(directives: &'r DirectiveRegistry) -> Self {
        Self { directives }
    }

    /// Run all three passes.
    pub fn transform(&self, source: &str) -> String {
        let text = interpolate(source);
        let text = interpolate_debug(&text);
        self.expand_directives(text)
    }

    pub fn expand_directives(&self, mut text: String) -> String {
        for spec in self.directives.iter() {
            text = apply_directive(spec, &text);
        }
        text
    }
}

/// `%path%` -> `<?tpl print $path ?>`
pub fn interpolate(source: &str) -> String {
    INTERPOLATION
        .replace_all(source, |caps: &Captures| {
            CodeFragment::print(&format!("${}", &caps[1])).into_string()
        })
        .into_owned()
}

/// `%!path!%` -> `<?tpl dump $path ?>`
pub fn interpolate_debug(source: &str) -> String {
    DEBUG_INTERPOLATION
        .replace_all(source, |caps: &Captures| {
            CodeFragment::dump(&format!("${}", &caps[1])).into_string()
        })
        .into_owned()
}

/// Expand every occurrence of one directive.
///
/// For argument directives the argument runs from the `(` the trigger ends
/// on to its balanced `)`. An occurrence without a balanced close is left as
/// literal text and scanning resumes one byte later.
pub fn apply_directive(spec: &DirectiveSpec, text: &str) -> String {
    let trigger = spec.trigger();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search = 0;
    while search <= text.len() {
        let Some(m) = trigger.find_at(text, search) else {
            break;
        };
        if !spec.has_arguments() {
            out.push_str(&text[copied..m.start()]);
            out.push_str(spec.compile("").as_str());
            copied = m.end();
            search = m.end();
            continue;
        }
        // the trigger always ends on the opening parenthesis
        let open = m.end() - 1;
        match find_closing_paren(text, open) {
            Some(close) => {
                out.push_str(&text[copied..m.start()]);
                out.push_str(spec.compile(&text[open + 1..close]).as_str());
                copied = close + 1;
                search = close + 1;
            }
            None => search = next_char_boundary(text, m.start()),
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Byte offset of the `)` balancing the `(` at `open`, skipping parentheses
/// inside single- or double-quoted strings.
pub fn find_closing_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    debug_assert_eq!(bytes.get(open), Some(&b'('));
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    let mut next = from + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next
}
