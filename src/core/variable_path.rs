//! Dotted variable paths and their resolution.
//!
//! A [`VariablePath`] is parsed once (at compile time) and then resolved any
//! number of times against a [`VariableLookup`]. Resolution never fails: a
//! missing root, key, index or field makes the whole path *absent* (`None`),
//! which templates render as empty output.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use templar_types::Value;

use crate::error::TemplateError;

/// Source of top-level variables.
pub trait VariableLookup {
    fn lookup(&self, name: &str) -> Option<&Value>;
}

impl<L: VariableLookup + ?Sized> VariableLookup for &L {
    fn lookup(&self, name: &str) -> Option<&Value> {
        (**self).lookup(name)
    }
}

// ================================
// PathSegment
// ================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

impl PathSegment {
    /// Classify a raw segment. Only canonical decimal numbers (`0`, `12`,
    /// not `012`) become indices so that map keys like `"007"` stay keys.
    pub fn parse(raw: &str) -> Self {
        let canonical = !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && (raw == "0" || !raw.starts_with('0'));
        if canonical {
            if let Ok(index) = raw.parse::<usize>() {
                return PathSegment::Index(index);
            }
        }
        PathSegment::Key(raw.to_string())
    }

    /// The segment as a map key / field name.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Index(i) => Cow::Owned(i.to_string()),
            PathSegment::Key(k) => Cow::Borrowed(k),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{}", i),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

// ================================
// VariablePath
// ================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariablePath {
    root: String,
    segments: Vec<PathSegment>,
}

impl VariablePath {
    /// Parse `name(.segment)*`.
    pub fn parse(path: &str) -> Result<Self, TemplateError> {
        let mut parts = path.split('.');
        let root = parts.next().unwrap_or_default();
        if !is_identifier(root) {
            return Err(TemplateError::InvalidPath(path.to_string()));
        }
        let mut segments = Vec::new();
        for part in parts {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
                return Err(TemplateError::InvalidPath(path.to_string()));
            }
            segments.push(PathSegment::parse(part));
        }
        Ok(Self {
            root: root.to_string(),
            segments,
        })
    }

    pub fn from_parts(root: impl Into<String>, segments: Vec<PathSegment>) -> Self {
        Self {
            root: root.into(),
            segments,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Resolve against `scope`, returning `None` when any step is absent.
    pub fn resolve<L: VariableLookup + ?Sized>(&self, scope: &L) -> Option<Value> {
        let root = scope.lookup(&self.root)?;
        if self.segments.is_empty() {
            return Some(root.clone());
        }
        let mut current = Cow::Borrowed(root);
        for segment in &self.segments {
            current = step(current, segment)?;
        }
        Some(current.into_owned())
    }
}

impl FromStr for VariablePath {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VariablePath::parse(s)
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// Resolve a single segment against `value`.
pub fn resolve_segment(value: &Value, segment: &PathSegment) -> Option<Value> {
    lookup(value, segment).map(Cow::into_owned)
}

fn step<'v>(current: Cow<'v, Value>, segment: &PathSegment) -> Option<Cow<'v, Value>> {
    match current {
        Cow::Borrowed(value) => lookup(value, segment),
        Cow::Owned(value) => lookup(&value, segment).map(|v| Cow::Owned(v.into_owned())),
    }
}

fn lookup<'v>(value: &'v Value, segment: &PathSegment) -> Option<Cow<'v, Value>> {
    match (value, segment) {
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i).map(Cow::Borrowed),
        (Value::Map(map), segment) => map.get(segment.as_key().as_ref()).map(Cow::Borrowed),
        (Value::Record(record), segment) => record.field(&segment.as_key()).map(Cow::Owned),
        _ => None,
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
