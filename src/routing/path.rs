//! Path pattern parsing.
//!
//! # Syntax
//! ```text
//! /article/{slug}                 placeholder, matches one segment
//! /post/{id:num}                  placeholder with a pattern alias
//! /archive/{year:\d{4}}           placeholder with an inline regex
//! /articles[/{page:num}]          optional group
//! ```
//!
//! # Design Decisions
//! - Pure functions: no regex compilation happens here, only the source
//! - Trailing and repeated slashes are not significant (`//users/` == `/users`)
//! - Every syntax problem is a configuration-time error

use std::borrow::Cow;
use std::str::Chars;

use crate::routing::error::RoutingError;
use crate::routing::patterns;

/// One piece of a parsed path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, matched verbatim.
    Static(String),
    /// Reference to a placeholder by name.
    Param(String),
    /// Group that may be absent as a whole.
    Optional(Vec<Segment>),
}

/// A `{name}` or `{name:pattern}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    /// Inline pattern with aliases already resolved.
    pub pattern: Option<String>,
    /// True when declared inside an optional group.
    pub optional: bool,
}

/// Result of [`parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// Normalized pattern.
    pub path: String,
    pub segments: Vec<Segment>,
    /// Placeholders in declaration order.
    pub placeholders: Vec<Placeholder>,
}

impl ParsedPath {
    /// A path without placeholders or optional groups.
    pub fn is_static(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Static(_)))
    }
}

/// Ensure a leading slash, collapse repeated slashes and drop trailing ones
/// (the root stays `/`). Inline patterns inside `{...}` are kept as written.
pub fn normalize(path: &str) -> Cow<'_, str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.starts_with('/') && !trimmed.contains("//") {
        return Cow::Borrowed(trimmed);
    }

    let mut out = String::with_capacity(trimmed.len() + 1);
    let mut depth = 0usize;
    for c in trimmed.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 && out.ends_with('/') => continue,
            _ => {}
        }
        if out.is_empty() && c != '/' {
            out.push('/');
        }
        out.push(c);
    }
    if out.is_empty() {
        out.push('/');
    }
    Cow::Owned(out)
}

/// Parse a route path pattern.
pub fn parse(path: &str) -> Result<ParsedPath, RoutingError> {
    let normalized = normalize(path).into_owned();
    let mut root = Vec::new();
    let mut groups: Vec<Vec<Segment>> = Vec::new();
    let mut literal = String::new();
    let mut placeholders: Vec<Placeholder> = Vec::new();
    let mut chars = normalized.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush(&mut literal, target(&mut root, &mut groups));
                let body = read_placeholder(&mut chars)
                    .ok_or_else(|| RoutingError::invalid_path(path, "unclosed `{`"))?;
                let placeholder = placeholder(path, &body, !groups.is_empty())?;
                if placeholders.iter().any(|p| p.name == placeholder.name) {
                    return Err(RoutingError::invalid_path(
                        path,
                        format!("duplicate placeholder `{}`", placeholder.name),
                    ));
                }
                target(&mut root, &mut groups).push(Segment::Param(placeholder.name.clone()));
                placeholders.push(placeholder);
            }
            '}' => return Err(RoutingError::invalid_path(path, "unexpected `}`")),
            '[' => {
                flush(&mut literal, target(&mut root, &mut groups));
                groups.push(Vec::new());
            }
            ']' => {
                flush(&mut literal, target(&mut root, &mut groups));
                let group = groups
                    .pop()
                    .ok_or_else(|| RoutingError::invalid_path(path, "unexpected `]`"))?;
                if group.is_empty() {
                    return Err(RoutingError::invalid_path(path, "empty optional group"));
                }
                target(&mut root, &mut groups).push(Segment::Optional(group));
            }
            _ => literal.push(c),
        }
    }

    if !groups.is_empty() {
        return Err(RoutingError::invalid_path(path, "unclosed `[`"));
    }
    flush(&mut literal, &mut root);

    Ok(ParsedPath {
        path: normalized,
        segments: root,
        placeholders,
    })
}

/// Build an anchored regex source for `segments`.
///
/// `pattern` supplies the regex for each placeholder name.
pub fn regex_source<F>(segments: &[Segment], pattern: &F) -> String
where
    F: Fn(&str) -> String,
{
    let mut source = String::from("^");
    push_regex(segments, pattern, &mut source);
    source.push('$');
    source
}

fn push_regex<F>(segments: &[Segment], pattern: &F, out: &mut String)
where
    F: Fn(&str) -> String,
{
    for segment in segments {
        match segment {
            Segment::Static(text) => out.push_str(&regex::escape(text)),
            Segment::Param(name) => {
                out.push_str("(?P<");
                out.push_str(name);
                out.push('>');
                out.push_str(&pattern(name));
                out.push(')');
            }
            Segment::Optional(inner) => {
                out.push_str("(?:");
                push_regex(inner, pattern, out);
                out.push_str(")?");
            }
        }
    }
}

fn target<'a>(root: &'a mut Vec<Segment>, groups: &'a mut [Vec<Segment>]) -> &'a mut Vec<Segment> {
    match groups.last_mut() {
        Some(group) => group,
        None => root,
    }
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Static(std::mem::take(literal)));
    }
}

/// Read up to the `}` closing the current placeholder. Braces inside the
/// pattern (`\d{4}`) are balanced.
fn read_placeholder(chars: &mut Chars<'_>) -> Option<String> {
    let mut depth = 0usize;
    let mut body = String::new();
    for c in chars.by_ref() {
        match c {
            '}' if depth == 0 => return Some(body),
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        body.push(c);
    }
    None
}

fn placeholder(path: &str, body: &str, optional: bool) -> Result<Placeholder, RoutingError> {
    let (name, pattern) = match body.split_once(':') {
        Some((name, pattern)) => (name.trim(), Some(pattern)),
        None => (body.trim(), None),
    };

    if !is_identifier(name) {
        return Err(RoutingError::invalid_path(
            path,
            format!("invalid placeholder name `{name}`"),
        ));
    }
    if pattern.is_some_and(str::is_empty) {
        return Err(RoutingError::invalid_path(
            path,
            format!("empty pattern for placeholder `{name}`"),
        ));
    }

    Ok(Placeholder {
        name: name.to_string(),
        pattern: pattern.map(|p| patterns::resolve(p).to_string()),
        optional,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
