// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compound selectors: `tag#id.class[attr][attr=value]`.
//!
//! Combinators, pseudo-classes and selector lists are rejected with a
//! [`SelectorError`], which is also what a browser does for syntax it does
//! not understand.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use keeptrack::SelectorError;

/// A parsed compound selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Selector {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attributes: Vec<(String, Option<String>)>,
}

impl Selector {
    pub(crate) fn parse(source: &str) -> Result<Self, SelectorError> {
        let fail = |reason: &str| SelectorError::new(source, reason);
        let mut rest = source.trim();
        if rest.is_empty() {
            return Err(fail("empty selector"));
        }
        let mut selector = Self::default();
        if rest.starts_with('*') {
            rest = &rest[1..];
        } else if let Some((tag, after)) = ident(rest) {
            selector.tag = Some(tag.to_ascii_lowercase());
            rest = after;
        }
        while let Some(first) = rest.chars().next() {
            match first {
                '#' => {
                    let (id, after) = ident(&rest[1..]).ok_or_else(|| fail("bad id"))?;
                    selector.id = Some(id.to_string());
                    rest = after;
                }
                '.' => {
                    let (class, after) = ident(&rest[1..]).ok_or_else(|| fail("bad class"))?;
                    selector.classes.push(class.to_string());
                    rest = after;
                }
                '[' => {
                    let close = rest.find(']').ok_or_else(|| fail("unclosed attribute"))?;
                    let inner = rest[1..close].trim();
                    let (name, value) = match inner.split_once('=') {
                        Some((name, value)) => (name.trim(), Some(unquote(value.trim()))),
                        None => (inner, None),
                    };
                    match ident(name) {
                        Some((name, "")) => {
                            selector.attributes.push((name.to_string(), value.map(ToString::to_string)));
                        }
                        _ => return Err(fail("bad attribute selector")),
                    }
                    rest = &rest[close + 1..];
                }
                _ => return Err(fail("unsupported syntax")),
            }
        }
        Ok(selector)
    }
}

/// Splits a CSS identifier off the front of `s`.
fn ident(s: &str) -> Option<(&str, &str)> {
    let bytes = s.as_bytes();
    let starts_ok = match bytes {
        [b'-', second, ..] => !second.is_ascii_digit(),
        [first, ..] => first.is_ascii_alphabetic() || *first == b'_',
        [] => false,
    };
    if !starts_ok {
        return None;
    }
    let len = bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
        .count();
    Some(s.split_at(len))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_parts() {
        let selector = Selector::parse("DIV#main.card.wide[data-x][role=\"nav\"]").unwrap();
        assert_eq!(selector.tag.as_deref(), Some("div"));
        assert_eq!(selector.id.as_deref(), Some("main"));
        assert_eq!(selector.classes, ["card", "wide"]);
        assert_eq!(selector.attributes.len(), 2);
        assert_eq!(selector.attributes[1].1.as_deref(), Some("nav"));
    }

    #[test]
    fn unsupported_and_invalid() {
        assert!(Selector::parse("").is_err());
        assert!(Selector::parse("div > p").is_err());
        assert!(Selector::parse("0").is_err());
        assert!(Selector::parse("-1").is_err());
        assert!(Selector::parse("[[").is_err());
        assert!(Selector::parse(".card:hover").is_err());
        assert!(Selector::parse("*").is_ok());
    }
}
