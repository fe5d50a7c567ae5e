// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolving sticky `top` offsets and unstuck document positions.
//!
//! A sticky element's `top` can be written in many ways. [`TopValue::parse`]
//! classifies the computed value, and [`resolve_top_px`] turns it into pixels
//! using the element's sticky container, font sizes, a typed style API, or as a
//! last resort a hidden [`Measurers`] probe placed in the container.

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::host::{Dom, Priority};

/// Parses the longest leading decimal number in `s`, ignoring trailing units.
///
/// Leading whitespace is skipped. Returns `None` when no digits are found or
/// the result is not finite.
///
/// ```
/// use keeptrack::geometry::parse_float_prefix;
///
/// assert_eq!(parse_float_prefix(" 12.5px"), Some(12.5));
/// assert_eq!(parse_float_prefix("-3e1rem"), Some(-30.0));
/// assert_eq!(parse_float_prefix("auto"), None);
/// ```
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;
    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classified computed `top` value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TopValue<'a> {
    /// Empty or `auto`: the element has no sticky offset.
    Auto,
    /// A percentage of the sticky container's content height.
    Percent(f64),
    /// A multiple of the root font size.
    Rem(f64),
    /// A multiple of the element's font size.
    Em(f64),
    /// A function expression such as `calc(...)` or `max(...)`.
    Expression(&'a str),
    /// Anything else that starts with a number, taken as pixels.
    Length(f64),
}

impl<'a> TopValue<'a> {
    /// Classifies a computed `top` value.
    ///
    /// Returns `None` when the value is numeric-looking but unparsable.
    pub fn parse(value: &'a str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value == "auto" {
            return Some(Self::Auto);
        }
        if value.ends_with('%') {
            return parse_float_prefix(value).map(Self::Percent);
        }
        if value.ends_with("rem") {
            return parse_float_prefix(value).map(Self::Rem);
        }
        if value.ends_with("em") {
            return parse_float_prefix(value).map(Self::Em);
        }
        if value.contains('(') {
            return Some(Self::Expression(value));
        }
        parse_float_prefix(value).map(Self::Length)
    }
}

/// Nearest ancestor that generates a box, or the document root.
///
/// Ancestors with `display: contents` are skipped.
pub fn sticky_container<H: Dom>(host: &H, el: H::Element) -> H::Element {
    let root = host.document_element();
    let mut parent = host.parent_element(el);
    while let Some(p) = parent {
        if p == root {
            break;
        }
        if host.computed_style(p, "display") != "contents" {
            return p;
        }
        parent = host.parent_element(p);
    }
    root
}

/// Content-box height: border-box height minus vertical padding and borders.
pub fn content_box_height<H: Dom>(host: &H, el: H::Element) -> f64 {
    let edge = |property: &str| parse_float_prefix(&host.computed_style(el, property)).unwrap_or(0.0);
    let height = host.bounding_client_rect(el).height()
        - edge("padding-top")
        - edge("padding-bottom")
        - edge("border-top-width")
        - edge("border-bottom-width");
    height.max(0.0)
}

/// Document-relative top of `el` as if it were not positioned.
///
/// Forces `position: static !important; top: auto !important` for the read and
/// restores the previous inline declarations exactly, priorities included.
pub fn measure_unstuck_doc_top<H: Dom>(host: &mut H, el: H::Element) -> f64 {
    let saved: [(&str, Option<(String, Priority)>); 2] = [
        ("position", host.inline_style(el, "position")),
        ("top", host.inline_style(el, "top")),
    ];
    host.set_style_property(el, "position", "static", Priority::Important);
    host.set_style_property(el, "top", "auto", Priority::Important);
    let top = host.bounding_client_rect(el).y0 + host.scroll_y();
    for (property, previous) in saved {
        match previous {
            Some((value, priority)) if !value.is_empty() => {
                host.set_style_property(el, property, &value, priority);
            }
            _ => host.remove_style_property(el, property),
        }
    }
    top
}

/// Document-relative top of a sticky container.
///
/// Containers that are themselves sticky or fixed are measured unstuck.
pub fn container_doc_top<H: Dom>(host: &mut H, container: H::Element) -> f64 {
    if container == host.document_element() {
        return 0.0;
    }
    let position = host.computed_style(container, "position");
    if position == "sticky" || position == "fixed" {
        return measure_unstuck_doc_top(host, container);
    }
    host.bounding_client_rect(container).y0 + host.scroll_y()
}

/// Hidden probe elements, one per sticky container.
///
/// A probe resolves an arbitrary `top` expression by letting the host's style
/// engine compute it in the same containing block.
#[derive(Debug)]
pub struct Measurers<E> {
    by_container: HashMap<E, E>,
}

impl<E> Default for Measurers<E> {
    fn default() -> Self {
        Self {
            by_container: HashMap::new(),
        }
    }
}

const MEASURER_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("left", "0"),
    ("width", "0"),
    ("height", "0"),
    ("margin", "0"),
    ("padding", "0"),
    ("border", "0"),
    ("visibility", "hidden"),
    ("pointer-events", "none"),
];

impl<E: Copy + Eq + core::hash::Hash + core::fmt::Debug> Measurers<E> {
    /// Creates an empty set of probes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live probes.
    pub fn len(&self) -> usize {
        self.by_container.len()
    }

    /// Whether no probe has been created.
    pub fn is_empty(&self) -> bool {
        self.by_container.is_empty()
    }

    /// Returns the probe for `container`, creating it on first use.
    pub fn get_or_create<H: Dom<Element = E>>(&mut self, host: &mut H, container: E) -> E {
        if let Some(&probe) = self.by_container.get(&container) {
            return probe;
        }
        let probe = host.create_element("div");
        for &(property, value) in MEASURER_STYLE {
            host.set_style_property(probe, property, value, Priority::Normal);
        }
        host.append_child(container, probe);
        self.by_container.insert(container, probe);
        tracing::trace!(?container, "created top measurer");
        probe
    }

    /// Resolves `value` to pixels through the probe of `el`'s sticky container.
    pub fn resolve<H: Dom<Element = E>>(&mut self, host: &mut H, el: E, value: &str) -> Option<f64> {
        let container = sticky_container(host, el);
        let probe = self.get_or_create(host, container);
        if host.inline_style(probe, "top").is_none_or(|(current, _)| current != value) {
            host.set_style_property(probe, "top", value, Priority::Normal);
        }
        parse_float_prefix(&host.computed_style(probe, "top"))
    }

    /// Detaches every probe.
    pub fn remove_all<H: Dom<Element = E>>(&mut self, host: &mut H) {
        let probes: Vec<E> = self.by_container.drain().map(|(_, probe)| probe).collect();
        for probe in probes {
            host.remove_element(probe);
        }
    }
}

/// Resolves the computed sticky `top` of `el` to pixels.
///
/// Returns `None` for `auto` and for anything that cannot be resolved this pass.
pub fn resolve_top_px<H: Dom>(
    host: &mut H,
    measurers: &mut Measurers<H::Element>,
    el: H::Element,
) -> Option<f64> {
    let computed = host.computed_style(el, "top");
    match TopValue::parse(&computed)? {
        TopValue::Auto => None,
        TopValue::Percent(pct) => {
            let container = sticky_container(host, el);
            Some(content_box_height(host, container) * (pct / 100.0))
        }
        TopValue::Rem(rem) => {
            let root = host.document_element();
            parse_float_prefix(&host.computed_style(root, "font-size")).map(|font| rem * font)
        }
        TopValue::Em(em) => {
            parse_float_prefix(&host.computed_style(el, "font-size")).map(|font| em * font)
        }
        TopValue::Expression(expr) => host
            .computed_top_px(el)
            .or_else(|| measurers.resolve(host, el, expr)),
        TopValue::Length(px) => Some(px),
    }
}
