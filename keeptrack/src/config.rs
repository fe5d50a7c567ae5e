// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deriving tracking configuration from element attributes.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::attr;
use crate::host::Dom;

/// Ordered list of CSS properties mirrored for one element.
pub type PropertyList = SmallVec<[String; 4]>;

/// Where the variables of a [`Config`] are written.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Placement<E> {
    /// On an explicitly selected element.
    Target(E),
    /// On the document root (the config has a name prefix).
    Root,
    /// On the tracked element itself.
    Element,
}

/// Tracking configuration of one element.
///
/// Two configs are equal when their property lists match pairwise, their
/// prefixes match, and they point at the same target element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config<E> {
    /// Properties to mirror, in attribute order.
    pub properties: PropertyList,
    /// Variable name prefix, from `data-keeptrack-id` or `id`.
    pub name_prefix: Option<String>,
    /// Explicit placement target.
    pub target: Option<E>,
}

impl<E: Copy> Config<E> {
    /// Where this config's variables live: target, then root when prefixed,
    /// then the element itself.
    pub fn placement(&self) -> Placement<E> {
        match (self.target, &self.name_prefix) {
            (Some(target), _) => Placement::Target(target),
            (None, Some(_)) => Placement::Root,
            (None, None) => Placement::Element,
        }
    }

    /// Custom property name for `property`: `--prefix-property` or `--property`.
    pub fn variable_name(&self, property: &str) -> String {
        variable_name(self.name_prefix.as_deref(), property)
    }

    /// Whether there is anything to mirror.
    pub fn is_trackable(&self) -> bool {
        !self.properties.is_empty()
    }
}

impl<E> Placement<E> {
    /// The element to write on, given the tracked element and the document root.
    pub fn resolve(self, el: E, root: E) -> E {
        match self {
            Self::Target(target) => target,
            Self::Root => root,
            Self::Element => el,
        }
    }
}

/// `--prefix-name` when prefixed, `--name` otherwise.
pub fn variable_name(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("--{prefix}-{name}"),
        None => format!("--{name}"),
    }
}

/// Splits a tracking attribute into trimmed, non-empty property names.
pub fn parse_properties(raw: &str) -> PropertyList {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Trims a prefix candidate; blank values count as absent.
pub(crate) fn normalize_prefix(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Current name prefix: `data-keeptrack-id`, else `id`, else none.
pub fn name_prefix<H: Dom>(host: &H, el: H::Element) -> Option<String> {
    normalize_prefix(host.attribute(el, attr::ID))
        .or_else(|| normalize_prefix(host.attribute(el, attr::ELEMENT_ID)))
}

/// The name prefix an element had before `changed` went from `old_value` to its
/// current value.
pub(crate) fn previous_name_prefix<H: Dom>(
    host: &H,
    el: H::Element,
    changed: &str,
    old_value: Option<&str>,
) -> Option<String> {
    match changed {
        attr::ID => normalize_prefix(old_value)
            .or_else(|| normalize_prefix(host.attribute(el, attr::ELEMENT_ID))),
        attr::ELEMENT_ID => {
            normalize_prefix(host.attribute(el, attr::ID)).or_else(|| normalize_prefix(old_value))
        }
        _ => normalize_prefix(old_value),
    }
}

/// Parsed `data-keeptrack-target-parent` value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TargetSpec<'a> {
    /// Walk this many parents up.
    Ancestor(u32),
    /// Match ancestors first, then the whole document.
    Selector(&'a str),
}

impl<'a> TargetSpec<'a> {
    /// Parses a target attribute. Empty values select nothing.
    ///
    /// A value starting with a positive integer is a hop count; anything else,
    /// including `0`, is a selector.
    pub fn parse(value: &'a str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        match leading_int(value) {
            Some(hops) if hops > 0 => Some(Self::Ancestor(u32::try_from(hops).unwrap_or(u32::MAX))),
            _ => Some(Self::Selector(value)),
        }
    }
}

fn leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return None;
    }
    let parsed = digits[..len].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -parsed } else { parsed })
}

/// Resolves a target attribute value relative to `el`.
///
/// Selector failures are logged and treated as "no target".
pub fn resolve_target<H: Dom>(host: &H, el: H::Element, value: &str) -> Option<H::Element> {
    match TargetSpec::parse(value)? {
        TargetSpec::Ancestor(hops) => {
            let mut node = el;
            for _ in 0..hops {
                node = host.parent_element(node)?;
            }
            Some(node)
        }
        TargetSpec::Selector(selector) => {
            let found = match host.closest(el, selector) {
                Ok(Some(found)) => Ok(Some(found)),
                Ok(None) => host.query_selector(selector),
                Err(err) => Err(err),
            };
            found.unwrap_or_else(|err| {
                tracing::debug!(%err, "ignoring target selector");
                None
            })
        }
    }
}

/// Reads the full configuration of `el` from its attributes.
///
/// Returns `None` when the tracking attribute is absent or empty.
pub fn read_config<H: Dom>(host: &H, el: H::Element) -> Option<Config<H::Element>> {
    let raw = host.attribute(el, attr::TRACK).filter(|raw| !raw.is_empty())?;
    let properties = parse_properties(raw);
    let target = host
        .attribute(el, attr::TARGET_PARENT)
        .and_then(|value| resolve_target(host, el, value));
    Some(Config {
        properties,
        name_prefix: name_prefix(host, el),
        target,
    })
}

/// Per-element cache of resolved configs.
///
/// Entries live until [`ConfigResolver::invalidate`] (viewport resize,
/// structural mutation) or [`ConfigResolver::forget`] (cleanup).
#[derive(Debug)]
pub struct ConfigResolver<E> {
    cache: HashMap<E, Rc<Config<E>>>,
}

impl<E> Default for ConfigResolver<E> {
    fn default() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }
}

impl<E: Copy + Eq + core::hash::Hash> ConfigResolver<E> {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached config of `el`, resolving it on a miss.
    pub fn resolve<H: Dom<Element = E>>(&mut self, host: &H, el: E) -> Option<Rc<Config<E>>> {
        if let Some(config) = self.cache.get(&el) {
            return Some(Rc::clone(config));
        }
        let config = Rc::new(read_config(host, el)?);
        self.cache.insert(el, Rc::clone(&config));
        Some(config)
    }

    /// The cached config of `el`, without resolving.
    pub fn cached(&self, el: E) -> Option<Rc<Config<E>>> {
        self.cache.get(&el).cloned()
    }

    /// Drops the cached config of `el`.
    pub fn forget(&mut self, el: E) {
        self.cache.remove(&el);
    }

    /// Drops every cached config.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }
}
