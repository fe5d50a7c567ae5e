// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stuck/unstuck detection for sticky elements.

use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::attr;
use crate::config::{ConfigResolver, name_prefix, variable_name};
use crate::geometry::{Measurers, resolve_top_px};
use crate::host::{Dom, Priority};
use crate::settings::{OnChange, notify};

/// Maximum distance in pixels between the live top and the sticky offset for
/// an element to count as stuck.
pub const STUCK_TOLERANCE: f64 = 1.5;

/// Whether `el` computes to `position: sticky`.
pub(crate) fn is_sticky<H: Dom>(host: &H, el: H::Element) -> bool {
    host.computed_style(el, "position") == "sticky"
}

/// Whether an element whose viewport top is `live_top` sits at `offset`.
pub fn is_stuck_at(live_top: f64, offset: f64) -> bool {
    (live_top - offset).abs() < STUCK_TOLERANCE
}

/// Removes every trace of stuck state from `el`.
///
/// That is the root `--{prefix}-stuck` (`prefix_override`, else the current
/// prefix), the element's own `--stuck`, and the marker attribute.
pub fn cleanup_sticky_state<H: Dom>(host: &mut H, el: H::Element, prefix_override: Option<&str>) {
    let prefix = match prefix_override {
        Some(prefix) => Some(prefix.into()),
        None => name_prefix(host, el),
    };
    if let Some(prefix) = prefix {
        let root = host.document_element();
        host.remove_style_property(root, &variable_name(Some(&prefix), "stuck"));
    }
    host.remove_style_property(el, "--stuck");
    host.remove_attribute(el, attr::STUCK);
}

/// Cached sticky facts and the probes used to resolve offsets.
#[derive(Debug)]
pub struct StickyTracker<E> {
    flags: HashMap<E, bool>,
    offsets: HashMap<E, f64>,
    measurers: Measurers<E>,
}

impl<E> Default for StickyTracker<E> {
    fn default() -> Self {
        Self {
            flags: HashMap::new(),
            offsets: HashMap::new(),
            measurers: Measurers::default(),
        }
    }
}

impl<E: Copy + Eq + Hash + Debug> StickyTracker<E> {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// The probes created so far.
    pub fn measurers(&self) -> &Measurers<E> {
        &self.measurers
    }

    /// Resolved sticky offset of `el` in pixels.
    ///
    /// Resolved offsets are cached unless `dynamic` is set. Unresolved offsets
    /// are never cached, so a later pass gets another chance.
    pub fn offset<H: Dom<Element = E>>(&mut self, host: &mut H, el: E, dynamic: bool) -> Option<f64> {
        if !dynamic {
            if let Some(&offset) = self.offsets.get(&el) {
                return Some(offset);
            }
        }
        let offset = resolve_top_px(host, &mut self.measurers, el);
        match offset {
            Some(offset) if !dynamic => {
                self.offsets.insert(el, offset);
            }
            Some(_) => {}
            None => tracing::trace!(?el, "sticky offset unresolved"),
        }
        offset
    }

    /// Whether `el` is sticky, remembering the answer when `cacheable`.
    fn is_sticky<H: Dom<Element = E>>(&mut self, host: &H, el: E, cacheable: bool) -> bool {
        if !cacheable {
            return is_sticky(host, el);
        }
        *self.flags.entry(el).or_insert_with(|| is_sticky(host, el))
    }

    /// Re-evaluates stuck state of every candidate in `elements`.
    ///
    /// Only elements carrying a tracking or scroll-padding attribute are
    /// considered. Returns the number of transitions.
    pub fn check<H: Dom<Element = E>>(
        &mut self,
        host: &mut H,
        configs: &mut ConfigResolver<E>,
        elements: &[E],
        dynamic: bool,
        on_change: &mut Option<OnChange<E>>,
    ) -> usize {
        let mut transitions = 0;
        for &el in elements {
            if !attr::TRACKING.iter().any(|name| host.has_attribute(el, name)) {
                continue;
            }
            let has_config = configs.resolve(host, el).is_some();
            if !self.is_sticky(host, el, has_config) {
                continue;
            }
            let live_top = host.bounding_client_rect(el).y0;
            let Some(offset) = self.offset(host, el, dynamic) else {
                continue;
            };
            let stuck = is_stuck_at(live_top, offset);
            if stuck == host.has_attribute(el, attr::STUCK) {
                continue;
            }
            if stuck {
                host.set_attribute(el, attr::STUCK, "");
            } else {
                host.remove_attribute(el, attr::STUCK);
            }
            let value = if stuck { "1" } else { "0" };
            match name_prefix(host, el) {
                Some(prefix) => {
                    let root = host.document_element();
                    let name = variable_name(Some(&prefix), "stuck");
                    host.set_style_property(root, &name, value, Priority::Normal);
                }
                None => host.set_style_property(el, "--stuck", value, Priority::Normal),
            }
            notify(on_change, el, "stuck", value);
            tracing::trace!(?el, stuck, "sticky transition");
            transitions += 1;
        }
        transitions
    }

    /// Drops cached "is sticky" flags; they follow the config cache.
    pub fn invalidate_flags(&mut self) {
        self.flags.clear();
    }

    /// Drops cached offsets.
    pub fn invalidate_offsets(&mut self) {
        self.offsets.clear();
    }

    /// Drops everything cached for `el`.
    pub fn forget(&mut self, el: E) {
        self.flags.remove(&el);
        self.offsets.remove(&el);
    }

    /// Drops all caches and detaches every probe.
    pub fn reset<H: Dom<Element = E>>(&mut self, host: &mut H) {
        self.flags.clear();
        self.offsets.clear();
        self.measurers.remove_all(host);
    }
}
