// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mirroring computed styles into custom properties, and undoing it.

use alloc::rc::Rc;
use core::fmt::Debug;
use core::hash::Hash;

use crate::cache::ChangeCache;
use crate::config::{Config, ConfigResolver};
use crate::host::{Dom, Priority};
use crate::settings::{OnChange, notify};
use crate::sticky::{StickyTracker, cleanup_sticky_state};

/// Per-element side tables of one engine instance.
#[derive(Debug)]
pub struct ElementSync<E> {
    /// Resolved configs.
    pub configs: ConfigResolver<E>,
    /// Written values and applied configs.
    pub changes: ChangeCache<E>,
    /// Sticky facts and offset probes.
    pub sticky: StickyTracker<E>,
}

impl<E> Default for ElementSync<E> {
    fn default() -> Self {
        Self {
            configs: ConfigResolver::default(),
            changes: ChangeCache::default(),
            sticky: StickyTracker::default(),
        }
    }
}

impl<E: Copy + Eq + Hash + Debug> ElementSync<E> {
    /// Creates empty side tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings the custom properties of `el` up to date.
    ///
    /// A config that differs from the applied one is cleaned up first. Only
    /// values that changed since the last write are written, and each one
    /// fires the change callback once.
    pub fn apply<H: Dom<Element = E>>(
        &mut self,
        host: &mut H,
        on_change: &mut Option<OnChange<E>>,
        el: E,
    ) {
        let config = self.configs.resolve(host, el).filter(|c| c.is_trackable());
        let Some(config) = config else {
            if self.changes.is_applied(el) {
                self.cleanup(host, el, None);
            }
            return;
        };
        if let Some(previous) = self.changes.applied(el) {
            if previous != config {
                self.cleanup(host, el, Some(previous));
                // Cleanup purges the config cache too; keep the fresh one.
                self.configs.resolve(host, el);
            }
        }
        let root = host.document_element();
        let on = config.placement().resolve(el, root);
        for property in &config.properties {
            let value = host.computed_style(el, property);
            if !self.changes.record(el, property, &value) {
                continue;
            }
            host.set_style_property(on, &config.variable_name(property), &value, Priority::Normal);
            notify(on_change, el, property, &value);
        }
        self.changes.set_applied(el, config);
    }

    /// Removes everything `el` published and purges its caches.
    ///
    /// The config to undo is `config`, else the applied one, else the cached
    /// resolved one. Safe to call on elements that were never applied.
    pub fn cleanup<H: Dom<Element = E>>(&mut self, host: &mut H, el: E, config: Option<Rc<Config<E>>>) {
        let config = config
            .or_else(|| self.changes.applied(el))
            .or_else(|| self.configs.cached(el));
        if let Some(config) = &config {
            let root = host.document_element();
            let on = config.placement().resolve(el, root);
            for property in &config.properties {
                host.remove_style_property(on, &config.variable_name(property));
            }
        }
        let prefix = config.as_ref().and_then(|c| c.name_prefix.as_deref());
        cleanup_sticky_state(host, el, prefix);
        self.changes.forget(el);
        self.configs.forget(el);
        self.sticky.forget(el);
    }

    /// Whether `el` currently has published properties.
    pub fn is_applied(&self, el: E) -> bool {
        self.changes.is_applied(el)
    }

    /// Drops resolved configs and the sticky flags derived from them.
    pub fn invalidate_configs(&mut self) {
        self.configs.invalidate();
        self.sticky.invalidate_flags();
    }
}
