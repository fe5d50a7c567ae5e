// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change detection: last written values and last applied configs.

use alloc::borrow::ToOwned;
use alloc::rc::Rc;
use alloc::string::String;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::config::Config;

/// Per-element memo of what the engine last wrote.
///
/// Writes are elided when the computed value matches the recorded one, so a
/// settle pass with no intervening change touches nothing.
#[derive(Debug)]
pub struct ChangeCache<E> {
    values: HashMap<E, HashMap<String, String>>,
    applied: HashMap<E, Rc<Config<E>>>,
}

impl<E> Default for ChangeCache<E> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
            applied: HashMap::new(),
        }
    }
}

impl<E: Copy + Eq + Hash> ChangeCache<E> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` for `el`/`property`.
    ///
    /// Returns `false` when it equals the previously recorded value.
    pub fn record(&mut self, el: E, property: &str, value: &str) -> bool {
        let values = self.values.entry(el).or_default();
        match values.get_mut(property) {
            Some(previous) if previous == value => false,
            Some(previous) => {
                value.clone_into(previous);
                true
            }
            None => {
                values.insert(property.into(), value.into());
                true
            }
        }
    }

    /// The last recorded value for `el`/`property`.
    pub fn value(&self, el: E, property: &str) -> Option<&str> {
        self.values.get(&el)?.get(property).map(String::as_str)
    }

    /// The config last applied to `el`.
    pub fn applied(&self, el: E) -> Option<Rc<Config<E>>> {
        self.applied.get(&el).cloned()
    }

    /// Whether `el` has an applied config.
    pub fn is_applied(&self, el: E) -> bool {
        self.applied.contains_key(&el)
    }

    /// Remembers `config` as applied to `el`.
    pub fn set_applied(&mut self, el: E, config: Rc<Config<E>>) {
        self.applied.insert(el, config);
    }

    /// Drops everything recorded for `el`.
    pub fn forget(&mut self, el: E) {
        self.values.remove(&el);
        self.applied.remove(&el);
    }

    /// Drops everything.
    pub fn clear(&mut self) {
        self.values.clear();
        self.applied.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_elides_repeats() {
        let mut cache = ChangeCache::<u32>::new();
        assert!(cache.record(1, "height", "10px"));
        assert!(!cache.record(1, "height", "10px"));
        assert!(cache.record(1, "height", "12px"));
        assert_eq!(cache.value(1, "height"), Some("12px"));
        // Same property on another element is independent.
        assert!(cache.record(2, "height", "12px"));
    }

    // An empty computed value is still a value and is recorded once.
    #[test]
    fn empty_value_is_recorded_once() {
        let mut cache = ChangeCache::<u32>::new();
        assert!(cache.record(1, "top", ""));
        assert!(!cache.record(1, "top", ""));
    }

    #[test]
    fn forget_resets_elision() {
        let mut cache = ChangeCache::<u32>::new();
        cache.record(1, "height", "10px");
        cache.forget(1);
        assert_eq!(cache.value(1, "height"), None);
        assert!(cache.record(1, "height", "10px"));
    }
}
