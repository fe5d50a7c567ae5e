// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The set of tracked elements and mutation relevance.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;

use crate::attr;
use crate::host::{Dom, Mutation};

/// Ordered set of tracked elements.
///
/// Order is the host's document order for reconciled elements, with
/// explicitly observed elements appended.
#[derive(Clone, Debug)]
pub struct Registry<E> {
    elements: Vec<E>,
    members: HashSet<E>,
}

/// Outcome of [`Registry::replace`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciled<E> {
    /// Newly tracked elements.
    pub added: Vec<E>,
    /// Elements no longer tracked.
    pub removed: Vec<E>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            members: HashSet::new(),
        }
    }
}

impl<E: Copy + Eq + Hash> Registry<E> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracked elements in order.
    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    /// Number of tracked elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether `el` is tracked.
    pub fn contains(&self, el: E) -> bool {
        self.members.contains(&el)
    }

    /// Appends `el`. Returns `false` if it was already tracked.
    pub fn insert(&mut self, el: E) -> bool {
        if !self.members.insert(el) {
            return false;
        }
        self.elements.push(el);
        true
    }

    /// Removes `el`. Returns `false` if it was not tracked.
    pub fn remove(&mut self, el: E) -> bool {
        if !self.members.remove(&el) {
            return false;
        }
        self.elements.retain(|e| *e != el);
        true
    }

    /// Replaces the whole set, reporting the difference.
    pub fn replace(&mut self, next: Vec<E>) -> Reconciled<E> {
        let next_members: HashSet<E> = next.iter().copied().collect();
        let removed = self
            .elements
            .iter()
            .copied()
            .filter(|el| !next_members.contains(el))
            .collect();
        let added = next
            .iter()
            .copied()
            .filter(|el| !self.members.contains(el))
            .collect();
        self.elements = next;
        self.members = next_members;
        Reconciled { added, removed }
    }

    /// Empties the registry, returning what was tracked.
    pub fn clear(&mut self) -> Vec<E> {
        self.members.clear();
        core::mem::take(&mut self.elements)
    }
}

/// Whether a mutation batch can change the tracked set or its configuration.
///
/// Watched attribute changes always count. Child-list changes count only when
/// an added or removed element, or one of its descendants, carries a tracking
/// attribute.
pub(crate) fn is_relevant<H: Dom>(host: &H, mutations: &[Mutation<H::Element>]) -> bool {
    mutations.iter().any(|mutation| match mutation {
        Mutation::Attribute { name, .. } => attr::WATCHED.contains(&name.as_str()),
        Mutation::ChildList { added, removed } => added
            .iter()
            .chain(removed)
            .any(|&node| host.subtree_has_any_attribute(node, attr::TRACKING)),
    })
}
