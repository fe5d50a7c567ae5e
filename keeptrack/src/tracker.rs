// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine instance and its entry points.

use core::fmt::Debug;
use core::hash::Hash;

use crate::attr;
use crate::config::{name_prefix, previous_name_prefix};
use crate::host::{Click, FrameHandle, Host, Listeners, Mutation, MutationFilter, ReadyState, TimerHandle};
use crate::lock::{LockEvent, PredictionLock, UnlockReason};
use crate::registry::{self, Registry};
use crate::schedule::{Debounce, cancel_frame, take_frame};
use crate::scroll_padding::{self, Publisher, predict};
use crate::scrollbars::Scrollbars;
use crate::settings::Settings;
use crate::sticky::cleanup_sticky_state;
use crate::sync::ElementSync;

/// Mutation observation options used on the body.
pub const MUTATION_FILTER: MutationFilter = MutationFilter {
    child_list: true,
    subtree: true,
    attribute_old_value: true,
    attributes: attr::WATCHED,
};

/// One tracking instance.
///
/// The instance is inert until [`KeepTrack::init`]. From then on the host
/// reports events through the `on_*` entry points, and every frame or timer
/// the instance requested comes back through
/// [`KeepTrack::on_animation_frame`] and [`KeepTrack::on_timer`].
/// [`KeepTrack::destroy`] reverts everything the instance published.
///
/// All entry points other than `init`, `destroy` and
/// `on_dom_content_loaded` are no-ops while the instance is inactive.
pub struct KeepTrack<E> {
    settings: Option<Settings<E>>,
    deferred: Option<Settings<E>>,
    listeners: Listeners,
    resize_observer: bool,
    mutation_observer: bool,
    registry: Registry<E>,
    elements: ElementSync<E>,
    padding: Publisher,
    lock: PredictionLock,
    scrollbars: Scrollbars,
    resize: Debounce,
    mutations: Debounce,
    poll: Option<FrameHandle>,
    scroll_tick: Option<FrameHandle>,
}

impl<E> Default for KeepTrack<E> {
    fn default() -> Self {
        Self {
            settings: None,
            deferred: None,
            listeners: Listeners::empty(),
            resize_observer: false,
            mutation_observer: false,
            registry: Registry::default(),
            elements: ElementSync::default(),
            padding: Publisher::default(),
            lock: PredictionLock::default(),
            scrollbars: Scrollbars::default(),
            resize: Debounce::default(),
            mutations: Debounce::default(),
            poll: None,
            scroll_tick: None,
        }
    }
}

impl<E: Debug> Debug for KeepTrack<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KeepTrack")
            .field("settings", &self.settings)
            .field("deferred", &self.deferred.is_some())
            .field("listeners", &self.listeners)
            .field("resize_observer", &self.resize_observer)
            .field("mutation_observer", &self.mutation_observer)
            .field("registry", &self.registry)
            .field("published_padding", &self.padding.last())
            .field("lock", &self.lock)
            .field("scrollbars", &self.scrollbars)
            .field("resize", &self.resize)
            .field("mutations", &self.mutations)
            .field("poll", &self.poll)
            .field("scroll_tick", &self.scroll_tick)
            .finish_non_exhaustive()
    }
}

impl<E: Copy + Eq + Hash + Debug> KeepTrack<E> {
    /// Creates an inactive instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `init` completed and `destroy` has not run since.
    pub fn is_active(&self) -> bool {
        self.settings.is_some()
    }

    /// Whether `init` is waiting for `DOMContentLoaded`.
    pub fn is_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// The active settings.
    pub fn settings(&self) -> Option<&Settings<E>> {
        self.settings.as_ref()
    }

    /// Tracked elements in registry order.
    pub fn tracked(&self) -> &[E] {
        self.registry.elements()
    }

    /// Whether a scroll-padding prediction currently holds the lock.
    pub fn is_predicting(&self) -> bool {
        self.lock.is_locked()
    }

    /// Starts tracking with `settings`, tearing down any previous run first.
    ///
    /// Without a body, `init` waits for `DOMContentLoaded` if the document is
    /// still loading and otherwise does nothing.
    pub fn init<H: Host<Element = E>>(&mut self, host: &mut H, settings: Settings<E>) {
        self.destroy(host);
        let Some(body) = host.body() else {
            if host.ready_state() == ReadyState::Loading {
                host.add_listeners(Listeners::DOM_CONTENT_LOADED);
                self.listeners = Listeners::DOM_CONTENT_LOADED;
                self.deferred = Some(settings);
                tracing::debug!("no body yet, deferring init");
            } else {
                tracing::debug!("no body, not initializing");
            }
            return;
        };

        let mut listeners =
            Listeners::RESIZE | Listeners::CLICK | Listeners::HASH_CHANGE | Listeners::POP_STATE;
        if settings.detect_sticky {
            listeners |= Listeners::SCROLL;
        }
        host.add_listeners(listeners);
        self.listeners = listeners;
        self.resize_observer = host.connect_resize_observer();
        host.observe_mutations(body, &MUTATION_FILTER);
        self.mutation_observer = true;

        let poll = settings.poll;
        tracing::debug!(?settings, "initializing");
        self.settings = Some(settings);
        if poll {
            self.poll = Some(host.request_animation_frame());
        }

        self.update_scrollbars(host);
        self.refresh_elements(host);
        self.apply_all(host);
        self.check_sticky(host);
        self.reactive_padding(host);
        self.predict_from_hash(host);
        tracing::debug!(tracked = self.registry.len(), "initialized");
    }

    /// Stops tracking and reverts everything this instance published.
    ///
    /// Valid at any time, including before `init` and while `init` is
    /// deferred.
    pub fn destroy<H: Host<Element = E>>(&mut self, host: &mut H) {
        if !self.listeners.is_empty() {
            host.remove_listeners(self.listeners);
            self.listeners = Listeners::empty();
        }
        if core::mem::take(&mut self.resize_observer) {
            host.disconnect_resize_observer();
        }
        if core::mem::take(&mut self.mutation_observer) {
            host.disconnect_mutations();
        }
        self.resize.cancel(host);
        self.mutations.cancel(host);
        cancel_frame(host, &mut self.poll);
        cancel_frame(host, &mut self.scroll_tick);
        self.lock.release(host);

        for el in self.registry.clear() {
            self.elements.cleanup(host, el, None);
        }
        self.elements.configs.invalidate();
        self.elements.changes.clear();
        self.elements.sticky.reset(host);
        self.scrollbars.clear(host);
        self.padding.clear(host);

        let was_active = self.settings.take().is_some();
        let was_deferred = self.deferred.take().is_some();
        if was_active || was_deferred {
            tracing::debug!(was_active, was_deferred, "destroyed");
        }
    }

    /// Runs a full synchronous pass, bypassing debouncing.
    pub fn recalculate<H: Host<Element = E>>(&mut self, host: &mut H) {
        if !self.is_active() {
            return;
        }
        self.update_scrollbars(host);
        self.elements.sticky.invalidate_offsets();
        self.apply_all(host);
        self.check_sticky(host);
        self.reactive_padding(host);
    }

    /// Starts tracking `el` outside the attribute-driven registry.
    pub fn observe<H: Host<Element = E>>(&mut self, host: &mut H, el: E) {
        if !self.is_active() || !self.registry.insert(el) {
            return;
        }
        if self.resize_observer {
            host.observe_resize(el);
        }
        self.apply(host, el);
        self.reactive_padding(host);
    }

    /// Stops tracking `el` and cleans up after it.
    pub fn unobserve<H: Host<Element = E>>(&mut self, host: &mut H, el: E) {
        if !self.is_active() || !self.registry.remove(el) {
            return;
        }
        if self.resize_observer {
            host.unobserve_resize(el);
        }
        self.elements.cleanup(host, el, None);
        self.reactive_padding(host);
    }

    /// The viewport was resized.
    pub fn on_viewport_resize<H: Host<Element = E>>(&mut self, host: &mut H) {
        if let Some(settings) = &self.settings {
            self.resize.trigger(host, settings.debounce);
        }
    }

    /// The resize observer reported `elements`.
    pub fn on_element_resize<H: Host<Element = E>>(&mut self, host: &mut H, elements: &[E]) {
        if !self.is_active() {
            return;
        }
        for &el in elements {
            self.apply(host, el);
        }
        self.reactive_padding(host);
    }

    /// The mutation observer reported a batch.
    ///
    /// Attribute changes are handled immediately; relevant batches also
    /// schedule a debounced reconciliation.
    pub fn on_mutations<H: Host<Element = E>>(&mut self, host: &mut H, mutations: &[Mutation<E>]) {
        if !self.is_active() {
            return;
        }
        for mutation in mutations {
            if let Mutation::Attribute {
                target,
                name,
                old_value,
            } = mutation
            {
                self.attribute_changed(host, *target, name, old_value.as_deref());
            }
        }
        if registry::is_relevant(host, mutations) {
            if let Some(settings) = &self.settings {
                self.mutations.trigger(host, settings.debounce);
            }
        }
    }

    /// The window scrolled.
    pub fn on_scroll<H: Host<Element = E>>(&mut self, host: &mut H) {
        let detect = self.settings.as_ref().is_some_and(|s| s.detect_sticky);
        if detect && self.scroll_tick.is_none() {
            self.scroll_tick = Some(host.request_animation_frame());
        }
    }

    /// The window fired `scrollend`.
    pub fn on_scroll_end<H: Host<Element = E>>(&mut self, host: &mut H) {
        if let LockEvent::Release(reason) = self.lock.on_scroll_end() {
            self.unlock(host, reason);
        }
    }

    /// A click reached the document.
    ///
    /// Plain primary clicks on same-page anchors run a prediction for the
    /// anchor's target.
    pub fn on_click<H: Host<Element = E>>(&mut self, host: &mut H, click: &Click<E>) {
        if !self.is_active()
            || click.default_prevented
            || click.button != 0
            || !click.modifiers.is_empty()
        {
            return;
        }
        let Some(anchor) = click.target.and_then(|target| closest_fragment_link(host, target)) else {
            return;
        };
        let Some(target) = host
            .attribute(anchor, "href")
            .and_then(|href| href.get(1..))
            .filter(|id| !id.is_empty())
            .and_then(|id| host.element_by_id(id))
        else {
            return;
        };
        self.predict_for(host, target);
    }

    /// The location hash changed.
    pub fn on_hash_change<H: Host<Element = E>>(&mut self, host: &mut H) {
        if self.is_active() {
            self.predict_from_hash(host);
        }
    }

    /// History navigation happened.
    pub fn on_pop_state<H: Host<Element = E>>(&mut self, host: &mut H) {
        if self.is_active() {
            self.predict_from_hash(host);
        }
    }

    /// The document finished parsing; completes a deferred `init`.
    pub fn on_dom_content_loaded<H: Host<Element = E>>(&mut self, host: &mut H) {
        let Some(settings) = self.deferred.take() else {
            return;
        };
        host.remove_listeners(Listeners::DOM_CONTENT_LOADED);
        self.listeners.remove(Listeners::DOM_CONTENT_LOADED);
        self.init(host, settings);
    }

    /// A frame this instance requested has arrived.
    pub fn on_animation_frame<H: Host<Element = E>>(&mut self, host: &mut H, handle: FrameHandle) {
        if !self.is_active() {
            return;
        }
        if self.resize.on_frame(handle) {
            self.after_viewport_resize(host);
        } else if self.mutations.on_frame(handle) {
            self.after_mutations(host);
        } else if take_frame(&mut self.poll, handle) {
            self.apply_all(host);
            self.reactive_padding(host);
            self.poll = Some(host.request_animation_frame());
        } else if take_frame(&mut self.scroll_tick, handle) {
            self.check_sticky(host);
            self.reactive_padding(host);
        } else if let LockEvent::Release(reason) = self.lock.on_frame(host, handle) {
            self.unlock(host, reason);
        }
    }

    /// A timer this instance started has fired.
    pub fn on_timer<H: Host<Element = E>>(&mut self, host: &mut H, handle: TimerHandle) {
        if !self.is_active() {
            return;
        }
        if self.resize.on_timer(host, handle) || self.mutations.on_timer(host, handle) {
            return;
        }
        if let LockEvent::Release(reason) = self.lock.on_timer(handle) {
            self.unlock(host, reason);
        }
    }

    fn after_viewport_resize<H: Host<Element = E>>(&mut self, host: &mut H) {
        self.update_scrollbars(host);
        self.elements.invalidate_configs();
        self.elements.sticky.invalidate_offsets();
        self.apply_all(host);
        self.check_sticky(host);
        self.reactive_padding(host);
    }

    fn after_mutations<H: Host<Element = E>>(&mut self, host: &mut H) {
        self.elements.invalidate_configs();
        self.elements.sticky.invalidate_offsets();
        self.refresh_elements(host);
        self.apply_all(host);
        self.check_sticky(host);
        self.reactive_padding(host);
    }

    fn attribute_changed<H: Host<Element = E>>(
        &mut self,
        host: &mut H,
        el: E,
        name: &str,
        old_value: Option<&str>,
    ) {
        let tracked = host.has_attribute(el, attr::TRACK);
        match name {
            attr::TRACK => {
                if !tracked {
                    self.elements.cleanup(host, el, None);
                }
            }
            attr::SCROLL_PADDING => {
                if !host.has_attribute(el, attr::SCROLL_PADDING) {
                    cleanup_sticky_state(host, el, None);
                }
            }
            attr::ID | attr::ELEMENT_ID => {
                let previous = previous_name_prefix(host, el, name, old_value);
                if !self.elements.is_applied(el)
                    && host.has_attribute(el, attr::SCROLL_PADDING)
                    && previous.is_some()
                    && previous != name_prefix(host, el)
                {
                    cleanup_sticky_state(host, el, previous.as_deref());
                }
                if tracked {
                    self.reapply(host, el);
                }
            }
            _ => {
                if tracked {
                    self.reapply(host, el);
                }
            }
        }
    }

    fn reapply<H: Host<Element = E>>(&mut self, host: &mut H, el: E) {
        self.elements.cleanup(host, el, None);
        self.elements.invalidate_configs();
        self.apply(host, el);
        self.reactive_padding(host);
    }

    fn refresh_elements<H: Host<Element = E>>(&mut self, host: &mut H) {
        let next = host.elements_with_any_attribute(attr::TRACKING);
        let diff = self.registry.replace(next);
        for &el in &diff.removed {
            if self.resize_observer {
                host.unobserve_resize(el);
            }
            self.elements.cleanup(host, el, None);
        }
        if self.resize_observer {
            for &el in &diff.added {
                host.observe_resize(el);
            }
        }
        if !diff.added.is_empty() || !diff.removed.is_empty() {
            tracing::debug!(
                added = diff.added.len(),
                removed = diff.removed.len(),
                tracked = self.registry.len(),
                "reconciled"
            );
        }
    }

    fn apply<H: Host<Element = E>>(&mut self, host: &mut H, el: E) {
        if let Some(settings) = self.settings.as_mut() {
            self.elements.apply(host, &mut settings.on_change, el);
        }
    }

    fn apply_all<H: Host<Element = E>>(&mut self, host: &mut H) {
        let Some(settings) = self.settings.as_mut() else {
            return;
        };
        for &el in self.registry.elements() {
            self.elements.apply(host, &mut settings.on_change, el);
        }
    }

    fn check_sticky<H: Host<Element = E>>(&mut self, host: &mut H) {
        let Some(settings) = self.settings.as_mut() else {
            return;
        };
        if !settings.detect_sticky {
            return;
        }
        let sync = &mut self.elements;
        sync.sticky.check(
            host,
            &mut sync.configs,
            self.registry.elements(),
            settings.sticky_top_dynamic,
            &mut settings.on_change,
        );
    }

    fn update_scrollbars<H: Host<Element = E>>(&mut self, host: &mut H) {
        if let Some(settings) = &self.settings {
            self.scrollbars
                .update(host, settings.scrollbar_width, settings.scrollbar_height);
        }
    }

    fn reactive_padding<H: Host<Element = E>>(&mut self, host: &mut H) {
        let Some(settings) = &self.settings else {
            return;
        };
        if self.lock.is_locked() {
            return;
        }
        match scroll_padding::reactive_padding(host, self.registry.elements(), settings.detect_sticky) {
            Some(px) => self.padding.set(host, px, false),
            None => self.padding.clear(host),
        }
    }

    fn predict_from_hash<H: Host<Element = E>>(&mut self, host: &mut H) {
        let hash = host.location_hash();
        let target = hash
            .get(1..)
            .filter(|id| !id.is_empty())
            .and_then(|id| host.element_by_id(id));
        if let Some(target) = target {
            self.predict_for(host, target);
        }
    }

    fn predict_for<H: Host<Element = E>>(&mut self, host: &mut H, target: E) {
        let dynamic = self.settings.as_ref().is_some_and(|s| s.sticky_top_dynamic);
        let target_doc_top = host.bounding_client_rect(target).y0 + host.scroll_y();
        let candidates = scroll_padding::collect_candidates(
            host,
            &mut self.elements.sticky,
            self.registry.elements(),
            dynamic,
        );
        let prediction = predict(target_doc_top, &candidates);
        tracing::debug!(
            ?target,
            target_doc_top,
            candidates = candidates.len(),
            padding = prediction.padding,
            iterations = prediction.iterations,
            converged = prediction.converged,
            "predicted scroll padding"
        );
        match prediction.value() {
            Some(px) => self.padding.set(host, px, true),
            None => self.padding.clear(host),
        }
        self.lock.lock(host);
    }

    fn unlock<H: Host<Element = E>>(&mut self, host: &mut H, reason: UnlockReason) {
        if self.lock.release(host) {
            tracing::debug!(?reason, "prediction lock released");
            self.reactive_padding(host);
        }
    }
}

/// Nearest ancestor-or-self `<a>` whose `href` starts with `#`.
fn closest_fragment_link<H: Host>(host: &H, el: H::Element) -> Option<H::Element> {
    let mut node = Some(el);
    while let Some(current) = node {
        if is_fragment_link(host, current) {
            return Some(current);
        }
        node = host.parent_element(current);
    }
    None
}

fn is_fragment_link<H: Host>(host: &H, el: H::Element) -> bool {
    host.tag_name(el) == "a"
        && host
            .attribute(el, "href")
            .is_some_and(|href| href.starts_with('#'))
}
