// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Driving an engine instance against a [`Document`].

use core::time::Duration;

use keeptrack::{Click, KeepTrack, Settings};

use crate::{Document, HostEvent, NodeId};

/// A document plus an engine, with an event loop the test steps by hand.
///
/// Work the document queues (events, mutation records, resize records) is
/// delivered by [`Harness::pump`], which every stepping method calls first.
/// Frames run only in [`Harness::frame`], timers only in
/// [`Harness::advance`].
#[derive(Debug)]
pub struct Harness {
    /// The host.
    pub doc: Document,
    /// The engine under test.
    pub keeptrack: KeepTrack<NodeId>,
}

impl Harness {
    /// Wraps `doc` with an inactive engine.
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            keeptrack: KeepTrack::new(),
        }
    }

    /// Initializes the engine and delivers whatever that queued.
    pub fn init(&mut self, settings: Settings<NodeId>) {
        self.keeptrack.init(&mut self.doc, settings);
        self.pump();
    }

    /// Destroys the engine.
    pub fn destroy(&mut self) {
        self.keeptrack.destroy(&mut self.doc);
    }

    /// Forces a synchronous pass.
    pub fn recalculate(&mut self) {
        self.keeptrack.recalculate(&mut self.doc);
    }

    /// Delivers queued records and events until the document is quiet.
    pub fn pump(&mut self) {
        loop {
            let mutations = self.doc.take_mutations();
            let events = self.doc.take_events();
            if mutations.is_empty() && events.is_empty() {
                return;
            }
            if !mutations.is_empty() {
                self.keeptrack.on_mutations(&mut self.doc, &mutations);
            }
            for event in events {
                self.dispatch(event);
            }
        }
    }

    fn dispatch(&mut self, event: HostEvent) {
        tracing::trace!(?event, "dispatching");
        let doc = &mut self.doc;
        match event {
            HostEvent::ViewportResize => self.keeptrack.on_viewport_resize(doc),
            HostEvent::Scroll => self.keeptrack.on_scroll(doc),
            HostEvent::ScrollEnd => self.keeptrack.on_scroll_end(doc),
            HostEvent::HashChange => self.keeptrack.on_hash_change(doc),
            HostEvent::PopState => self.keeptrack.on_pop_state(doc),
            HostEvent::DomContentLoaded => self.keeptrack.on_dom_content_loaded(doc),
            HostEvent::ElementResize(elements) => self.keeptrack.on_element_resize(doc, &elements),
        }
    }

    /// Runs one animation frame: every frame requested so far.
    pub fn frame(&mut self) {
        self.pump();
        for handle in self.doc.take_frames() {
            self.keeptrack.on_animation_frame(&mut self.doc, handle);
        }
        self.pump();
    }

    /// Moves the clock forward, firing due timers in order.
    pub fn advance(&mut self, by: Duration) {
        self.pump();
        let deadline = self.doc.now() + by;
        while let Some(timer) = self.doc.pop_due_timer(deadline) {
            self.keeptrack.on_timer(&mut self.doc, timer);
            self.pump();
        }
        self.doc.set_now(deadline);
    }

    /// Lets debounced work run: advances past the debounce interval, then runs
    /// a frame.
    pub fn settle(&mut self) {
        let debounce = self
            .keeptrack
            .settings()
            .map_or(Duration::from_millis(250), |s| s.debounce);
        self.advance(debounce + Duration::from_millis(1));
        self.frame();
    }

    /// A plain primary click on `target`.
    pub fn click(&mut self, target: NodeId) {
        self.click_with(&Click::primary(target));
    }

    /// Delivers `click` to the engine.
    pub fn click_with(&mut self, click: &Click<NodeId>) {
        self.pump();
        if self.doc.listeners().contains(keeptrack::Listeners::CLICK) {
            self.keeptrack.on_click(&mut self.doc, click);
        }
        self.pump();
    }
}
