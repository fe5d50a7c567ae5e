// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! KeepTrack Reference Host.
//!
//! This crate provides [`Document`], a small in-memory implementation of the
//! [`keeptrack::Host`] traits, and a [`Harness`] that pumps a document's
//! queued work into a [`KeepTrack`](keeptrack::KeepTrack) instance.
//!
//! It is intentionally *not* a browser:
//! - Layout is whatever the test assigns with [`Document::set_box`]; nothing
//!   flows.
//! - Computed styles are inline declarations over a per-element "sheet" and a
//!   handful of defaults.
//! - The sticky model is the one-axis clamp `max(natural, min(top, container
//!   bottom - height))`, which is enough to make elements stick and unstick.
//! - Time only moves when the test advances it.
//!
//! Everything the engine does to the document is observable: inline styles,
//! attributes, the number of style writes, attached listeners, observers,
//! and pending frames and timers.

#![no_std]

extern crate alloc;

mod calc;
mod harness;
mod selector;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::time::Duration;

use hashbrown::HashSet;
use keeptrack::geometry::{TopValue, parse_float_prefix};
use keeptrack::{
    Dom, FrameHandle, Listeners, Mutation, MutationFilter, Observers, Priority, ReadyState,
    Scheduler, SelectorError, TimerHandle,
};
use kurbo::{Rect, Size};

pub use harness::Harness;

use crate::calc::Units;
use crate::selector::Selector;

/// Element handle of a [`Document`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Something the document wants to tell the engine about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostEvent {
    /// The viewport changed size.
    ViewportResize,
    /// The viewport scrolled.
    Scroll,
    /// A scroll finished.
    ScrollEnd,
    /// The location hash changed.
    HashChange,
    /// History navigation.
    PopState,
    /// The document finished parsing.
    DomContentLoaded,
    /// Observed elements changed size.
    ElementResize(Vec<NodeId>),
}

#[derive(Clone, Debug)]
struct Node {
    tag: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<(String, String)>,
    inline: Vec<(String, String, Priority)>,
    sheet: Vec<(String, String)>,
    layout: Rect,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
            inline: Vec::new(),
            sheet: Vec::new(),
            layout: Rect::ZERO,
        }
    }
}

const DEFAULT_STYLE: &[(&str, &str)] = &[
    ("position", "static"),
    ("display", "block"),
    ("top", "auto"),
    ("font-size", "16px"),
    ("padding-top", "0px"),
    ("padding-bottom", "0px"),
    ("border-top-width", "0px"),
    ("border-bottom-width", "0px"),
];

/// An in-memory document implementing [`keeptrack::Host`].
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    body: Option<NodeId>,
    ready_state: ReadyState,
    location_hash: String,
    scroll_y: f64,
    viewport: Size,
    scrollbar: Size,

    /// Whether the platform fires `scrollend`.
    pub supports_scroll_end: bool,
    /// Whether a resize observer can be created.
    pub resize_observer_available: bool,
    /// Whether [`Dom::computed_top_px`] resolves expressions.
    pub typed_top: bool,

    listeners: Listeners,
    resize_connected: bool,
    resize_observed: HashSet<NodeId>,
    mutation_root: Option<(NodeId, MutationFilter)>,
    mutations: Vec<Mutation<NodeId>>,
    events: Vec<HostEvent>,
    style_writes: usize,

    now: Duration,
    next_handle: u64,
    frames: Vec<FrameHandle>,
    timers: Vec<(TimerHandle, Duration)>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A parsed document with `<html>` and `<body>` and a 1024×768 viewport.
    pub fn new() -> Self {
        let mut doc = Self::loading();
        doc.attach_body();
        doc.ready_state = ReadyState::Complete;
        doc.events.clear();
        doc
    }

    /// A document still being parsed: `<html>` only.
    pub fn loading() -> Self {
        let viewport = Size::new(1024.0, 768.0);
        let mut html = Node::new("html");
        html.layout = Rect::new(0.0, 0.0, viewport.width, 10_000.0);
        Self {
            nodes: vec![html],
            body: None,
            ready_state: ReadyState::Loading,
            location_hash: String::new(),
            scroll_y: 0.0,
            viewport,
            scrollbar: Size::ZERO,
            supports_scroll_end: true,
            resize_observer_available: true,
            typed_top: false,
            listeners: Listeners::empty(),
            resize_connected: false,
            resize_observed: HashSet::new(),
            mutation_root: None,
            mutations: Vec::new(),
            events: Vec::new(),
            style_writes: 0,
            now: Duration::ZERO,
            next_handle: 0,
            frames: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Creates `<body>`, finishes parsing, and fires `DOMContentLoaded`.
    pub fn attach_body(&mut self) -> NodeId {
        if let Some(body) = self.body {
            return body;
        }
        let root = self.document_element();
        let body = self.create_element("body");
        self.nodes[body.index()].layout = self.node(root).layout;
        self.append_child(root, body);
        self.body = Some(body);
        self.ready_state = ReadyState::Interactive;
        self.emit(Listeners::DOM_CONTENT_LOADED, HostEvent::DomContentLoaded);
        body
    }

    /// Sets the ready state without touching the tree.
    pub fn set_ready_state(&mut self, state: ReadyState) {
        self.ready_state = state;
    }

    /// Creates an element under `parent`.
    pub fn append(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let el = self.create_element(tag);
        self.append_child(parent, el);
        el
    }

    /// Sets an author stylesheet value for `el`. Not a DOM mutation.
    pub fn set_sheet_style(&mut self, el: NodeId, property: &str, value: &str) {
        let sheet = &mut self.nodes[el.index()].sheet;
        match sheet.iter_mut().find(|(p, _)| p == property) {
            Some(entry) => entry.1 = value.to_string(),
            None => sheet.push((property.to_string(), value.to_string())),
        }
    }

    /// Places `el` at `rect` in document coordinates.
    ///
    /// A size change on an observed element queues a resize record.
    pub fn set_box(&mut self, el: NodeId, rect: Rect) {
        let previous = core::mem::replace(&mut self.nodes[el.index()].layout, rect);
        if previous.size() != rect.size() && self.resize_connected && self.resize_observed.contains(&el) {
            match self.events.iter_mut().find_map(|e| match e {
                HostEvent::ElementResize(list) => Some(list),
                _ => None,
            }) {
                Some(list) if !list.contains(&el) => list.push(el),
                Some(_) => {}
                None => self.events.push(HostEvent::ElementResize(vec![el])),
            }
        }
    }

    /// Scrolls the viewport to `y`.
    pub fn scroll_to(&mut self, y: f64) {
        if self.scroll_y == y {
            return;
        }
        self.scroll_y = y;
        self.emit(Listeners::SCROLL, HostEvent::Scroll);
    }

    /// Reports the end of a scroll.
    pub fn finish_scroll(&mut self) {
        if self.supports_scroll_end {
            self.emit(Listeners::SCROLL_END, HostEvent::ScrollEnd);
        }
    }

    /// Resizes the viewport.
    pub fn resize_viewport(&mut self, size: Size) {
        self.viewport = size;
        self.emit(Listeners::RESIZE, HostEvent::ViewportResize);
    }

    /// Sets the scrollbar thickness subtracted from the root's client size.
    pub fn set_scrollbar(&mut self, thickness: Size) {
        self.scrollbar = thickness;
    }

    /// Sets the location hash, firing `hashchange` when it changed.
    pub fn set_location_hash(&mut self, hash: &str) {
        if self.location_hash == hash {
            return;
        }
        self.location_hash = hash.to_string();
        self.emit(Listeners::HASH_CHANGE, HostEvent::HashChange);
    }

    /// Sets the location hash as history navigation would.
    pub fn pop_state(&mut self, hash: &str) {
        self.location_hash = hash.to_string();
        self.emit(Listeners::POP_STATE, HostEvent::PopState);
    }

    /// Inline style value of `el`, if declared.
    pub fn style(&self, el: NodeId, property: &str) -> Option<&str> {
        self.node(el)
            .inline
            .iter()
            .find(|(p, ..)| p == property)
            .map(|(_, v, _)| v.as_str())
    }

    /// Every inline declaration of `el` whose name starts with `--`.
    pub fn custom_properties(&self, el: NodeId) -> Vec<(&str, &str)> {
        self.node(el)
            .inline
            .iter()
            .filter(|(p, ..)| p.starts_with("--"))
            .map(|(p, v, _)| (p.as_str(), v.as_str()))
            .collect()
    }

    /// Children of `el`.
    pub fn children(&self, el: NodeId) -> &[NodeId] {
        &self.node(el).children
    }

    /// Whether `el` is attached to the document.
    pub fn is_connected(&self, el: NodeId) -> bool {
        let root = self.document_element();
        self.ancestors_or_self(el).any(|n| n == root)
    }

    /// Number of inline style writes and removals so far.
    pub fn style_writes(&self) -> usize {
        self.style_writes
    }

    /// Currently attached listeners.
    pub fn listeners(&self) -> Listeners {
        self.listeners
    }

    /// Whether a resize observer is connected.
    pub fn resize_connected(&self) -> bool {
        self.resize_connected
    }

    /// Number of elements the resize observer watches.
    pub fn resize_observed(&self) -> usize {
        self.resize_observed.len()
    }

    /// Whether mutations are being observed.
    pub fn observing_mutations(&self) -> bool {
        self.mutation_root.is_some()
    }

    /// Outstanding animation frames.
    pub fn pending_frames(&self) -> &[FrameHandle] {
        &self.frames
    }

    /// Outstanding timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Current clock time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Takes the queued mutation records.
    pub fn take_mutations(&mut self) -> Vec<Mutation<NodeId>> {
        core::mem::take(&mut self.mutations)
    }

    /// Takes the queued events.
    pub fn take_events(&mut self) -> Vec<HostEvent> {
        core::mem::take(&mut self.events)
    }

    /// Takes every pending frame, as a browser does at the start of a frame.
    pub fn take_frames(&mut self) -> Vec<FrameHandle> {
        core::mem::take(&mut self.frames)
    }

    /// Removes and returns the earliest timer due at or before `deadline`,
    /// moving the clock to its due time.
    pub fn pop_due_timer(&mut self, deadline: Duration) -> Option<TimerHandle> {
        let (index, &(handle, due)) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, (_, due))| *due <= deadline)
            .min_by_key(|(_, (handle, due))| (*due, handle.0))?;
        self.timers.remove(index);
        self.now = self.now.max(due);
        Some(handle)
    }

    /// Moves the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    fn node(&self, el: NodeId) -> &Node {
        &self.nodes[el.index()]
    }

    fn emit(&mut self, listener: Listeners, event: HostEvent) {
        if self.listeners.contains(listener) {
            self.events.push(event);
        }
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn ancestors_or_self(&self, el: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(Some(el), |&n| self.node(n).parent)
    }

    /// Connected elements in document order.
    fn document_order(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![self.document_element()];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend(self.node(node).children.iter().rev());
        }
        order
    }

    fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.node(node).children.iter().rev());
        }
        out
    }

    fn matches(&self, el: NodeId, selector: &Selector) -> bool {
        let node = self.node(el);
        if selector.tag.as_deref().is_some_and(|tag| tag != node.tag) {
            return false;
        }
        if let Some(id) = &selector.id {
            if self.attribute(el, "id") != Some(id.as_str()) {
                return false;
            }
        }
        let classes = self.attribute(el, "class").unwrap_or("");
        if !selector
            .classes
            .iter()
            .all(|class| classes.split_ascii_whitespace().any(|c| c == class))
        {
            return false;
        }
        selector.attributes.iter().all(|(name, value)| {
            match (self.attribute(el, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
    }

    fn observed_filter(&self, el: NodeId) -> Option<MutationFilter> {
        let (root, filter) = self.mutation_root?;
        let inside = self.ancestors_or_self(el).any(|n| n == root);
        (inside && (filter.subtree || el == root)).then_some(filter)
    }

    fn record_attribute(&mut self, el: NodeId, name: &str, old_value: Option<String>) {
        let Some(filter) = self.observed_filter(el) else {
            return;
        };
        if !filter.attributes.contains(&name) {
            return;
        }
        self.mutations.push(Mutation::Attribute {
            target: el,
            name: name.to_string(),
            old_value: if filter.attribute_old_value { old_value } else { None },
        });
    }

    fn record_children(&mut self, parent: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        if self.observed_filter(parent).is_some_and(|f| f.child_list) {
            self.mutations.push(Mutation::ChildList { added, removed });
        }
    }

    fn detach(&mut self, el: NodeId) -> Option<NodeId> {
        let parent = self.nodes[el.index()].parent.take()?;
        self.nodes[parent.index()].children.retain(|&c| c != el);
        Some(parent)
    }

    fn font_size(&self, el: NodeId) -> f64 {
        parse_float_prefix(&self.computed_style(el, "font-size")).unwrap_or(16.0)
    }

    fn box_container(&self, el: NodeId) -> Option<NodeId> {
        let root = self.document_element();
        let mut parent = self.node(el).parent;
        while let Some(p) = parent {
            if p == root {
                return None;
            }
            if self.computed_style(p, "display") != "contents" {
                return Some(p);
            }
            parent = self.node(p).parent;
        }
        None
    }

    fn content_height(&self, el: Option<NodeId>) -> f64 {
        let Some(el) = el else {
            return self.client_size().height;
        };
        let edge = |p: &str| parse_float_prefix(&self.computed_style(el, p)).unwrap_or(0.0);
        self.node(el).layout.height()
            - edge("padding-top")
            - edge("padding-bottom")
            - edge("border-top-width")
            - edge("border-bottom-width")
    }

    fn units(&self, el: NodeId) -> Units {
        Units {
            root_font: self.font_size(self.document_element()),
            font: self.font_size(el),
            percent_base: self.content_height(self.box_container(el)),
        }
    }

    fn specified(&self, el: NodeId, property: &str) -> Option<String> {
        let node = self.node(el);
        node.inline
            .iter()
            .find(|(p, v, _)| p == property && !v.is_empty())
            .map(|(_, v, _)| v.clone())
            .or_else(|| {
                node.sheet
                    .iter()
                    .find(|(p, _)| p == property)
                    .map(|(_, v)| v.clone())
            })
    }

    /// Used `top` of `el` in pixels, as the layout model sees it.
    fn used_top(&self, el: NodeId) -> Option<f64> {
        let specified = self.specified(el, "top").unwrap_or_default();
        let units = self.units(el);
        match TopValue::parse(&specified)? {
            TopValue::Auto => None,
            TopValue::Percent(pct) => Some(units.percent_base * pct / 100.0),
            TopValue::Rem(rem) => Some(rem * units.root_font),
            TopValue::Em(em) => Some(em * units.font),
            TopValue::Expression(expr) => calc::eval(expr, &units),
            TopValue::Length(px) => Some(px),
        }
    }

    fn viewport_top(&self, el: NodeId) -> f64 {
        let layout = self.node(el).layout;
        let natural = layout.y0 - self.scroll_y;
        match self.computed_style(el, "position").as_str() {
            "fixed" => layout.y0,
            "sticky" => {
                let Some(top) = self.used_top(el) else {
                    return natural;
                };
                let limit = self
                    .box_container(el)
                    .map(|c| self.node(c).layout.y1 - self.scroll_y - layout.height())
                    .unwrap_or(f64::INFINITY);
                natural.max(top.min(limit))
            }
            _ => natural,
        }
    }
}

fn px(value: f64) -> String {
    if value == 0.0 {
        return "0px".into();
    }
    format!("{value}px")
}

impl Dom for Document {
    type Element = NodeId;

    fn document_element(&self) -> NodeId {
        NodeId(0)
    }

    fn body(&self) -> Option<NodeId> {
        self.body
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn location_hash(&self) -> String {
        self.location_hash.clone()
    }

    fn parent_element(&self, el: NodeId) -> Option<NodeId> {
        self.node(el).parent
    }

    fn tag_name(&self, el: NodeId) -> &str {
        &self.node(el).tag
    }

    fn attribute(&self, el: NodeId, name: &str) -> Option<&str> {
        self.node(el)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) {
        let attributes = &mut self.nodes[el.index()].attributes;
        let old = match attributes.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => Some(core::mem::replace(&mut entry.1, value.to_string())),
            None => {
                attributes.push((name.to_string(), value.to_string()));
                None
            }
        };
        self.record_attribute(el, name, old);
    }

    fn remove_attribute(&mut self, el: NodeId, name: &str) {
        let attributes = &mut self.nodes[el.index()].attributes;
        let Some(index) = attributes.iter().position(|(n, _)| n == name) else {
            return;
        };
        let (_, old) = attributes.remove(index);
        self.record_attribute(el, name, Some(old));
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.document_order()
            .into_iter()
            .find(|&n| self.attribute(n, "id") == Some(id))
    }

    fn elements_with_any_attribute(&self, names: &[&str]) -> Vec<NodeId> {
        self.document_order()
            .into_iter()
            .filter(|&n| names.iter().any(|name| self.has_attribute(n, name)))
            .collect()
    }

    fn subtree_has_any_attribute(&self, node: NodeId, names: &[&str]) -> bool {
        self.subtree(node)
            .into_iter()
            .any(|n| names.iter().any(|name| self.has_attribute(n, name)))
    }

    fn closest(&self, el: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.ancestors_or_self(el).find(|&n| self.matches(n, &selector)))
    }

    fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .document_order()
            .into_iter()
            .find(|&n| self.matches(n, &selector)))
    }

    fn computed_style(&self, el: NodeId, property: &str) -> String {
        if let Some(value) = self.specified(el, property) {
            // Positioned non-sticky elements resolve `top` expressions.
            if property == "top"
                && value.contains('(')
                && self.computed_style(el, "position") != "sticky"
            {
                return calc::eval(&value, &self.units(el)).map(px).unwrap_or(value);
            }
            return value;
        }
        match property {
            "height" => px(self.node(el).layout.height()),
            "width" => px(self.node(el).layout.width()),
            _ => DEFAULT_STYLE
                .iter()
                .find(|(p, _)| *p == property)
                .map(|(_, v)| (*v).to_string())
                .unwrap_or_default(),
        }
    }

    fn computed_top_px(&self, el: NodeId) -> Option<f64> {
        if self.typed_top { self.used_top(el) } else { None }
    }

    fn inline_style(&self, el: NodeId, property: &str) -> Option<(String, Priority)> {
        self.node(el)
            .inline
            .iter()
            .find(|(p, ..)| p == property)
            .map(|(_, v, priority)| (v.clone(), *priority))
    }

    fn set_style_property(&mut self, el: NodeId, property: &str, value: &str, priority: Priority) {
        self.style_writes += 1;
        let inline = &mut self.nodes[el.index()].inline;
        match inline.iter_mut().find(|(p, ..)| p == property) {
            Some(entry) => {
                entry.1 = value.to_string();
                entry.2 = priority;
            }
            None => inline.push((property.to_string(), value.to_string(), priority)),
        }
    }

    fn remove_style_property(&mut self, el: NodeId, property: &str) {
        self.style_writes += 1;
        self.nodes[el.index()].inline.retain(|(p, ..)| p != property);
    }

    fn bounding_client_rect(&self, el: NodeId) -> Rect {
        let layout = self.node(el).layout;
        let top = self.viewport_top(el);
        Rect::new(layout.x0, top, layout.x1, top + layout.height())
    }

    fn offset_height(&self, el: NodeId) -> f64 {
        self.node(el).layout.height()
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn inner_size(&self) -> Size {
        self.viewport
    }

    fn client_size(&self) -> Size {
        Size::new(
            self.viewport.width - self.scrollbar.width,
            self.viewport.height - self.scrollbar.height,
        )
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("Document: too many nodes for u32 NodeId"));
        self.nodes.push(Node::new(tag));
        id
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(old_parent) = self.detach(child) {
            self.record_children(old_parent, Vec::new(), vec![child]);
        }
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
        self.record_children(parent, vec![child], Vec::new());
    }

    fn remove_element(&mut self, el: NodeId) {
        if let Some(parent) = self.detach(el) {
            self.record_children(parent, Vec::new(), vec![el]);
        }
    }
}

impl Scheduler for Document {
    fn request_animation_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle());
        self.frames.push(handle);
        handle
    }

    fn cancel_animation_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|&f| f != handle);
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_handle());
        self.timers.push((handle, self.now + delay));
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|&(t, _)| t != handle);
    }
}

impl Observers for Document {
    fn connect_resize_observer(&mut self) -> bool {
        self.resize_connected = self.resize_observer_available;
        self.resize_connected
    }

    fn disconnect_resize_observer(&mut self) {
        self.resize_connected = false;
        self.resize_observed.clear();
        self.events.retain(|e| !matches!(e, HostEvent::ElementResize(_)));
    }

    fn observe_resize(&mut self, el: NodeId) {
        if self.resize_connected {
            self.resize_observed.insert(el);
        }
    }

    fn unobserve_resize(&mut self, el: NodeId) {
        self.resize_observed.remove(&el);
    }

    fn observe_mutations(&mut self, root: NodeId, filter: &MutationFilter) {
        self.mutation_root = Some((root, *filter));
    }

    fn disconnect_mutations(&mut self) {
        self.mutation_root = None;
        self.mutations.clear();
    }

    fn add_listeners(&mut self, listeners: Listeners) {
        self.listeners |= listeners;
    }

    fn remove_listeners(&mut self, listeners: Listeners) {
        self.listeners.remove(listeners);
    }

    fn supports_scroll_end(&self) -> bool {
        self.supports_scroll_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_clamps_between_natural_and_container() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let section = doc.append(body, "section");
        doc.set_box(section, Rect::new(0.0, 100.0, 800.0, 600.0));
        let nav = doc.append(section, "nav");
        doc.set_box(nav, Rect::new(0.0, 200.0, 800.0, 250.0));
        doc.set_sheet_style(nav, "position", "sticky");
        doc.set_sheet_style(nav, "top", "10px");

        assert_eq!(doc.bounding_client_rect(nav).y0, 200.0);
        doc.scroll_y = 300.0;
        assert_eq!(doc.bounding_client_rect(nav).y0, 10.0);
        // Container bottom at 600 - 560 = 40 viewport; limit is 40 - 50 = -10.
        doc.scroll_y = 560.0;
        assert_eq!(doc.bounding_client_rect(nav).y0, -10.0);
    }

    #[test]
    fn forced_static_reads_natural_position() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let nav = doc.append(body, "nav");
        doc.set_box(nav, Rect::new(0.0, 200.0, 800.0, 250.0));
        doc.set_sheet_style(nav, "position", "sticky");
        doc.set_sheet_style(nav, "top", "0");
        doc.scroll_y = 500.0;
        assert_eq!(doc.bounding_client_rect(nav).y0, 0.0);
        doc.set_style_property(nav, "position", "static", Priority::Important);
        assert_eq!(doc.bounding_client_rect(nav).y0, -300.0);
    }

    #[test]
    fn attribute_mutations_follow_the_filter() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let el = doc.append(body, "div");
        doc.observe_mutations(body, &keeptrack::MUTATION_FILTER);
        doc.set_attribute(el, "class", "x");
        assert!(doc.take_mutations().is_empty());
        doc.set_attribute(el, "id", "a");
        doc.set_attribute(el, "id", "b");
        assert_eq!(
            doc.take_mutations(),
            vec![
                Mutation::Attribute {
                    target: el,
                    name: "id".into(),
                    old_value: None,
                },
                Mutation::Attribute {
                    target: el,
                    name: "id".into(),
                    old_value: Some("a".into()),
                },
            ]
        );
    }

    #[test]
    fn selectors_match_ancestors_then_document() {
        let mut doc = Document::new();
        let body = doc.body().unwrap();
        let card = doc.append(body, "div");
        doc.set_attribute(card, "class", "card wide");
        let child = doc.append(card, "span");
        assert_eq!(doc.closest(child, ".card"), Ok(Some(card)));
        assert_eq!(doc.closest(child, "div.wide"), Ok(Some(card)));
        assert_eq!(doc.query_selector("span"), Ok(Some(child)));
        assert!(doc.closest(child, "div > span").is_err());
    }

    #[test]
    fn timers_fire_in_due_order() {
        let mut doc = Document::new();
        let late = doc.set_timeout(Duration::from_millis(20));
        let early = doc.set_timeout(Duration::from_millis(10));
        assert_eq!(doc.pop_due_timer(Duration::from_millis(5)), None);
        assert_eq!(doc.pop_due_timer(Duration::from_millis(50)), Some(early));
        assert_eq!(doc.now(), Duration::from_millis(10));
        assert_eq!(doc.pop_due_timer(Duration::from_millis(50)), Some(late));
        assert_eq!(doc.pending_timers(), 0);
    }
}
