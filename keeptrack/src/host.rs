// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host capabilities consumed by the engine.
//!
//! The engine never talks to a browser directly. Instead, a host implements
//! three small traits:
//!
//! - [`Dom`]: tree navigation, attributes, computed and inline styles, and
//!   geometry reads.
//! - [`Scheduler`]: animation frames and timers, identified by opaque handles.
//! - [`Observers`]: resize and mutation observation plus event listeners.
//!
//! Anything implementing all three is a [`Host`]. The host owns the event loop
//! and reports what happened back through the entry points on
//! [`KeepTrack`](crate::KeepTrack).

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use core::time::Duration;

use kurbo::{Rect, Size};

use crate::error::SelectorError;

/// Inline style priority.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// No priority flag.
    #[default]
    Normal,
    /// `!important`.
    Important,
}

/// Document loading state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReadyState {
    /// The document is still being parsed.
    Loading,
    /// Parsing finished; subresources may still be loading.
    Interactive,
    /// Fully loaded.
    Complete,
}

/// Handle for a requested animation frame, chosen by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Handle for a pending timer, chosen by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

bitflags::bitflags! {
    /// Event listeners the engine attaches to the window or document.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Listeners: u8 {
        /// Viewport `resize`.
        const RESIZE             = 0b0000_0001;
        /// Window `scroll`.
        const SCROLL             = 0b0000_0010;
        /// Window `scrollend`, attached one-shot during a prediction.
        const SCROLL_END         = 0b0000_0100;
        /// Document `click`.
        const CLICK              = 0b0000_1000;
        /// Window `hashchange`.
        const HASH_CHANGE        = 0b0001_0000;
        /// Window `popstate`.
        const POP_STATE          = 0b0010_0000;
        /// Document `DOMContentLoaded`, attached one-shot while `init` is deferred.
        const DOM_CONTENT_LOADED = 0b0100_0000;
    }
}

bitflags::bitflags! {
    /// Modifier keys held during a click.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Meta / command.
        const META  = 0b0001;
        /// Control.
        const CTRL  = 0b0010;
        /// Shift.
        const SHIFT = 0b0100;
        /// Alt / option.
        const ALT   = 0b1000;
    }
}

/// Options for subtree mutation observation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MutationFilter {
    /// Report added and removed children.
    pub child_list: bool,
    /// Observe the whole subtree, not just the root.
    pub subtree: bool,
    /// Report the previous value of changed attributes.
    pub attribute_old_value: bool,
    /// Only report changes to these attributes.
    pub attributes: &'static [&'static str],
}

/// One record from a mutation observer batch.
///
/// Hosts only report element nodes; text and comment nodes are filtered out
/// before the batch reaches the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation<E> {
    /// An attribute changed on `target`.
    Attribute {
        /// The element whose attribute changed.
        target: E,
        /// The attribute name.
        name: String,
        /// The value before the change, `None` if it was absent.
        old_value: Option<String>,
    },
    /// Children were added to or removed from some parent.
    ChildList {
        /// Elements inserted by this mutation.
        added: Vec<E>,
        /// Elements removed by this mutation. They may already be detached.
        removed: Vec<E>,
    },
}

/// A click delivered to the document.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Click<E> {
    /// The element clicked, or the parent element of a clicked text node.
    pub target: Option<E>,
    /// Pointer button; `0` is the primary button.
    pub button: i16,
    /// Whether an earlier handler already called `preventDefault`.
    pub default_prevented: bool,
    /// Modifier keys held during the click.
    pub modifiers: Modifiers,
}

impl<E> Click<E> {
    /// A plain primary-button click on `target`.
    pub fn primary(target: E) -> Self {
        Self {
            target: Some(target),
            button: 0,
            default_prevented: false,
            modifiers: Modifiers::empty(),
        }
    }
}

/// Document access: tree, attributes, styles, and geometry.
///
/// Geometry follows the web platform: bounding rects are viewport-relative,
/// and document-relative positions are obtained by adding [`Dom::scroll_y`].
pub trait Dom {
    /// Element handle. Compared by identity.
    type Element: Copy + Eq + Hash + Debug;

    /// The document root (`<html>`).
    fn document_element(&self) -> Self::Element;

    /// The `<body>` element, if parsing has reached it.
    fn body(&self) -> Option<Self::Element>;

    /// Current loading state.
    fn ready_state(&self) -> ReadyState;

    /// The location fragment including the leading `#`, or empty.
    fn location_hash(&self) -> String;

    /// Parent element, `None` at the root or for detached elements.
    fn parent_element(&self, el: Self::Element) -> Option<Self::Element>;

    /// Lowercase local name, e.g. `"a"`.
    fn tag_name(&self, el: Self::Element) -> &str;

    /// Attribute value, `None` if absent.
    fn attribute(&self, el: Self::Element, name: &str) -> Option<&str>;

    /// Whether the attribute is present.
    fn has_attribute(&self, el: Self::Element, name: &str) -> bool {
        self.attribute(el, name).is_some()
    }

    /// Sets an attribute.
    fn set_attribute(&mut self, el: Self::Element, name: &str, value: &str);

    /// Removes an attribute; removing an absent attribute is a no-op.
    fn remove_attribute(&mut self, el: Self::Element, name: &str);

    /// `document.getElementById`.
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;

    /// Every connected element carrying at least one of `names`, in document order.
    fn elements_with_any_attribute(&self, names: &[&str]) -> Vec<Self::Element>;

    /// Whether `node` or any of its descendants carries one of `names`.
    ///
    /// Must also work for nodes that were just detached.
    fn subtree_has_any_attribute(&self, node: Self::Element, names: &[&str]) -> bool;

    /// `Element.closest(selector)`.
    fn closest(
        &self,
        el: Self::Element,
        selector: &str,
    ) -> Result<Option<Self::Element>, SelectorError>;

    /// `document.querySelector(selector)`.
    fn query_selector(&self, selector: &str) -> Result<Option<Self::Element>, SelectorError>;

    /// Computed value of a CSS property, empty if unknown.
    fn computed_style(&self, el: Self::Element, property: &str) -> String;

    /// Computed `top` converted to pixels by a typed style API, if available.
    fn computed_top_px(&self, _el: Self::Element) -> Option<f64> {
        None
    }

    /// Inline style declaration, `None` if not set.
    fn inline_style(&self, el: Self::Element, property: &str) -> Option<(String, Priority)>;

    /// Sets an inline style declaration (custom properties included).
    fn set_style_property(
        &mut self,
        el: Self::Element,
        property: &str,
        value: &str,
        priority: Priority,
    );

    /// Removes an inline style declaration.
    fn remove_style_property(&mut self, el: Self::Element, property: &str);

    /// Viewport-relative border box.
    fn bounding_client_rect(&self, el: Self::Element) -> Rect;

    /// `HTMLElement.offsetHeight`.
    fn offset_height(&self, el: Self::Element) -> f64;

    /// Vertical scroll offset of the viewport.
    fn scroll_y(&self) -> f64;

    /// `window.innerWidth` / `window.innerHeight`.
    fn inner_size(&self) -> Size;

    /// `clientWidth` / `clientHeight` of the document root.
    fn client_size(&self) -> Size;

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> Self::Element;

    /// Appends `child` as the last child of `parent`.
    fn append_child(&mut self, parent: Self::Element, child: Self::Element);

    /// Detaches `el` from its parent.
    fn remove_element(&mut self, el: Self::Element);
}

/// Animation frame and timer scheduling.
///
/// Requested work never runs re-entrantly: the host reports it later through
/// [`KeepTrack::on_animation_frame`](crate::KeepTrack::on_animation_frame) and
/// [`KeepTrack::on_timer`](crate::KeepTrack::on_timer).
pub trait Scheduler {
    /// Requests a callback on the next animation frame.
    fn request_animation_frame(&mut self) -> FrameHandle;

    /// Cancels a pending frame; unknown handles are ignored.
    fn cancel_animation_frame(&mut self, handle: FrameHandle);

    /// Starts a one-shot timer.
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle;

    /// Cancels a pending timer; unknown handles are ignored.
    fn clear_timeout(&mut self, handle: TimerHandle);
}

/// Observation and event subscription.
pub trait Observers: Dom {
    /// Creates the element resize observer. Returns `false` when unavailable.
    fn connect_resize_observer(&mut self) -> bool;

    /// Drops the resize observer and all its observations.
    fn disconnect_resize_observer(&mut self);

    /// Starts reporting size changes of `el`.
    fn observe_resize(&mut self, el: Self::Element);

    /// Stops reporting size changes of `el`.
    fn unobserve_resize(&mut self, el: Self::Element);

    /// Starts observing mutations under `root`.
    fn observe_mutations(&mut self, root: Self::Element, filter: &MutationFilter);

    /// Stops mutation observation.
    fn disconnect_mutations(&mut self);

    /// Attaches listeners.
    fn add_listeners(&mut self, listeners: Listeners);

    /// Detaches listeners; detaching a listener that is not attached is a no-op.
    fn remove_listeners(&mut self, listeners: Listeners);

    /// Whether the platform fires `scrollend`.
    fn supports_scroll_end(&self) -> bool;
}

/// Everything the engine needs from its environment.
pub trait Host: Dom + Scheduler + Observers {}

impl<T: Dom + Scheduler + Observers> Host for T {}
