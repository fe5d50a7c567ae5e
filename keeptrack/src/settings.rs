// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance options.

use alloc::boxed::Box;
use core::fmt;
use core::time::Duration;

/// Change notification: `(element, property, new value)`.
///
/// Fired once per mirrored property whose value actually changed, and with
/// property `"stuck"` on sticky transitions.
pub type OnChange<E> = Box<dyn FnMut(E, &str, &str)>;

/// Options snapshot taken by [`KeepTrack::init`](crate::KeepTrack::init).
///
/// Settings are replaced wholesale on every `init`; there is no way to patch a
/// running instance.
///
/// ```
/// use core::time::Duration;
/// use keeptrack::Settings;
///
/// let settings = Settings::<u32>::default()
///     .with_scrollbar_height(true)
///     .with_detect_sticky(true)
///     .with_debounce(Duration::from_millis(100));
/// assert!(settings.scrollbar_width);
/// assert!(!settings.poll);
/// ```
pub struct Settings<E> {
    /// Publish `--scrollbar-width` on the root.
    pub scrollbar_width: bool,
    /// Publish `--scrollbar-height` on the root.
    pub scrollbar_height: bool,
    /// Delay before batched work after viewport resizes and mutations.
    pub debounce: Duration,
    /// Re-read every tracked element on every animation frame.
    pub poll: bool,
    /// Track which sticky elements are stuck.
    pub detect_sticky: bool,
    /// Re-resolve sticky offsets on every check instead of caching them.
    pub sticky_top_dynamic: bool,
    /// Optional change callback.
    pub on_change: Option<OnChange<E>>,
}

impl<E> Default for Settings<E> {
    fn default() -> Self {
        Self {
            scrollbar_width: true,
            scrollbar_height: false,
            debounce: Duration::from_millis(250),
            poll: false,
            detect_sticky: false,
            sticky_top_dynamic: false,
            on_change: None,
        }
    }
}

impl<E> fmt::Debug for Settings<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("scrollbar_width", &self.scrollbar_width)
            .field("scrollbar_height", &self.scrollbar_height)
            .field("debounce", &self.debounce)
            .field("poll", &self.poll)
            .field("detect_sticky", &self.detect_sticky)
            .field("sticky_top_dynamic", &self.sticky_top_dynamic)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

impl<E> Settings<E> {
    /// Sets [`Settings::scrollbar_width`].
    #[must_use]
    pub fn with_scrollbar_width(mut self, enabled: bool) -> Self {
        self.scrollbar_width = enabled;
        self
    }

    /// Sets [`Settings::scrollbar_height`].
    #[must_use]
    pub fn with_scrollbar_height(mut self, enabled: bool) -> Self {
        self.scrollbar_height = enabled;
        self
    }

    /// Sets [`Settings::debounce`].
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Sets [`Settings::poll`].
    #[must_use]
    pub fn with_poll(mut self, enabled: bool) -> Self {
        self.poll = enabled;
        self
    }

    /// Sets [`Settings::detect_sticky`].
    #[must_use]
    pub fn with_detect_sticky(mut self, enabled: bool) -> Self {
        self.detect_sticky = enabled;
        self
    }

    /// Sets [`Settings::sticky_top_dynamic`].
    #[must_use]
    pub fn with_sticky_top_dynamic(mut self, enabled: bool) -> Self {
        self.sticky_top_dynamic = enabled;
        self
    }

    /// Sets the change callback.
    #[must_use]
    pub fn with_on_change(mut self, on_change: impl FnMut(E, &str, &str) + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }
}

/// Invokes the callback, if any.
pub(crate) fn notify<E>(on_change: &mut Option<OnChange<E>>, el: E, property: &str, value: &str) {
    if let Some(on_change) = on_change.as_mut() {
        on_change(el, property, value);
    }
}
