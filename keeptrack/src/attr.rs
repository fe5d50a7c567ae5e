// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The declarative attribute protocol.

/// Comma-separated list of CSS properties to mirror into custom properties.
pub const TRACK: &str = "data-keeptrack";

/// Overrides the name prefix otherwise taken from `id`.
pub const ID: &str = "data-keeptrack-id";

/// Explicit placement target: an ancestor hop count or a CSS selector.
pub const TARGET_PARENT: &str = "data-keeptrack-target-parent";

/// Marks an element as a `scroll-padding-top` participant.
pub const SCROLL_PADDING: &str = "data-keeptrack-scroll-padding";

/// Managed by the engine: present while a sticky element is stuck.
pub const STUCK: &str = "data-keeptrack-stuck";

/// The element's own `id` attribute.
pub const ELEMENT_ID: &str = "id";

/// Attributes whose presence makes an element part of the registry.
pub const TRACKING: &[&str] = &[TRACK, SCROLL_PADDING];

/// Attributes the mutation observer reports changes for.
pub const WATCHED: &[&str] = &[TRACK, TARGET_PARENT, SCROLL_PADDING, ID, ELEMENT_ID];
