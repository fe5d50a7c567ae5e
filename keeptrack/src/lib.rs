// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! KeepTrack: computed layout values as CSS custom properties.
//!
//! Authors annotate elements with a small attribute protocol and the engine
//! keeps custom properties in sync with the live computed styles, so
//! stylesheets can react to values CSS cannot otherwise see.
//!
//! ## Attribute protocol
//!
//! - `data-keeptrack="height, width"`: mirror these computed properties.
//! - `data-keeptrack-id="name"`: name prefix; falls back to `id`. Prefixed
//!   variables are `--name-height` and live on the document root, unprefixed
//!   ones are `--height` on the element itself.
//! - `data-keeptrack-target-parent="2"` or `=".card"`: write the variables on
//!   an ancestor (hop count) or a selected element instead.
//! - `data-keeptrack-scroll-padding`: the element contributes its height to
//!   the root's `scroll-padding-top`.
//! - `data-keeptrack-stuck`: set by the engine while a sticky element is stuck
//!   (with sticky detection enabled), alongside a `--stuck` / `--name-stuck`
//!   variable holding `"0"` or `"1"`.
//!
//! The engine also publishes `--scrollbar-width` and `--scrollbar-height` on
//! the document root.
//!
//! ## Scroll padding
//!
//! The reactive pass publishes the summed heights of participants currently
//! covering the viewport top. When an in-page anchor is followed, a predictive
//! pass works out which sticky participants will be stuck once the browser
//! has scrolled, publishes that instead, and holds it until the scroll ends.
//! See [`scroll_padding`].
//!
//! ## Hosts
//!
//! The engine is platform-agnostic. A [`Host`] provides document access,
//! scheduling, and observation, and reports events back through the `on_*`
//! entry points on [`KeepTrack`]:
//!
//! ```ignore
//! let mut keeptrack = KeepTrack::new();
//! keeptrack.init(&mut host, Settings::default().with_detect_sticky(true));
//! // Later, from the host's event loop:
//! keeptrack.on_viewport_resize(&mut host);
//! keeptrack.on_timer(&mut host, timer);
//! keeptrack.on_animation_frame(&mut host, frame);
//! ```
//!
//! The `keeptrack_ref` crate in this workspace is an in-memory host used for
//! testing.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. Logging goes through `tracing`
//! macros; no subscriber is installed.
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo`, `tracing` and `thiserror`.
//! - `libm`: forwards to `kurbo` for `no_std` float math.

#![no_std]

extern crate alloc;

pub mod attr;
mod cache;
mod config;
mod error;
pub mod geometry;
mod host;
mod lock;
mod registry;
mod schedule;
pub mod scroll_padding;
mod scrollbars;
mod settings;
mod sticky;
mod sync;
mod tracker;

pub use cache::ChangeCache;
pub use config::{
    Config, ConfigResolver, Placement, PropertyList, TargetSpec, name_prefix, parse_properties,
    read_config, resolve_target, variable_name,
};
pub use error::SelectorError;
pub use host::{
    Click, Dom, FrameHandle, Host, Listeners, Modifiers, Mutation, MutationFilter, Observers,
    Priority, ReadyState, Scheduler, TimerHandle,
};
pub use lock::{FALLBACK_TIMEOUT, LockEvent, Pending, PredictionLock, UnlockReason};
pub use registry::{Reconciled, Registry};
pub use schedule::Debounce;
pub use scrollbars::{SCROLLBAR_HEIGHT, SCROLLBAR_WIDTH, Scrollbars};
pub use settings::{OnChange, Settings};
pub use sticky::{STUCK_TOLERANCE, StickyTracker, cleanup_sticky_state, is_stuck_at};
pub use sync::ElementSync;
pub use tracker::{KeepTrack, MUTATION_FILTER};
