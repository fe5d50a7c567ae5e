// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The prediction lock.
//!
//! After a predicted `scroll-padding-top` is published the browser starts its
//! own scroll to the anchor. Until that scroll ends the reactive pass must not
//! overwrite the prediction. The lock ends on the first of:
//!
//! - a `scrollend` event, when the platform has one;
//! - two animation frames with no scroll movement;
//! - [`FALLBACK_TIMEOUT`].

use core::time::Duration;

use crate::host::{FrameHandle, Host, Listeners, TimerHandle};
use crate::schedule::cancel_frame;

/// Upper bound on how long a prediction suppresses the reactive pass.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_millis(5000);

/// Why a prediction lock ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnlockReason {
    /// The platform reported the end of scrolling.
    ScrollEnd,
    /// Two frames passed without scroll movement.
    Still,
    /// The fallback timer fired.
    Timeout,
}

/// What a lock made of a reported event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LockEvent {
    /// The event does not belong to the lock.
    Ignored,
    /// The event was consumed; the lock holds.
    Held,
    /// The lock should be released.
    Release(UnlockReason),
}

/// Bookkeeping of an in-flight prediction.
#[derive(Clone, Debug, PartialEq)]
pub struct Pending {
    start_scroll_y: f64,
    frame: Option<FrameHandle>,
    frames_seen: u8,
    fallback: Option<TimerHandle>,
    scroll_end_armed: bool,
}

/// `Idle` / `Predicting` state machine.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PredictionLock {
    /// The reactive pass may publish.
    #[default]
    Idle,
    /// A prediction is in flight.
    Predicting(Pending),
}

impl PredictionLock {
    /// Whether a prediction is in flight.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Predicting(_))
    }

    /// Enters `Predicting`, restarting every trigger.
    pub fn lock<H: Host + ?Sized>(&mut self, host: &mut H) {
        self.release(host);
        let scroll_end_armed = host.supports_scroll_end();
        if scroll_end_armed {
            host.add_listeners(Listeners::SCROLL_END);
        }
        let start_scroll_y = host.scroll_y();
        let frame = Some(host.request_animation_frame());
        let fallback = Some(host.set_timeout(FALLBACK_TIMEOUT));
        *self = Self::Predicting(Pending {
            start_scroll_y,
            frame,
            frames_seen: 0,
            fallback,
            scroll_end_armed,
        });
    }

    /// Handles an animation frame.
    ///
    /// The first stillness frame requests the second; the second compares the
    /// scroll offset with the one recorded at lock time. Movement leaves the
    /// lock to `scrollend` or the fallback timer.
    pub fn on_frame<H: Host + ?Sized>(&mut self, host: &mut H, handle: FrameHandle) -> LockEvent {
        let Self::Predicting(pending) = self else {
            return LockEvent::Ignored;
        };
        if pending.frame != Some(handle) {
            return LockEvent::Ignored;
        }
        pending.frames_seen += 1;
        if pending.frames_seen < 2 {
            pending.frame = Some(host.request_animation_frame());
            return LockEvent::Held;
        }
        pending.frame = None;
        if host.scroll_y() == pending.start_scroll_y {
            LockEvent::Release(UnlockReason::Still)
        } else {
            LockEvent::Held
        }
    }

    /// Handles a fired timer.
    pub fn on_timer(&self, handle: TimerHandle) -> LockEvent {
        match self {
            Self::Predicting(pending) if pending.fallback == Some(handle) => {
                LockEvent::Release(UnlockReason::Timeout)
            }
            _ => LockEvent::Ignored,
        }
    }

    /// Handles a `scrollend` event.
    pub fn on_scroll_end(&self) -> LockEvent {
        match self {
            Self::Predicting(pending) if pending.scroll_end_armed => {
                LockEvent::Release(UnlockReason::ScrollEnd)
            }
            _ => LockEvent::Ignored,
        }
    }

    /// Returns to `Idle`, cancelling whatever is outstanding.
    ///
    /// Returns `false` when already idle, in which case nothing happens.
    pub fn release<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        let Self::Predicting(mut pending) = core::mem::take(self) else {
            return false;
        };
        cancel_frame(host, &mut pending.frame);
        if let Some(timer) = pending.fallback.take() {
            host.clear_timeout(timer);
        }
        if pending.scroll_end_armed {
            host.remove_listeners(Listeners::SCROLL_END);
        }
        true
    }
}
