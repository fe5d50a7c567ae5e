// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative scheduling helpers built on [`Scheduler`] handles.

use core::time::Duration;

use crate::host::{FrameHandle, Scheduler, TimerHandle};

/// Debounce-then-frame trigger.
///
/// Every [`Debounce::trigger`] restarts the timer. When the timer expires an
/// animation frame is requested, and the owner runs its batched work when that
/// frame is reported through [`Debounce::on_frame`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Debounce {
    timer: Option<TimerHandle>,
    frame: Option<FrameHandle>,
}

impl Debounce {
    /// Creates an idle debouncer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a timer or frame is outstanding.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some() || self.frame.is_some()
    }

    /// Restarts the timer.
    pub fn trigger<S: Scheduler + ?Sized>(&mut self, host: &mut S, delay: Duration) {
        if let Some(timer) = self.timer.take() {
            host.clear_timeout(timer);
        }
        self.timer = Some(host.set_timeout(delay));
    }

    /// Handles a fired timer. Returns `true` if it was ours.
    ///
    /// A frame requested by an earlier expiry is reused rather than doubled.
    pub fn on_timer<S: Scheduler + ?Sized>(&mut self, host: &mut S, handle: TimerHandle) -> bool {
        if self.timer != Some(handle) {
            return false;
        }
        self.timer = None;
        if self.frame.is_none() {
            self.frame = Some(host.request_animation_frame());
        }
        true
    }

    /// Handles a fired frame. Returns `true` if the batched work should run now.
    pub fn on_frame(&mut self, handle: FrameHandle) -> bool {
        take_frame(&mut self.frame, handle)
    }

    /// Cancels whatever is outstanding.
    pub fn cancel<S: Scheduler + ?Sized>(&mut self, host: &mut S) {
        if let Some(timer) = self.timer.take() {
            host.clear_timeout(timer);
        }
        cancel_frame(host, &mut self.frame);
    }
}

/// Clears `slot` if it holds `handle`. Returns whether it did.
pub(crate) fn take_frame(slot: &mut Option<FrameHandle>, handle: FrameHandle) -> bool {
    if *slot == Some(handle) {
        *slot = None;
        true
    } else {
        false
    }
}

/// Cancels the frame in `slot`, if any.
pub(crate) fn cancel_frame<S: Scheduler + ?Sized>(host: &mut S, slot: &mut Option<FrameHandle>) {
    if let Some(frame) = slot.take() {
        host.cancel_animation_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Clock {
        next: u64,
        timers: Vec<TimerHandle>,
        frames: Vec<FrameHandle>,
    }

    impl Scheduler for Clock {
        fn request_animation_frame(&mut self) -> FrameHandle {
            self.next += 1;
            self.frames.push(FrameHandle(self.next));
            FrameHandle(self.next)
        }

        fn cancel_animation_frame(&mut self, handle: FrameHandle) {
            self.frames.retain(|f| *f != handle);
        }

        fn set_timeout(&mut self, _delay: Duration) -> TimerHandle {
            self.next += 1;
            self.timers.push(TimerHandle(self.next));
            TimerHandle(self.next)
        }

        fn clear_timeout(&mut self, handle: TimerHandle) {
            self.timers.retain(|t| *t != handle);
        }
    }

    impl Clock {
        /// Takes the oldest pending timer, as a host does when it fires.
        fn fire(&mut self) -> TimerHandle {
            self.timers.remove(0)
        }
    }

    #[test]
    fn retrigger_restarts_the_timer() {
        let mut clock = Clock::default();
        let mut debounce = Debounce::new();
        debounce.trigger(&mut clock, Duration::from_millis(10));
        let first = clock.timers[0];
        debounce.trigger(&mut clock, Duration::from_millis(10));
        assert_eq!(clock.timers.len(), 1);
        assert!(!debounce.on_timer(&mut clock, first), "stale timer must be ignored");
    }

    #[test]
    fn timer_then_frame_runs_once() {
        let mut clock = Clock::default();
        let mut debounce = Debounce::new();
        debounce.trigger(&mut clock, Duration::from_millis(10));
        let timer = clock.fire();
        assert!(debounce.on_timer(&mut clock, timer));
        let frame = clock.frames[0];
        assert!(debounce.on_frame(frame));
        assert!(!debounce.on_frame(frame));
        assert!(!debounce.is_pending());
    }

    #[test]
    fn cancel_clears_everything() {
        let mut clock = Clock::default();
        let mut debounce = Debounce::new();
        debounce.trigger(&mut clock, Duration::from_millis(10));
        let timer = clock.fire();
        assert!(debounce.on_timer(&mut clock, timer));
        debounce.trigger(&mut clock, Duration::from_millis(10));
        assert_eq!(clock.timers.len(), 1);
        debounce.cancel(&mut clock);
        assert!(clock.timers.is_empty());
        assert!(clock.frames.is_empty());
        assert!(!debounce.is_pending());
    }
}
