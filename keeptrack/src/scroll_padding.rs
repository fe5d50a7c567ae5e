// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `scroll-padding-top` from sticky and fixed headers.
//!
//! Two passes share one published value on the document root:
//!
//! - the reactive pass sums the heights of participants that currently cover
//!   the top of the viewport;
//! - the predictive pass guesses which participants will cover it once the
//!   browser has scrolled to an anchor, solving a small fixed point because
//!   the scroll target itself depends on the padding.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::attr;
use crate::geometry::{container_doc_top, measure_unstuck_doc_top, sticky_container};
use crate::host::{Dom, Priority};
use crate::sticky::{StickyTracker, is_sticky};

/// The published property.
pub const SCROLL_PADDING_TOP: &str = "scroll-padding-top";

/// Iteration cap of [`predict`].
pub const MAX_ITERATIONS: usize = 5;

/// One participant of a prediction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Candidate {
    /// Non-sticky: always contributes.
    Fixed {
        /// Border-box height.
        height: f64,
    },
    /// Sticky: contributes only while the scroll offset is within range.
    Sticky {
        /// Border-box height.
        height: f64,
        /// First scroll offset at which the element is stuck.
        min_scroll: f64,
        /// Last scroll offset before the container pushes it away.
        max_scroll: f64,
    },
}

impl Candidate {
    /// A sticky candidate from its offset, unstuck document top and container
    /// bottom.
    pub fn sticky(height: f64, offset: f64, unstuck_doc_top: f64, container_bottom: f64) -> Self {
        Self::Sticky {
            height,
            min_scroll: unstuck_doc_top - offset,
            max_scroll: container_bottom - height - offset,
        }
    }

    /// Border-box height.
    pub fn height(&self) -> f64 {
        match *self {
            Self::Fixed { height } | Self::Sticky { height, .. } => height,
        }
    }

    /// Whether this candidate covers the viewport top at `scroll_top`.
    pub fn contributes_at(&self, scroll_top: f64) -> bool {
        match *self {
            Self::Fixed { .. } => true,
            Self::Sticky {
                min_scroll,
                max_scroll,
                ..
            } => scroll_top >= min_scroll && scroll_top <= max_scroll,
        }
    }
}

/// Result of [`predict`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Prediction {
    /// Padding after the last iteration.
    pub padding: f64,
    /// Whether any candidate contributed in the last iteration.
    pub any: bool,
    /// Iterations run.
    pub iterations: usize,
    /// Whether the last iteration reproduced its input.
    pub converged: bool,
}

impl Prediction {
    /// The value to publish, `None` when the property should be removed.
    pub fn value(&self) -> Option<f64> {
        self.any.then_some(self.padding)
    }
}

/// Solves `padding = Σ height(c) for c contributing at target − padding`.
///
/// Starts from zero and stops as soon as an iteration reproduces its input,
/// or after [`MAX_ITERATIONS`], keeping the last value.
///
/// ```
/// use keeptrack::scroll_padding::{Candidate, predict};
///
/// let header = Candidate::Fixed { height: 40.0 };
/// let nav = Candidate::sticky(30.0, 0.0, 100.0, 5000.0);
/// let prediction = predict(1000.0, &[header, nav]);
/// assert_eq!(prediction.value(), Some(70.0));
/// assert!(prediction.converged);
/// ```
pub fn predict(target_doc_top: f64, candidates: &[Candidate]) -> Prediction {
    let mut padding = 0.0;
    let mut any = false;
    for iteration in 1..=MAX_ITERATIONS {
        let scroll_top = target_doc_top - padding;
        let mut next = 0.0;
        let mut next_any = false;
        for candidate in candidates.iter().filter(|c| c.contributes_at(scroll_top)) {
            next += candidate.height();
            next_any = true;
        }
        let converged = next == padding;
        padding = next;
        any = next_any;
        if converged {
            return Prediction {
                padding,
                any,
                iterations: iteration,
                converged: true,
            };
        }
    }
    Prediction {
        padding,
        any,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

/// Formats a pixel length the way style values are published.
pub fn format_px(value: f64) -> String {
    if value == 0.0 {
        // Also covers -0.
        return "0px".into();
    }
    format!("{value}px")
}

/// Builds prediction candidates from the scroll-padding participants in
/// `elements`.
///
/// Sticky participants with an unresolved offset are left out.
pub fn collect_candidates<H: Dom>(
    host: &mut H,
    sticky: &mut StickyTracker<H::Element>,
    elements: &[H::Element],
    dynamic: bool,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for &el in elements {
        if !host.has_attribute(el, attr::SCROLL_PADDING) {
            continue;
        }
        let height = host.bounding_client_rect(el).height();
        if !is_sticky(host, el) {
            candidates.push(Candidate::Fixed { height });
            continue;
        }
        let Some(offset) = sticky.offset(host, el, dynamic) else {
            continue;
        };
        let unstuck_doc_top = measure_unstuck_doc_top(host, el);
        let container = sticky_container(host, el);
        let container_bottom = container_doc_top(host, container) + host.offset_height(container);
        candidates.push(Candidate::sticky(height, offset, unstuck_doc_top, container_bottom));
    }
    candidates
}

/// Sum of participant heights covering the viewport top right now.
///
/// With `detect_sticky`, sticky participants count only while marked stuck.
/// Returns `None` when nothing qualifies.
pub fn reactive_padding<H: Dom>(host: &H, elements: &[H::Element], detect_sticky: bool) -> Option<f64> {
    let mut total = 0.0;
    let mut any = false;
    for &el in elements {
        if !host.has_attribute(el, attr::SCROLL_PADDING) {
            continue;
        }
        if detect_sticky && is_sticky(host, el) && !host.has_attribute(el, attr::STUCK) {
            continue;
        }
        total += host.bounding_client_rect(el).height();
        any = true;
    }
    any.then_some(total)
}

/// Memoised writer of `scroll-padding-top`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Publisher {
    last: Option<String>,
}

impl Publisher {
    /// Creates a publisher that has published nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last published value.
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Publishes `px`. Unless `always`, a value equal to the last one is not
    /// rewritten.
    pub fn set<H: Dom>(&mut self, host: &mut H, px: f64, always: bool) {
        let value = format_px(px);
        if !always && self.last.as_deref() == Some(value.as_str()) {
            return;
        }
        let root = host.document_element();
        host.set_style_property(root, SCROLL_PADDING_TOP, &value, Priority::Normal);
        self.last = Some(value);
    }

    /// Removes the property if something was published.
    pub fn clear<H: Dom>(&mut self, host: &mut H) {
        if self.last.take().is_some() {
            let root = host.document_element();
            host.remove_style_property(root, SCROLL_PADDING_TOP);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_plus_bracketing_sticky_converges() {
        let candidates = [
            Candidate::Fixed { height: 40.0 },
            Candidate::Sticky {
                height: 30.0,
                min_scroll: 500.0,
                max_scroll: 2000.0,
            },
        ];
        let prediction = predict(1000.0, &candidates);
        assert_eq!(prediction.value(), Some(70.0));
        assert!(prediction.converged);
        assert_eq!(prediction.iterations, 2);
    }

    #[test]
    fn no_candidates_means_no_value() {
        let prediction = predict(1000.0, &[]);
        assert_eq!(prediction.value(), None);
        assert!(prediction.converged);
        assert_eq!(prediction.iterations, 1);
    }

    #[test]
    fn sticky_out_of_range_does_not_count() {
        let candidates = [Candidate::sticky(30.0, 0.0, 2000.0, 5000.0)];
        assert_eq!(predict(1000.0, &candidates).value(), None);
    }

    // The padding moves the scroll target out of the sticky range and back:
    // the solver stops at the cap and keeps the last value.
    #[test]
    fn oscillation_stops_at_the_cap() {
        let candidates = [Candidate::Sticky {
            height: 30.0,
            min_scroll: 990.0,
            max_scroll: 1000.0,
        }];
        let prediction = predict(1000.0, &candidates);
        assert!(!prediction.converged);
        assert_eq!(prediction.iterations, MAX_ITERATIONS);
        assert_eq!(prediction.value(), Some(30.0));
    }

    #[test]
    fn sticky_range_from_geometry() {
        let candidate = Candidate::sticky(50.0, 10.0, 300.0, 1300.0);
        assert_eq!(
            candidate,
            Candidate::Sticky {
                height: 50.0,
                min_scroll: 290.0,
                max_scroll: 1240.0,
            }
        );
        assert!(candidate.contributes_at(290.0));
        assert!(candidate.contributes_at(1240.0));
        assert!(!candidate.contributes_at(289.0));
    }

    #[test]
    fn px_formatting() {
        assert_eq!(format_px(70.0), "70px");
        assert_eq!(format_px(12.5), "12.5px");
        assert_eq!(format_px(-0.0), "0px");
    }
}
