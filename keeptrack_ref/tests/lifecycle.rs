// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Init, deferral, teardown, and debouncing.

use std::time::Duration;

use keeptrack::scroll_padding::SCROLL_PADDING_TOP;
use keeptrack::{Dom, Listeners, Priority, ReadyState, Settings, attr};
use keeptrack_ref::{Document, Harness, NodeId};
use kurbo::{Rect, Size};

fn tracked(doc: &mut Document, parent: NodeId) -> NodeId {
    let el = doc.append(parent, "div");
    doc.set_box(el, Rect::new(0.0, 0.0, 100.0, 50.0));
    doc.set_attribute(el, attr::TRACK, "height");
    el
}

#[test]
fn init_waits_for_dom_content_loaded() {
    let doc = Document::loading();
    let mut h = Harness::new(doc);
    h.init(Settings::default());
    assert!(!h.keeptrack.is_active());
    assert!(h.keeptrack.is_deferred());
    assert_eq!(h.doc.listeners(), Listeners::DOM_CONTENT_LOADED);

    let body = h.doc.attach_body();
    let el = tracked(&mut h.doc, body);
    h.pump();
    assert!(h.keeptrack.is_active());
    assert!(!h.keeptrack.is_deferred());
    assert!(!h.doc.listeners().contains(Listeners::DOM_CONTENT_LOADED));
    assert_eq!(h.keeptrack.tracked(), &[el]);
    assert_eq!(h.doc.style(el, "--height"), Some("50px"));
}

#[test]
fn init_without_body_after_parsing_does_nothing() {
    let mut doc = Document::loading();
    doc.set_ready_state(ReadyState::Interactive);
    let mut h = Harness::new(doc);
    h.init(Settings::default());
    assert!(!h.keeptrack.is_active());
    assert!(!h.keeptrack.is_deferred());
    assert!(h.doc.listeners().is_empty());
}

#[test]
fn destroy_cancels_a_deferred_init() {
    let doc = Document::loading();
    let mut h = Harness::new(doc);
    h.init(Settings::default());
    h.destroy();
    assert!(!h.keeptrack.is_deferred());
    assert!(h.doc.listeners().is_empty());

    h.doc.attach_body();
    h.pump();
    assert!(!h.keeptrack.is_active());
}

#[test]
fn destroy_before_init_is_harmless() {
    let mut h = Harness::new(Document::new());
    h.destroy();
    h.destroy();
    assert!(!h.keeptrack.is_active());
    assert!(h.doc.listeners().is_empty());
}

#[test]
fn inactive_entry_points_are_noops() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let el = tracked(&mut doc, body);
    let mut h = Harness::new(doc);
    h.recalculate();
    h.keeptrack.on_viewport_resize(&mut h.doc);
    h.keeptrack.on_element_resize(&mut h.doc, &[el]);
    h.keeptrack.on_scroll(&mut h.doc);
    h.keeptrack.on_hash_change(&mut h.doc);
    assert_eq!(h.doc.style_writes(), 0);
    assert_eq!(h.doc.pending_timers(), 0);
    assert!(h.doc.pending_frames().is_empty());
}

#[test]
fn destroy_reverts_everything() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let el = tracked(&mut doc, body);
    doc.set_attribute(el, "id", "box");
    let nav = doc.append(body, "nav");
    doc.set_box(nav, Rect::new(0.0, 0.0, 1024.0, 30.0));
    doc.set_sheet_style(nav, "position", "sticky");
    doc.set_sheet_style(nav, "top", "calc(1rem - 16px)");
    doc.set_attribute(nav, attr::SCROLL_PADDING, "");
    let target = doc.append(body, "section");
    doc.set_box(target, Rect::new(0.0, 2000.0, 1024.0, 2400.0));
    doc.set_attribute(target, "id", "target");
    doc.set_scrollbar(Size::new(15.0, 0.0));
    let root = doc.document_element();
    let children_before = doc.children(body).len();

    let mut h = Harness::new(doc);
    h.init(
        Settings::default()
            .with_detect_sticky(true)
            .with_poll(true)
            .with_scrollbar_height(true),
    );
    assert_eq!(h.keeptrack.tracked(), &[el, nav]);
    assert!(h.doc.has_attribute(nav, attr::STUCK));
    assert_eq!(h.doc.children(body).len(), children_before + 1, "top measurer");
    assert_eq!(h.doc.style(root, "--box-height"), Some("50px"));
    assert_eq!(h.doc.style(root, "--scrollbar-width"), Some("15px"));

    h.doc.set_location_hash("#target");
    h.doc.resize_viewport(Size::new(800.0, 600.0));
    h.doc.set_attribute(el, attr::TRACK, "height, width");
    h.pump();
    assert!(h.keeptrack.is_predicting());
    assert!(h.doc.pending_timers() > 0);
    assert!(!h.doc.pending_frames().is_empty());

    h.destroy();
    assert!(!h.keeptrack.is_active());
    assert!(!h.keeptrack.is_predicting());
    assert!(h.keeptrack.tracked().is_empty());
    assert!(h.doc.listeners().is_empty());
    assert!(!h.doc.resize_connected());
    assert!(!h.doc.observing_mutations());
    assert!(h.doc.pending_frames().is_empty());
    assert_eq!(h.doc.pending_timers(), 0);
    assert_eq!(h.doc.children(body).len(), children_before);
    assert!(h.doc.custom_properties(root).is_empty());
    assert!(h.doc.custom_properties(el).is_empty());
    assert!(h.doc.custom_properties(nav).is_empty());
    assert_eq!(h.doc.style(root, SCROLL_PADDING_TOP), None);
    assert!(!h.doc.has_attribute(nav, attr::STUCK));

    let writes = h.doc.style_writes();
    h.advance(Duration::from_secs(10));
    h.frame();
    assert_eq!(h.doc.style_writes(), writes);
}

#[test]
fn reinit_replaces_previous_run() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let el = tracked(&mut doc, body);

    let mut h = Harness::new(doc);
    h.init(Settings::default().with_detect_sticky(true));
    h.init(Settings::default());
    assert!(h.keeptrack.is_active());
    assert!(!h.doc.listeners().contains(Listeners::SCROLL));
    assert_eq!(h.doc.style(el, "--height"), Some("50px"));
}

#[test]
fn viewport_resizes_are_debounced() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let el = tracked(&mut doc, body);
    doc.set_sheet_style(el, "height", "10vh");

    let mut h = Harness::new(doc);
    h.init(Settings::default().with_debounce(Duration::from_millis(100)));
    assert_eq!(h.doc.style(el, "--height"), Some("10vh"));

    h.doc.set_sheet_style(el, "height", "60px");
    for _ in 0..5 {
        h.doc.resize_viewport(Size::new(900.0, 700.0));
        h.advance(Duration::from_millis(60));
    }
    assert_eq!(h.doc.pending_timers(), 1, "each resize restarts the timer");
    assert_eq!(h.doc.style(el, "--height"), Some("10vh"));

    h.advance(Duration::from_millis(40));
    assert_eq!(h.doc.pending_frames().len(), 1);
    h.frame();
    assert_eq!(h.doc.style(el, "--height"), Some("60px"));
    assert_eq!(h.doc.pending_timers(), 0);
}

#[test]
fn relevant_mutations_coalesce_into_one_pass() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();

    let mut h = Harness::new(doc);
    h.init(Settings::default());
    let first = tracked(&mut h.doc, body);
    h.pump();
    let second = tracked(&mut h.doc, body);
    h.pump();
    assert_eq!(h.doc.pending_timers(), 1);

    h.settle();
    assert_eq!(h.keeptrack.tracked(), &[first, second]);
    assert_eq!(h.doc.resize_observed(), 2);
}

#[test]
fn inline_values_are_restored_after_measuring() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let bar = doc.append(body, "div");
    doc.set_box(bar, Rect::new(0.0, 300.0, 1024.0, 340.0));
    doc.set_style_property(bar, "position", "sticky", Priority::Important);
    doc.set_style_property(bar, "top", "0", Priority::Normal);
    doc.set_attribute(bar, attr::SCROLL_PADDING, "");
    let target = doc.append(body, "section");
    doc.set_box(target, Rect::new(0.0, 1000.0, 1024.0, 1200.0));
    doc.set_attribute(target, "id", "target");
    doc.set_location_hash("#target");

    let mut h = Harness::new(doc);
    h.init(Settings::default());
    assert_eq!(
        h.doc.inline_style(bar, "position"),
        Some(("sticky".to_string(), Priority::Important))
    );
    assert_eq!(
        h.doc.inline_style(bar, "top"),
        Some(("0".to_string(), Priority::Normal))
    );
    assert_eq!(h.doc.style(h.doc.document_element(), SCROLL_PADDING_TOP), Some("40px"));
}
