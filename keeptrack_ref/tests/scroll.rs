// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sticky detection, scroll padding, and anchor-jump prediction.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use keeptrack::scroll_padding::SCROLL_PADDING_TOP;
use keeptrack::{Click, Dom, Listeners, Modifiers, Settings, attr};
use keeptrack_ref::{Document, Harness, NodeId};
use kurbo::Rect;

/// A fixed 40px header, a 30px nav sticking at 40px, a target section at 1000
/// and a link to it.
struct Page {
    header: NodeId,
    nav: NodeId,
    target: NodeId,
    link: NodeId,
}

fn page(doc: &mut Document) -> Page {
    let body = doc.body().unwrap();

    let header = doc.append(body, "header");
    doc.set_box(header, Rect::new(0.0, 0.0, 1024.0, 40.0));
    doc.set_sheet_style(header, "position", "fixed");
    doc.set_attribute(header, attr::SCROLL_PADDING, "");

    let nav = doc.append(body, "nav");
    doc.set_box(nav, Rect::new(0.0, 100.0, 1024.0, 130.0));
    doc.set_sheet_style(nav, "position", "sticky");
    doc.set_sheet_style(nav, "top", "40px");
    doc.set_attribute(nav, attr::SCROLL_PADDING, "");

    let target = doc.append(body, "section");
    doc.set_box(target, Rect::new(0.0, 1000.0, 1024.0, 1500.0));
    doc.set_attribute(target, "id", "target");

    let link = doc.append(body, "a");
    doc.set_box(link, Rect::new(0.0, 200.0, 100.0, 220.0));
    doc.set_attribute(link, "href", "#target");

    Page {
        header,
        nav,
        target,
        link,
    }
}

fn padding(h: &Harness) -> Option<&str> {
    h.doc.style(h.doc.document_element(), SCROLL_PADDING_TOP)
}

fn detecting() -> Settings<NodeId> {
    Settings::default().with_detect_sticky(true)
}

#[test]
fn sticky_transitions_fire_once() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let nav = doc.append(body, "nav");
    doc.set_box(nav, Rect::new(0.0, 200.0, 1024.0, 250.0));
    doc.set_sheet_style(nav, "position", "sticky");
    doc.set_sheet_style(nav, "top", "0");
    doc.set_attribute(nav, attr::TRACK, "height");
    doc.set_attribute(nav, "id", "nav");
    let root = doc.document_element();

    let stuck: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink = Rc::clone(&stuck);
    let settings = detecting().with_on_change(move |_, property, value| {
        if property == "stuck" {
            sink.borrow_mut().push(value.to_string());
        }
    });

    let mut h = Harness::new(doc);
    h.init(settings);
    assert!(h.doc.listeners().contains(Listeners::SCROLL));
    assert!(!h.doc.has_attribute(nav, attr::STUCK));
    assert_eq!(h.doc.style(root, "--nav-stuck"), None);

    h.doc.scroll_to(300.0);
    h.frame();
    assert!(h.doc.has_attribute(nav, attr::STUCK));
    assert_eq!(h.doc.style(root, "--nav-stuck"), Some("1"));

    h.doc.scroll_to(310.0);
    h.frame();
    assert_eq!(stuck.borrow().as_slice(), ["1"]);

    h.doc.scroll_to(0.0);
    h.frame();
    assert!(!h.doc.has_attribute(nav, attr::STUCK));
    assert_eq!(h.doc.style(root, "--nav-stuck"), Some("0"));
    assert_eq!(stuck.borrow().as_slice(), ["1", "0"]);

    h.doc.scroll_to(300.0);
    h.frame();
    h.destroy();
    assert!(!h.doc.has_attribute(nav, attr::STUCK));
    assert_eq!(h.doc.style(root, "--nav-stuck"), None);
    assert_eq!(h.doc.style(root, "--nav-height"), None);
}

#[test]
fn unprefixed_stuck_flag_lands_on_the_element() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let bar = doc.append(body, "div");
    doc.set_box(bar, Rect::new(0.0, 0.0, 1024.0, 50.0));
    doc.set_sheet_style(bar, "position", "sticky");
    doc.set_sheet_style(bar, "top", "0");
    doc.set_attribute(bar, attr::SCROLL_PADDING, "");

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert!(h.doc.has_attribute(bar, attr::STUCK));
    assert_eq!(h.doc.style(bar, "--stuck"), Some("1"));
}

#[test]
fn sticky_detection_is_off_by_default() {
    let mut doc = Document::new();
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(Settings::default());
    assert!(!h.doc.listeners().contains(Listeners::SCROLL));
    h.doc.scroll_to(500.0);
    h.frame();
    assert!(!h.doc.has_attribute(p.nav, attr::STUCK));
}

#[test]
fn renamed_scroll_padding_element_drops_old_stuck_flag() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let bar = doc.append(body, "div");
    doc.set_box(bar, Rect::new(0.0, 0.0, 1024.0, 50.0));
    doc.set_sheet_style(bar, "position", "sticky");
    doc.set_sheet_style(bar, "top", "0");
    doc.set_attribute(bar, attr::SCROLL_PADDING, "");
    doc.set_attribute(bar, "id", "old");
    let root = doc.document_element();

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert_eq!(h.doc.style(root, "--old-stuck"), Some("1"));

    h.doc.set_attribute(bar, "id", "new");
    h.pump();
    assert_eq!(h.doc.style(root, "--old-stuck"), None);
    assert!(!h.doc.has_attribute(bar, attr::STUCK));

    h.settle();
    assert_eq!(h.doc.style(root, "--new-stuck"), Some("1"));
}

#[test]
fn rename_with_empty_track_list_drops_old_stuck_flag() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let bar = doc.append(body, "div");
    doc.set_box(bar, Rect::new(0.0, 0.0, 1024.0, 50.0));
    doc.set_sheet_style(bar, "position", "sticky");
    doc.set_sheet_style(bar, "top", "0");
    doc.set_attribute(bar, attr::TRACK, "");
    doc.set_attribute(bar, attr::SCROLL_PADDING, "");
    doc.set_attribute(bar, "id", "old");
    let root = doc.document_element();

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert_eq!(h.doc.style(root, "--old-stuck"), Some("1"));

    h.doc.set_attribute(bar, "id", "new");
    h.settle();
    assert_eq!(h.doc.style(root, "--old-stuck"), None);
    assert_eq!(h.doc.style(root, "--new-stuck"), Some("1"));

    h.destroy();
    assert_eq!(h.doc.style(root, "--old-stuck"), None);
    assert_eq!(h.doc.style(root, "--new-stuck"), None);
}

#[test]
fn removing_scroll_padding_attribute_clears_stuck_state() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let bar = doc.append(body, "div");
    doc.set_box(bar, Rect::new(0.0, 0.0, 1024.0, 50.0));
    doc.set_sheet_style(bar, "position", "sticky");
    doc.set_sheet_style(bar, "top", "0");
    doc.set_attribute(bar, attr::SCROLL_PADDING, "");

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert_eq!(padding(&h), Some("50px"));

    h.doc.remove_attribute(bar, attr::SCROLL_PADDING);
    h.pump();
    assert_eq!(h.doc.style(bar, "--stuck"), None);
    assert!(!h.doc.has_attribute(bar, attr::STUCK));

    h.settle();
    assert_eq!(padding(&h), None);
}

#[test]
fn reactive_padding_sums_participants() {
    let mut doc = Document::new();
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(Settings::default());
    assert_eq!(padding(&h), Some("70px"));

    h.doc.remove_attribute(p.header, attr::SCROLL_PADDING);
    h.doc.remove_attribute(p.nav, attr::SCROLL_PADDING);
    h.settle();
    assert_eq!(padding(&h), None);
}

#[test]
fn reactive_padding_counts_sticky_only_while_stuck() {
    let mut doc = Document::new();
    page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert_eq!(padding(&h), Some("40px"));

    h.doc.scroll_to(100.0);
    h.frame();
    assert_eq!(padding(&h), Some("70px"));
}

#[test]
fn link_click_predicts_padding_at_destination() {
    let mut doc = Document::new();
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert_eq!(padding(&h), Some("40px"));

    h.click(p.link);
    assert_eq!(padding(&h), Some("70px"));
    assert!(h.keeptrack.is_predicting());
    assert!(h.doc.listeners().contains(Listeners::SCROLL_END));
    assert_eq!(h.doc.style(p.nav, "position"), None, "measurement restores inline styles");
    assert_eq!(h.doc.style(p.nav, "top"), None);
}

#[test]
fn click_on_link_descendant_predicts() {
    let mut doc = Document::new();
    let p = page(&mut doc);
    let label = doc.append(p.link, "span");

    let mut h = Harness::new(doc);
    h.init(detecting());
    h.click(label);
    assert!(h.keeptrack.is_predicting());
}

#[test]
fn ignored_clicks() {
    let mut doc = Document::new();
    let p = page(&mut doc);
    let body = doc.body().unwrap();
    let bare = doc.append(body, "a");
    doc.set_attribute(bare, "href", "#");
    let dangling = doc.append(body, "a");
    doc.set_attribute(dangling, "href", "#missing");
    let external = doc.append(body, "a");
    doc.set_attribute(external, "href", "/elsewhere#target");

    let mut h = Harness::new(doc);
    h.init(detecting());
    let clicks = [
        Click {
            modifiers: Modifiers::CTRL,
            ..Click::primary(p.link)
        },
        Click {
            button: 1,
            ..Click::primary(p.link)
        },
        Click {
            default_prevented: true,
            ..Click::primary(p.link)
        },
        Click {
            target: None,
            ..Click::primary(p.link)
        },
        Click::primary(p.target),
        Click::primary(bare),
        Click::primary(dangling),
        Click::primary(external),
    ];
    for click in &clicks {
        h.click_with(click);
        assert!(!h.keeptrack.is_predicting(), "{click:?}");
    }
    assert_eq!(padding(&h), Some("40px"));
}

#[test]
fn prediction_without_participants_clears_padding() {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    let target = doc.append(body, "section");
    doc.set_box(target, Rect::new(0.0, 1000.0, 1024.0, 1500.0));
    doc.set_attribute(target, "id", "target");
    let link = doc.append(body, "a");
    doc.set_attribute(link, "href", "#target");

    let mut h = Harness::new(doc);
    h.init(Settings::default());
    h.click(link);
    assert!(h.keeptrack.is_predicting());
    assert_eq!(padding(&h), None);
}

#[test]
fn lock_suppresses_reactive_updates_until_scroll_end() {
    let mut doc = Document::new();
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(detecting());
    h.click(p.link);
    h.recalculate();
    assert_eq!(padding(&h), Some("70px"));

    h.doc.finish_scroll();
    h.pump();
    assert!(!h.keeptrack.is_predicting());
    assert!(!h.doc.listeners().contains(Listeners::SCROLL_END));
    assert_eq!(padding(&h), Some("40px"));
    assert_eq!(h.doc.pending_timers(), 0);

    let writes = h.doc.style_writes();
    h.keeptrack.on_scroll_end(&mut h.doc);
    assert_eq!(h.doc.style_writes(), writes);
}

#[test]
fn lock_releases_after_two_still_frames() {
    let mut doc = Document::new();
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(detecting());
    h.click(p.link);
    h.frame();
    assert!(h.keeptrack.is_predicting());
    h.frame();
    assert!(!h.keeptrack.is_predicting());
    assert_eq!(padding(&h), Some("40px"));
}

#[test]
fn lock_falls_back_to_timeout_while_moving() {
    let mut doc = Document::new();
    doc.supports_scroll_end = false;
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(Settings::default());
    h.click(p.link);
    assert!(!h.doc.listeners().contains(Listeners::SCROLL_END));

    h.doc.scroll_to(500.0);
    h.frame();
    h.frame();
    assert!(h.keeptrack.is_predicting());
    assert!(h.doc.pending_frames().is_empty());

    h.advance(Duration::from_millis(4999));
    assert!(h.keeptrack.is_predicting());
    h.advance(Duration::from_millis(1));
    assert!(!h.keeptrack.is_predicting());
    assert_eq!(h.doc.pending_timers(), 0);
}

#[test]
fn repeated_prediction_restarts_the_lock() {
    let mut doc = Document::new();
    let p = page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(detecting());
    h.click(p.link);
    h.advance(Duration::from_millis(3000));
    h.click(p.link);
    assert_eq!(h.doc.pending_timers(), 1);
    assert_eq!(h.doc.pending_frames().len(), 1);

    h.advance(Duration::from_millis(2500));
    assert!(h.keeptrack.is_predicting(), "fallback restarted with the second click");
}

#[test]
fn initial_hash_predicts() {
    let mut doc = Document::new();
    page(&mut doc);
    doc.set_location_hash("#target");

    let mut h = Harness::new(doc);
    h.init(detecting());
    assert!(h.keeptrack.is_predicting());
    assert_eq!(padding(&h), Some("70px"));
}

#[test]
fn hash_and_history_navigation_predict() {
    let mut doc = Document::new();
    page(&mut doc);

    let mut h = Harness::new(doc);
    h.init(detecting());
    h.doc.set_location_hash("#target");
    h.pump();
    assert!(h.keeptrack.is_predicting());
    assert_eq!(padding(&h), Some("70px"));

    h.doc.finish_scroll();
    h.pump();
    assert!(!h.keeptrack.is_predicting());

    h.doc.pop_state("#target");
    h.pump();
    assert!(h.keeptrack.is_predicting());

    h.doc.finish_scroll();
    h.doc.pop_state("#nowhere");
    h.pump();
    assert!(!h.keeptrack.is_predicting());
}
