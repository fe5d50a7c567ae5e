// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Full passes over documents with many tracked elements.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use keeptrack::{Dom, Settings, attr};
use keeptrack_ref::{Document, Harness};
use kurbo::Rect;

/// `n` tracked boxes, every eighth one sticky and a scroll-padding participant.
fn document(n: u32) -> Document {
    let mut doc = Document::new();
    let body = doc.body().unwrap();
    for i in 0..n {
        let el = doc.append(body, "div");
        let y = f64::from(i) * 60.0;
        doc.set_box(el, Rect::new(0.0, y, 800.0, y + 50.0));
        doc.set_attribute(el, "id", &format!("box{i}"));
        doc.set_attribute(el, attr::TRACK, "height, width");
        if i % 8 == 0 {
            doc.set_sheet_style(el, "position", "sticky");
            doc.set_sheet_style(el, "top", "calc(1rem + 4px)");
            doc.set_attribute(el, attr::SCROLL_PADDING, "");
        }
    }
    doc
}

fn settings() -> Settings<keeptrack_ref::NodeId> {
    Settings::default().with_detect_sticky(true)
}

fn bench_settle(c: &mut Criterion) {
    let mut group = c.benchmark_group("settle");
    for n in [16_u32, 256, 1024] {
        group.bench_with_input(BenchmarkId::new("init", n), &n, |b, &n| {
            b.iter_batched(
                || Harness::new(document(n)),
                |mut h| {
                    h.init(settings());
                    black_box(h.doc.style_writes())
                },
                BatchSize::SmallInput,
            );
        });

        let mut h = Harness::new(document(n));
        h.init(settings());
        group.bench_with_input(BenchmarkId::new("recalculate_unchanged", n), &n, |b, _| {
            b.iter(|| {
                h.recalculate();
                black_box(h.doc.style_writes())
            });
        });

        let mut y = 0.0;
        group.bench_with_input(BenchmarkId::new("scroll_frame", n), &n, |b, _| {
            b.iter(|| {
                y = if y > 10_000.0 { 0.0 } else { y + 37.0 };
                h.doc.scroll_to(y);
                h.frame();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_settle);
criterion_main!(benches);
