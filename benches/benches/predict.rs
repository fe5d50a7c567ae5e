// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scroll-padding fixed point.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use keeptrack::scroll_padding::{Candidate, predict};

/// One fixed header followed by `n` stacked sticky bars with overlapping
/// ranges, so most iterations see several contributors.
fn candidates(n: u32) -> Vec<Candidate> {
    let mut out = vec![Candidate::Fixed { height: 48.0 }];
    let mut offset = 48.0;
    for i in 0..n {
        let height = 24.0 + f64::from(i % 3) * 8.0;
        let unstuck = 400.0 + f64::from(i) * 900.0;
        out.push(Candidate::sticky(height, offset, unstuck, unstuck + 4000.0));
        offset += height;
    }
    out
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("predict");
    for n in [1_u32, 8, 64] {
        let list = candidates(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &list, |b, list| {
            b.iter(|| predict(black_box(2_500.0), black_box(list)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_predict);
criterion_main!(benches);
