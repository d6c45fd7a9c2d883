//! # Engine Benchmark
//!
//! Measures the per-point cost of the fixed-point iteration at the caps the
//! pipeline actually runs with.

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scanbrot_core::{escape_time, Coord};

/// Interior point: always runs to the cap.
fn bench_interior(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_interior");

    for cap in [64_u16, 256, 1024, 4095] {
        group.bench_with_input(BenchmarkId::new("cap", cap), &cap, |b, &cap| {
            b.iter(|| escape_time(black_box(Coord::from_f64(-0.1)), black_box(Coord::ZERO), cap));
        });
    }

    group.finish();
}

/// A row of the classic view: mixed escape times.
fn bench_row(c: &mut Criterion) {
    let step = Coord::from_f64(3.0 / 960.0);
    let left = Coord::from_f64(-0.5) - step.mul_int(480);
    let im = Coord::from_f64(0.3);

    c.bench_function("engine_row_960", |b| {
        b.iter(|| {
            let mut re = left;
            let mut inside = 0_u32;
            for _ in 0..960 {
                if escape_time(re, im, 256).inside {
                    inside += 1;
                }
                re += step;
            }
            black_box(inside)
        });
    });
}

criterion_group!(benches, bench_interior, bench_row);
criterion_main!(benches);
