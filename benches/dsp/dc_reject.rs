//! Benchmarks for the DC rejection filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use resona_dsp::dsp::StereoDcReject;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_dc_reject(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/dc_reject");

    for &size in BLOCK_SIZES {
        // Offset ramp
        let input: Vec<f32> = (0..size)
            .map(|i| 0.5 + (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        let mut filter = StereoDcReject::new(20.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                for ((l, r), &x) in left.iter_mut().zip(right.iter_mut()).zip(&input) {
                    (*l, *r) = filter.apply(black_box(x), black_box(x));
                }
            })
        });
    }

    group.finish();
}
