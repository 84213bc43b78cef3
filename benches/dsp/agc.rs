//! Benchmarks for the output limiter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use resona_dsp::dsp::AutomaticGainControl;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_agc(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/agc");

    for &size in BLOCK_SIZES {
        // Hot signal so the limiter is actually working
        let input: Vec<f32> = (0..size)
            .map(|i| 4.0 * (i as f32 * 0.05).sin())
            .collect();
        let mut left = input.clone();
        let mut right = input.clone();

        let mut agc = AutomaticGainControl::new(1.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                for ((l, r), &x) in left.iter_mut().zip(right.iter_mut()).zip(&input) {
                    (*l, *r) = agc.apply_stereo(black_box(x), black_box(-x));
                }
            })
        });

        let mut bypassed = AutomaticGainControl::new(1.0, SAMPLE_RATE);
        bypassed.set_enabled(false);
        group.bench_with_input(BenchmarkId::new("disabled", size), &size, |b, _| {
            b.iter(|| {
                for (l, &x) in left.iter_mut().zip(&input) {
                    *l = bypassed.apply(black_box(x));
                }
            })
        });
    }

    group.finish();
}
