//! Benchmarks for the spring mesh.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use resona_dsp::elastika::ElastikaEngine;
use resona_dsp::engine::{Powered, StereoEngine};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_elastika(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/elastika");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| if i % 64 < 4 { 1.0 } else { 0.0 })
            .collect();

        // === DEFAULT SETTINGS ===
        let mut engine = ElastikaEngine::new(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("default", size), &size, |b, _| {
            b.iter(|| {
                for &x in &input {
                    black_box(engine.process(SAMPLE_RATE, black_box(x), black_box(-x)));
                }
            })
        });

        // === CURL AND TILT ===
        // Rotation plus cross-fed ports, with a parameter change every block so
        // the coefficient refresh is included
        let mut engine = ElastikaEngine::new(SAMPLE_RATE);
        engine.set_input_tilt(0.8);
        engine.set_output_tilt(0.2);
        let mut curl = 0.0f32;
        group.bench_with_input(BenchmarkId::new("curl_modulated", size), &size, |b, _| {
            b.iter(|| {
                curl = if curl > 0.9 { -0.9 } else { curl + 0.1 };
                engine.set_curl(curl);
                for &x in &input {
                    black_box(engine.process(SAMPLE_RATE, black_box(x), black_box(x)));
                }
            })
        });

        // === POWER GATED ===
        let mut powered = Powered::new(ElastikaEngine::new(SAMPLE_RATE), SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("powered", size), &size, |b, _| {
            b.iter(|| {
                for &x in &input {
                    black_box(powered.process(true, black_box(x), black_box(-x)));
                }
            })
        });

        // === DYNAMIC DISPATCH ===
        let mut boxed: Box<dyn StereoEngine> = Box::new(ElastikaEngine::new(SAMPLE_RATE));
        group.bench_with_input(BenchmarkId::new("boxed", size), &size, |b, _| {
            b.iter(|| {
                for &x in &input {
                    black_box(boxed.render_frame(black_box(x), black_box(-x)));
                }
            })
        });
    }

    group.finish();
}
