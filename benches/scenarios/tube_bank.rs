//! Benchmarks for the polyphonic waveguide bank.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use resona_dsp::tube::{TubeBank, TubeUnitEngine};
use resona_dsp::MAX_CHANNELS;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_tube_bank(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/tube_bank");

    for &size in BLOCK_SIZES {
        // === SINGLE CHANNEL ===
        let mut engine = TubeUnitEngine::new(SAMPLE_RATE);
        engine.set_vortex(0.5);
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    black_box(engine.process(black_box(0.0), black_box(0.0)));
                }
            })
        });

        // === FULL BANK ===
        // 16 channels at different pitches with normalled mono input
        let mut bank = TubeBank::new(SAMPLE_RATE);
        for (c, engine) in bank.engines_mut().iter_mut().enumerate() {
            engine.set_root_frequency(55.0 * (1.0 + c as f32 * 0.25));
        }
        let left_in = [0.0f32; 1];
        let right_in = [0.0f32; 1];
        let mut left_out = [0.0f32; MAX_CHANNELS];
        let mut right_out = [0.0f32; MAX_CHANNELS];
        group.bench_with_input(BenchmarkId::new("bank_16ch", size), &size, |b, &size| {
            b.iter(|| {
                for _ in 0..size {
                    bank.process_frame(
                        MAX_CHANNELS,
                        black_box(&left_in),
                        black_box(&right_in),
                        &mut left_out,
                        &mut right_out,
                    );
                }
                black_box(&left_out);
            })
        });
    }

    group.finish();
}
