//! Benchmarks for the power slewer over polyphonic blocks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use resona_dsp::dsp::slewer::{ramp_length_for, PowerSlewer};
use resona_dsp::MAX_CHANNELS;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_slewer(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/slewer");

    for &size in BLOCK_SIZES {
        let mut channels = [0.5f32; MAX_CHANNELS];

        // Toggle every block so the ramp path is exercised
        let mut slewer = PowerSlewer::new(ramp_length_for(SAMPLE_RATE), false);
        let mut on = false;
        group.bench_with_input(BenchmarkId::new("toggling_16ch", size), &size, |b, &size| {
            b.iter(|| {
                on = !on;
                for _ in 0..size {
                    slewer.update(black_box(on));
                    slewer.process(black_box(&mut channels));
                }
            })
        });
    }

    group.finish();
}
