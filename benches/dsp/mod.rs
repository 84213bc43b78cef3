//! Benchmarks for shared realtime primitives.

mod agc;
mod dc_reject;
mod slewer;

pub use agc::bench_agc;
pub use dc_reject::bench_dc_reject;
pub use slewer::bench_slewer;
