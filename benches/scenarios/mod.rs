//! Whole-engine benchmarks.
//!
//! These model what a host pays per block: one Elastika, or a full
//! polyphonic tube bank.

mod elastika;
mod tube_bank;

pub use elastika::bench_elastika;
pub use tube_bank::bench_tube_bank;
