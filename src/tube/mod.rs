//! Airflow-driven waveguide resonator and its polyphonic bank.

pub mod controls;
pub mod engine;
pub mod poly;
pub mod waveguide;

pub use engine::TubeUnitEngine;
pub use poly::TubeBank;
pub use waveguide::DelayLine;
