//! Realtime physical-modeling resonators.
//!
//! Two engines advance one stereo sample per call:
//! - [`elastika::ElastikaEngine`]: a triangular spring-mass mesh with a
//!   magnetic curl force.
//! - [`tube::TubeUnitEngine`]: an airflow-driven waveguide with a rotating
//!   reflection, replicated per channel by [`tube::TubeBank`].
//!
//! Both share the primitives in [`dsp`] (DC rejection, automatic gain control,
//! click-free power slewing) and can be power-gated through
//! [`engine::Powered`]. Nothing on the per-sample path allocates, locks or logs.

pub mod dsp; // Shared realtime primitives
pub mod elastika; // Spring-mesh engine
pub mod engine; // Engine trait and power gating
pub mod mute; // Gated, slewed mute channels
#[cfg(feature = "serde")]
pub mod persist; // Host-persisted flags
pub mod tube; // Waveguide engine and polyphonic bank

/// Maximum number of polyphonic channels a host can route through one bank.
pub const MAX_CHANNELS: usize = 16;
/// Lowest sample rate the engines accept; lower rates are clamped.
pub const MIN_SAMPLE_RATE: f32 = 8_000.0;
/// Highest sample rate the engines accept; buffers are sized for it.
pub const MAX_SAMPLE_RATE: f32 = 192_000.0;
/// Audio inputs are clamped to this magnitude before injection.
pub const INPUT_LIMIT: f32 = 8.0;

#[inline]
pub(crate) fn clamp_sample_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() {
        sample_rate.clamp(MIN_SAMPLE_RATE, MAX_SAMPLE_RATE)
    } else {
        MIN_SAMPLE_RATE
    }
}
