use std::f32::consts::TAU;

use crate::clamp_sample_rate;
use crate::dsp::control::clamp;

/*
DC Rejection
============

The mesh and waveguide are nonlinear: curl, pre-tension and airflow all
bias the output away from zero. A one-pole high-pass removes that subsonic
offset before the limiter sees it, so the limiter does not waste headroom
on a signal nobody can hear.

The filter is the discrete RC high-pass:

    y[n] = a × (y[n−1] + x[n] − x[n−1])
    a    = 1 / (1 + 2π × fc / fs)

For any positive corner and sample rate, 0 < a < 1, so the recursion is
stable. A constant input makes x[n] − x[n−1] zero after the first sample,
leaving y[n] = a × y[n−1], which decays geometrically to zero.

`a` is a control-rate coefficient: it is recomputed only when the corner or
the sample rate actually changes, never per sample.
*/

pub const DC_REJECT_MIN_HZ: f32 = 20.0;
pub const DC_REJECT_MAX_HZ: f32 = 400.0;
pub const DC_REJECT_DEFAULT_HZ: f32 = 20.0;

/// Single-channel one-pole high-pass.
#[derive(Debug, Clone)]
pub struct DcRejectFilter {
    corner_hz: f32,
    sample_rate: f32,
    coeff: f32,
    prev_input: f32,
    prev_output: f32,
}

impl DcRejectFilter {
    pub fn new(corner_hz: f32, sample_rate: f32) -> Self {
        let corner_hz = clamp(corner_hz, DC_REJECT_MIN_HZ, DC_REJECT_MAX_HZ);
        let sample_rate = clamp_sample_rate(sample_rate);
        Self {
            corner_hz,
            sample_rate,
            coeff: Self::coefficient(corner_hz, sample_rate),
            prev_input: 0.0,
            prev_output: 0.0,
        }
    }

    #[inline]
    fn coefficient(corner_hz: f32, sample_rate: f32) -> f32 {
        1.0 / (1.0 + TAU * corner_hz / sample_rate)
    }

    /// Set the corner frequency, clamped to [20, 400] Hz.
    pub fn set_corner(&mut self, corner_hz: f32) {
        let corner_hz = clamp(corner_hz, DC_REJECT_MIN_HZ, DC_REJECT_MAX_HZ);
        if corner_hz != self.corner_hz {
            self.corner_hz = corner_hz;
            self.coeff = Self::coefficient(self.corner_hz, self.sample_rate);
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let sample_rate = clamp_sample_rate(sample_rate);
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.coeff = Self::coefficient(self.corner_hz, self.sample_rate);
        }
    }

    pub fn corner(&self) -> f32 {
        self.corner_hz
    }

    #[inline]
    pub fn apply(&mut self, sample: f32) -> f32 {
        let out = self.coeff * (self.prev_output + sample - self.prev_input);
        self.prev_input = sample;
        self.prev_output = out;
        out
    }

    pub fn reset(&mut self) {
        self.prev_input = 0.0;
        self.prev_output = 0.0;
    }
}

/// A matched pair of [`DcRejectFilter`]s sharing one corner.
#[derive(Debug, Clone)]
pub struct StereoDcReject {
    left: DcRejectFilter,
    right: DcRejectFilter,
}

impl StereoDcReject {
    pub fn new(corner_hz: f32, sample_rate: f32) -> Self {
        Self {
            left: DcRejectFilter::new(corner_hz, sample_rate),
            right: DcRejectFilter::new(corner_hz, sample_rate),
        }
    }

    pub fn set_corner(&mut self, corner_hz: f32) {
        self.left.set_corner(corner_hz);
        self.right.set_corner(corner_hz);
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.left.set_sample_rate(sample_rate);
        self.right.set_sample_rate(sample_rate);
    }

    pub fn corner(&self) -> f32 {
        self.left.corner()
    }

    #[inline]
    pub fn apply(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.left.apply(left), self.right.apply(right))
    }

    pub fn reset(&mut self) {
        self.left.reset();
        self.right.reset();
    }
}

impl Default for StereoDcReject {
    fn default() -> Self {
        Self::new(DC_REJECT_DEFAULT_HZ, 48_000.0)
    }
}
