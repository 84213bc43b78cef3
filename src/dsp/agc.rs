use crate::clamp_sample_rate;
use crate::dsp::control::{clamp, AGC_LEVEL_DEFAULT, AGC_LEVEL_MAX, AGC_LEVEL_MIN};

/*
Automatic Gain Control
======================

The resonators can ring far louder than their inputs: a lightly damped mesh
or a high-decay tube accumulates energy. The AGC keeps the output at or
below a ceiling ("level") without the host having to ride the volume.

Vocabulary
----------

  level       The ceiling, in normalized units. 1.0 corresponds to 5 V at
              the host, 2.0 to 10 V.

  follower    The envelope, expressed as a ratio to the ceiling. 1.0 means
              "at or below the ceiling, no gain reduction". 2.0 means the
              signal peaks at twice the ceiling and is being halved.

  distortion  How hard the AGC is working, in dB: 20 × log10(follower).
              Zero when not limiting.


Attack and Release
------------------

  attack   Immediate. When the instantaneous peak exceeds follower × level
           the follower jumps to peak / level in the same sample, so the
           output can never exceed the ceiling.

  release  Exponential with a 100 ms half-life back toward max(1, ratio).
           Slow enough that a sustained tone does not pump.

    follower
      2.0 ┤    ┌╮
          │    │ ╲___
          │    │     ╲____
      1.0 ┼────┘          ╲_________
          └──────────────────────────→ time
            loud burst   release

Once the follower is within a hair of 1.0 it snaps to exactly 1.0 so the
distortion indicator goes fully dark.

Both channels of a stereo pair share one follower, so limiting never
shifts the stereo image.
*/

/// Release half-life in seconds.
pub const AGC_RELEASE_HALF_LIFE: f32 = 0.1;

const FOLLOWER_SNAP: f32 = 1.0e-4;

#[derive(Debug, Clone)]
pub struct AutomaticGainControl {
    enabled: bool,
    level: f32,
    sample_rate: f32,
    release: f32,
    follower: f32,
}

impl AutomaticGainControl {
    pub fn new(level: f32, sample_rate: f32) -> Self {
        let sample_rate = clamp_sample_rate(sample_rate);
        Self {
            enabled: true,
            level: clamp(level, AGC_LEVEL_MIN, AGC_LEVEL_MAX),
            sample_rate,
            release: Self::release_coefficient(sample_rate),
            follower: 1.0,
        }
    }

    #[inline]
    fn release_coefficient(sample_rate: f32) -> f32 {
        0.5f32.powf(1.0 / (sample_rate * AGC_RELEASE_HALF_LIFE))
    }

    /// Set the peak ceiling, clamped to [1, 2].
    pub fn set_level(&mut self, level: f32) {
        self.level = clamp(level, AGC_LEVEL_MIN, AGC_LEVEL_MAX);
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Disabling also clears the envelope, so re-enabling starts clean.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.follower = 1.0;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let sample_rate = clamp_sample_rate(sample_rate);
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.release = Self::release_coefficient(sample_rate);
        }
    }

    /// Current compression in dB; zero when disabled or not limiting.
    pub fn distortion(&self) -> f32 {
        if self.enabled && self.follower > 1.0 {
            20.0 * self.follower.log10()
        } else {
            0.0
        }
    }

    #[inline]
    fn track(&mut self, peak: f32) -> f32 {
        let ratio = peak / self.level;
        if ratio > self.follower {
            self.follower = ratio;
        } else {
            let target = ratio.max(1.0);
            self.follower = self.release * (self.follower - target) + target;
            if self.follower < 1.0 + FOLLOWER_SNAP {
                self.follower = 1.0;
            }
        }
        self.follower
    }

    /// Limit a single sample.
    #[inline]
    pub fn apply(&mut self, sample: f32) -> f32 {
        if !self.enabled {
            return sample;
        }
        let follower = self.track(sample.abs());
        sample / follower
    }

    /// Limit a stereo pair with a shared envelope.
    #[inline]
    pub fn apply_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        if !self.enabled {
            return (left, right);
        }
        let follower = self.track(left.abs().max(right.abs()));
        (left / follower, right / follower)
    }

    pub fn reset(&mut self) {
        self.follower = 1.0;
    }
}

impl Default for AutomaticGainControl {
    fn default() -> Self {
        Self::new(AGC_LEVEL_DEFAULT, 48_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn test_disabled_is_identity() {
        let mut agc = AutomaticGainControl::default();
        agc.set_enabled(false);
        for &x in &[0.0, 0.3, -0.9, 1.5, -7.0, 100.0] {
            assert_eq!(agc.apply(x), x);
            assert_eq!(agc.apply_stereo(x, -x), (x, -x));
        }
        assert_eq!(agc.distortion(), 0.0);
    }

    #[test]
    fn test_quiet_signal_is_untouched() {
        let mut agc = AutomaticGainControl::default();
        for n in 0..1_000 {
            let x = 0.5 * (TAU * 220.0 * n as f32 / 48_000.0).sin();
            assert_eq!(agc.apply(x), x);
        }
        assert_eq!(agc.distortion(), 0.0);
    }

    #[test]
    fn test_sustained_overload_is_limited() {
        let rate = 48_000.0;
        let mut agc = AutomaticGainControl::new(1.0, rate);
        let mut peak = 0.0f32;
        for n in 0..(rate as usize) {
            let x = 3.0 * (TAU * 440.0 * n as f32 / rate).sin();
            let y = agc.apply(x);
            if n > (rate as usize) / 2 {
                peak = peak.max(y.abs());
            }
        }
        assert!(agc.distortion() > 0.0);
        assert!(peak <= 1.0 + 1e-4, "output peak {peak} exceeds ceiling");
        assert!(peak > 0.9, "limiter over-compresses: {peak}");
    }

    #[test]
    fn test_distortion_reports_decibels() {
        let mut agc = AutomaticGainControl::new(1.0, 48_000.0);
        agc.apply(2.0);
        assert!((agc.distortion() - 6.0206).abs() < 0.01);
    }

    #[test]
    fn test_release_returns_to_zero_distortion() {
        let rate = 48_000.0;
        let mut agc = AutomaticGainControl::new(1.0, rate);
        agc.apply(4.0);
        assert!(agc.distortion() > 0.0);
        for _ in 0..(rate as usize * 3) {
            agc.apply(0.0);
        }
        assert_eq!(agc.distortion(), 0.0);
    }

    #[test]
    fn test_level_raises_ceiling() {
        let mut agc = AutomaticGainControl::new(2.0, 48_000.0);
        assert_eq!(agc.apply(1.5), 1.5);
        assert_eq!(agc.apply(3.0), 2.0);
        agc.set_level(9.0);
        assert_eq!(agc.level(), AGC_LEVEL_MAX);
    }

    #[test]
    fn test_stereo_shares_envelope() {
        let mut agc = AutomaticGainControl::new(1.0, 48_000.0);
        let (l, r) = agc.apply_stereo(2.0, 0.5);
        assert!((l - 1.0).abs() < 1e-6);
        assert!((r - 0.25).abs() < 1e-6);
    }
}
