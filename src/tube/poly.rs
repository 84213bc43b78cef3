use tracing::debug;

use crate::dsp::control::{AgcLevelControl, GateTrigger};
use crate::tube::TubeUnitEngine;
use crate::MAX_CHANNELS;

/*
Polyphonic Bank
===============

One TubeUnit engine per channel, sixteen in all, allocated up front. The
channels never share mutable state: every engine owns its tube, valve,
vortex, noise generator, DC filter and limiter.

Which channels are active is the host's business (usually the widest
connected input). The bank only needs to be told how many when it
aggregates something across channels, like the limiter warning.

Inputs narrower than the active channel count are "normalled": channel c
reuses the last value the input supplied.

    left input: 3 channels       active: 5
    channel:    0    1    2    3    4
    left in:    a    b    c    c    c
*/

pub struct TubeBank {
    engines: [TubeUnitEngine; MAX_CHANNELS],
}

impl TubeBank {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            engines: std::array::from_fn(|c| {
                TubeUnitEngine::with_seed(sample_rate, Self::channel_seed(c))
            }),
        }
    }

    /// Noise seed used for a channel, so channels never hiss in unison.
    pub fn channel_seed(channel: usize) -> u64 {
        0xA076_1D64_78BD_642F ^ ((channel as u64 + 1) << 32)
    }

    pub fn channel(&self, channel: usize) -> Option<&TubeUnitEngine> {
        self.engines.get(channel)
    }

    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut TubeUnitEngine> {
        self.engines.get_mut(channel)
    }

    pub fn engines_mut(&mut self) -> &mut [TubeUnitEngine] {
        &mut self.engines
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        debug!(sample_rate, "tube bank sample rate");
        for engine in &mut self.engines {
            engine.set_sample_rate(sample_rate);
        }
    }

    pub fn set_agc_level(&mut self, level: f32) {
        for engine in &mut self.engines {
            engine.set_agc_level(level);
        }
    }

    pub fn set_agc_enabled(&mut self, enabled: bool) {
        for engine in &mut self.engines {
            engine.set_agc_enabled(enabled);
        }
    }

    /// Program every limiter from the single level/off slider.
    pub fn set_agc(&mut self, control: AgcLevelControl) {
        let enabled = control.is_enabled();
        for engine in &mut self.engines {
            if enabled {
                engine.set_agc_level(control.level());
            }
            engine.set_agc_enabled(enabled);
        }
    }

    pub fn set_dc_reject_frequency(&mut self, corner_hz: f32) {
        for engine in &mut self.engines {
            engine.set_dc_reject_frequency(corner_hz);
        }
    }

    /// Restore defaults on every channel.
    pub fn initialize(&mut self) {
        for engine in &mut self.engines {
            engine.initialize();
        }
    }

    /// Advance one channel one sample. Out-of-range channels are silent.
    #[inline]
    pub fn process(&mut self, channel: usize, left: f32, right: f32) -> (f32, f32) {
        match self.engines.get_mut(channel) {
            Some(engine) => engine.process(left, right),
            None => (0.0, 0.0),
        }
    }

    /// Advance the first `active` channels one sample, normalling narrow
    /// inputs. Output slices must hold at least `active` samples.
    pub fn process_frame(
        &mut self,
        active: usize,
        left_in: &[f32],
        right_in: &[f32],
        left_out: &mut [f32],
        right_out: &mut [f32],
    ) {
        let active = active.min(MAX_CHANNELS).min(left_out.len()).min(right_out.len());
        let mut left = 0.0;
        let mut right = 0.0;
        for c in 0..active {
            if let Some(&l) = left_in.get(c) {
                left = l;
            }
            if let Some(&r) = right_in.get(c) {
                right = r;
            }
            let (l, r) = self.engines[c].process(left, right);
            left_out[c] = l;
            right_out[c] = r;
        }
    }

    /// Update one channel's quiet flag from the vent gate and return it.
    ///
    /// `gate` holds one voltage per gate channel. Channels the gate does not
    /// reach copy the last gate channel; with no gate at all, a channel is
    /// quiet exactly when the vent is inverted (a "seal" port).
    pub fn vent_quiet(&mut self, channel: usize, gate: &[f32], inverted: bool) -> bool {
        if channel >= MAX_CHANNELS {
            return inverted;
        }
        let quiet = match gate.get(channel) {
            Some(&voltage) => {
                if voltage >= GateTrigger::HIGH_THRESHOLD {
                    !inverted
                } else if voltage < GateTrigger::LOW_THRESHOLD {
                    inverted
                } else {
                    self.engines[channel].is_quiet()
                }
            }
            None if !gate.is_empty() => {
                let last = (gate.len() - 1).min(MAX_CHANNELS - 1);
                self.engines[last].is_quiet()
            }
            None => inverted,
        };
        self.engines[channel].set_quiet(quiet);
        quiet
    }

    /// Largest limiter compression among the first `active` channels, in dB.
    pub fn max_agc_distortion(&self, active: usize) -> f32 {
        self.engines
            .iter()
            .take(active)
            .map(TubeUnitEngine::agc_distortion)
            .fold(0.0, f32::max)
    }
}

impl Default for TubeBank {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}
