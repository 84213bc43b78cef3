use tracing::trace;

/*
Power Slewing
=============

Turning an engine off by simply emitting zeros produces a click: the
waveform jumps from wherever it was to 0.0 in one sample. The slewer
cross-fades between "live engine output" and "silence" with a short linear
ramp instead.

Vocabulary
----------

  ramp length   Number of samples a full fade takes. Derived from the sample
                rate as a fixed fraction of a second (1/400 s = 2.5 ms),
                rounded to the nearest whole sample.

  count         Position within the ramp, 0 ..= ramp length. The gain applied
                to the engine output is count / ramp length.

  ramping       Whether fades happen at all. With ramping off the slewer
                switches instantly but still reports silence transitions.


The State Machine
-----------------

    ┌────────┐  power on   ┌─────────┐  count = N  ┌────────┐
    │ Silent │ ──────────→ │ RampUp  │ ──────────→ │ Active │
    └────────┘             └─────────┘             └────────┘
        ↑                    │     ↑                   │
        │                    │     │ power on          │ power off
        │       power off    ↓     │                   ↓
        │                  ┌──────────┐                │
        └───────────────── │ RampDown │ ←──────────────┘
             count = 0     └──────────┘

Reversing direction mid-ramp continues from the current count, so the gain
trajectory never moves by more than 1/N per sample.

The single sample in which RampDown reaches count = 0 reports
`SlewStatus::Silenced`. That is the caller's cue to reset the engine: audio
already in flight has been faded out, and the next activation will start from
a resting engine. Every later silent sample reports `SlewStatus::Silent`.
*/

/// Fraction of a second used for one full fade.
pub const RAMP_SECONDS: f32 = 1.0 / 400.0;

/// Ramp length in samples for a given sample rate.
pub fn ramp_length_for(sample_rate: f32) -> u32 {
    let samples = (sample_rate * RAMP_SECONDS).round();
    if samples.is_finite() && samples >= 1.0 {
        samples as u32
    } else {
        1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlewState {
    Silent,
    RampUp,
    Active,
    RampDown,
}

/// Result of one [`PowerSlewer::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlewStatus {
    /// Run the engine and pass its output through [`PowerSlewer::process`].
    Audible,
    /// Silence was reached in this sample; quiet the engine now.
    Silenced,
    /// Still silent; nothing to do.
    Silent,
}

#[derive(Debug, Clone)]
pub struct PowerSlewer {
    ramping: bool,
    ramp_length: u32,
    count: u32,
    state: SlewState,
}

impl PowerSlewer {
    pub fn new(ramp_length: u32, active: bool) -> Self {
        let ramp_length = ramp_length.max(1);
        let mut slewer = Self {
            ramping: true,
            ramp_length,
            count: 0,
            state: SlewState::Silent,
        };
        slewer.enable(active);
        slewer
    }

    /// Turn ramping on, starting fully in the given state.
    pub fn enable(&mut self, active: bool) {
        self.ramping = true;
        self.jump_to(active);
    }

    /// Turn ramping off. The slewer starts silent and switches instantly from
    /// now on.
    pub fn reset(&mut self) {
        self.ramping = false;
        self.jump_to(false);
    }

    fn jump_to(&mut self, active: bool) {
        if active {
            self.state = SlewState::Active;
            self.count = self.ramp_length;
        } else {
            self.state = SlewState::Silent;
            self.count = 0;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ramping
    }

    pub fn state(&self) -> SlewState {
        self.state
    }

    pub fn ramp_length(&self) -> u32 {
        self.ramp_length
    }

    /// Current cross-fade weight in [0, 1].
    #[inline]
    pub fn gain(&self) -> f32 {
        self.count as f32 / self.ramp_length as f32
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.set_ramp_length(ramp_length_for(sample_rate));
    }

    /// Change the ramp length, rescaling an in-progress fade so its gain
    /// moves by at most one new step.
    pub fn set_ramp_length(&mut self, ramp_length: u32) {
        let ramp_length = ramp_length.max(1);
        if ramp_length == self.ramp_length {
            return;
        }
        trace!(from = self.ramp_length, to = ramp_length, "slewer ramp length changed");

        let old = self.ramp_length;
        self.ramp_length = ramp_length;
        self.count = match self.state {
            SlewState::Silent => 0,
            SlewState::Active => ramp_length,
            SlewState::RampUp | SlewState::RampDown => {
                let scaled = (self.count as u64 * ramp_length as u64 + old as u64 / 2) / old as u64;
                (scaled as u32).clamp(1, ramp_length)
            }
        };
        if self.state == SlewState::RampUp && self.count == ramp_length {
            self.state = SlewState::Active;
        }
    }

    /// Advance one sample toward the requested power state.
    #[inline]
    pub fn update(&mut self, power_on: bool) -> SlewStatus {
        if !self.ramping {
            return self.update_instant(power_on);
        }

        match (self.state, power_on) {
            (SlewState::Silent, false) => SlewStatus::Silent,
            (SlewState::Active, true) => SlewStatus::Audible,
            (SlewState::Silent, true)
            | (SlewState::RampUp, true)
            | (SlewState::RampDown, true) => {
                self.count += 1;
                self.state = if self.count >= self.ramp_length {
                    self.count = self.ramp_length;
                    SlewState::Active
                } else {
                    SlewState::RampUp
                };
                SlewStatus::Audible
            }
            (SlewState::Active, false)
            | (SlewState::RampUp, false)
            | (SlewState::RampDown, false) => {
                self.count = self.count.saturating_sub(1);
                if self.count == 0 {
                    self.state = SlewState::Silent;
                    SlewStatus::Silenced
                } else {
                    self.state = SlewState::RampDown;
                    SlewStatus::Audible
                }
            }
        }
    }

    fn update_instant(&mut self, power_on: bool) -> SlewStatus {
        match (self.state, power_on) {
            (SlewState::Silent, false) => SlewStatus::Silent,
            (_, true) => {
                self.jump_to(true);
                SlewStatus::Audible
            }
            (_, false) => {
                self.jump_to(false);
                SlewStatus::Silenced
            }
        }
    }

    /// Apply the current fade gain to a block of samples in place.
    #[inline]
    pub fn process(&self, samples: &mut [f32]) {
        if self.count < self.ramp_length {
            let gain = self.gain();
            for sample in samples.iter_mut() {
                *sample *= gain;
            }
        }
    }

    #[inline]
    pub fn process_stereo(&self, left: f32, right: f32) -> (f32, f32) {
        let gain = self.gain();
        (left * gain, right * gain)
    }
}

impl Default for PowerSlewer {
    fn default() -> Self {
        Self::new(ramp_length_for(48_000.0), true)
    }
}
