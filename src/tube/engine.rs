use std::f32::consts::{PI, TAU};

use num_complex::Complex32;
use tracing::debug;

use crate::dsp::control::{clamp, AGC_LEVEL_DEFAULT};
use crate::dsp::dc_reject::DC_REJECT_DEFAULT_HZ;
use crate::dsp::{AutomaticGainControl, StereoDcReject};
use crate::engine::StereoEngine;
use crate::tube::waveguide::DelayLine;
use crate::{clamp_sample_rate, INPUT_LIMIT, MAX_SAMPLE_RATE};

/*
TubeUnit Engine
===============

A blown tube. Air enters through a spring-loaded valve at one end, travels
down the tube, reflects off the far end and comes back to push on the valve.

                   ┌──────────────── tube (delay line) ────────────────┐
    airflow ──→ valve ──→ s ──→ ········································ ──┐
                  ↑                                                     reflect
                  └──── w = −ρ · e^{iθ} · delayed ←─── ··············· ←──┘

Everything is stereo: left and right ride in the real and imaginary parts of
one complex sample, so the reflection angle θ rotates energy between the two
channels on every round trip.

Per sample
----------

    1. delayed = line.read(D)                D = fs / (2 × root)
    2. θ       = angle + vortex × DEPTH × sin(φ)
       φ      += 2π × (VORTEX_MIN_HZ + vortex × VORTEX_SPAN_HZ) / fs
    3. w       = −ρ × e^{iθ} × delayed       ρ from reflection decay
    4. valve:  y'' = FORCE × (airflow − Re w) − k × STIFFNESS × y − DAMPING × y'
    5. air     = airflow × opening(y) × (1 + TURBULENCE × noise)   (0 if quiet)
    6. s       = air + input + w  →  line.write(s)
    7. β       = 1 / (1 + ((y − center) / (width / 2))²)
       out     = gain × (s + β × input)  →  DC reject  →  AGC

With θ = 0 the inverting reflection makes a round trip of 2D samples, so the
fundamental sits at `root`. Sweeping θ to π removes the inversion and the
pitch rises an octave.

Passivity
---------

ρ never exceeds MAX_REFLECTION < 1, and both the valve position and its
opening are clamped, so the air injected per sample is bounded. The line
therefore stays below |injection| / (1 − ρ) forever; only the dry leak (β)
adds gain, and β ≤ 1.

Spring constant and bypass
--------------------------

Under steady airflow the valve settles at y ≈ FORCE × airflow / (k ×
STIFFNESS). Stiff valves sit near 0, soft ones get pushed out to the
VALVE_LIMIT stop. The bypass window only does something when the valve sits
near `center`, so width and center interact with spring constant and airflow.
*/

pub const AIRFLOW_MAX: f32 = 5.0;
pub const AIRFLOW_DEFAULT: f32 = 1.0;
pub const ROOT_FREQUENCY_MIN: f32 = 4.0;
pub const ROOT_FREQUENCY_MAX: f32 = 1024.0;
pub const ROOT_FREQUENCY_DEFAULT: f32 = 26.5;
pub const REFLECTION_DECAY_DEFAULT: f32 = 0.5;
pub const REFLECTION_ANGLE_DEFAULT: f32 = 0.1 * PI;
pub const SPRING_CONSTANT_MIN: f32 = 0.005;
pub const SPRING_CONSTANT_MAX: f32 = 50.0;
pub const SPRING_CONSTANT_DEFAULT: f32 = 0.5;
pub const BYPASS_WIDTH_MIN: f32 = 0.5;
pub const BYPASS_WIDTH_MAX: f32 = 20.0;
pub const BYPASS_WIDTH_DEFAULT: f32 = 6.0;
pub const BYPASS_CENTER_MIN: f32 = -10.0;
pub const BYPASS_CENTER_MAX: f32 = 10.0;
pub const BYPASS_CENTER_DEFAULT: f32 = 5.0;
pub const VORTEX_DEFAULT: f32 = 0.0;
pub const GAIN_MAX: f32 = 2.0;
pub const GAIN_DEFAULT: f32 = 1.0;

/// Reflection coefficient ceiling.
pub const MAX_REFLECTION: f32 = 0.9995;

/// Longest delay ever needed: lowest root at the highest sample rate.
pub const MAX_DELAY_SAMPLES: usize = (MAX_SAMPLE_RATE / (2.0 * ROOT_FREQUENCY_MIN)) as usize + 1;

const VORTEX_DEPTH: f32 = 0.5;
const VORTEX_MIN_HZ: f32 = 0.2;
const VORTEX_SPAN_HZ: f32 = 6.0;

const VALVE_FORCE: f32 = 2.5e5;
const VALVE_STIFFNESS: f32 = 1.0e5;
const VALVE_DAMPING: f32 = 200.0;
const VALVE_LIMIT: f32 = 20.0;
/// Valve travel over which the air path goes from shut to fully open.
const VALVE_OPEN_SPAN: f32 = 10.0;
const TURBULENCE: f32 = 0.3;
/// Scales injected air so the default patch sits near unity output.
const AIR_SCALE: f32 = 0.02;

const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct TubeUnitEngine {
    airflow: f32,
    root_frequency: f32,
    reflection_decay: f32,
    reflection_angle: f32,
    spring_constant: f32,
    bypass_width: f32,
    bypass_center: f32,
    vortex: f32,
    gain: f32,
    quiet: bool,

    sample_rate: f32,
    delay: f32,
    reflection: f32,
    vortex_phase: f32,
    valve_pos: f32,
    valve_vel: f32,
    seed: u64,
    noise_state: u64,

    line: DelayLine,
    dc_reject: StereoDcReject,
    agc: AutomaticGainControl,
    recoveries: u64,
}

impl TubeUnitEngine {
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, DEFAULT_SEED)
    }

    /// Build an engine whose turbulence noise starts from `seed`.
    ///
    /// Engines with the same seed and settings produce identical output.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        let sample_rate = clamp_sample_rate(sample_rate);
        // xorshift has a fixed point at zero
        let seed = if seed == 0 { DEFAULT_SEED } else { seed };
        Self {
            airflow: AIRFLOW_DEFAULT,
            root_frequency: ROOT_FREQUENCY_DEFAULT,
            reflection_decay: REFLECTION_DECAY_DEFAULT,
            reflection_angle: REFLECTION_ANGLE_DEFAULT,
            spring_constant: SPRING_CONSTANT_DEFAULT,
            bypass_width: BYPASS_WIDTH_DEFAULT,
            bypass_center: BYPASS_CENTER_DEFAULT,
            vortex: VORTEX_DEFAULT,
            gain: GAIN_DEFAULT,
            quiet: false,
            sample_rate,
            delay: delay_for(sample_rate, ROOT_FREQUENCY_DEFAULT),
            reflection: reflection_for(REFLECTION_DECAY_DEFAULT),
            vortex_phase: 0.0,
            valve_pos: 0.0,
            valve_vel: 0.0,
            seed,
            noise_state: seed,
            line: DelayLine::new(MAX_DELAY_SAMPLES),
            dc_reject: StereoDcReject::new(DC_REJECT_DEFAULT_HZ, sample_rate),
            agc: AutomaticGainControl::new(AGC_LEVEL_DEFAULT, sample_rate),
            recoveries: 0,
        }
    }

    /// Restore default parameters and clear all state.
    pub fn initialize(&mut self) {
        self.set_airflow(AIRFLOW_DEFAULT);
        self.set_root_frequency(ROOT_FREQUENCY_DEFAULT);
        self.set_reflection_decay(REFLECTION_DECAY_DEFAULT);
        self.set_reflection_angle(REFLECTION_ANGLE_DEFAULT);
        self.set_spring_constant(SPRING_CONSTANT_DEFAULT);
        self.set_bypass_width(BYPASS_WIDTH_DEFAULT);
        self.set_bypass_center(BYPASS_CENTER_DEFAULT);
        self.set_vortex(VORTEX_DEFAULT);
        self.set_gain(GAIN_DEFAULT);
        self.quiet = false;
        self.agc.set_level(AGC_LEVEL_DEFAULT);
        self.agc.set_enabled(true);
        self.clear();
    }

    /// Empty the tube and bring the valve and vortex to rest.
    pub fn clear(&mut self) {
        self.line.clear();
        self.vortex_phase = 0.0;
        self.valve_pos = 0.0;
        self.valve_vel = 0.0;
        self.noise_state = self.seed;
        self.dc_reject.reset();
        self.agc.reset();
    }

    /// Change sample rate. The tube is cleared since its contents were
    /// recorded at the old rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let sample_rate = clamp_sample_rate(sample_rate);
        if sample_rate != self.sample_rate {
            debug!(from = self.sample_rate, to = sample_rate, "tube unit sample rate changed");
            self.sample_rate = sample_rate;
            self.delay = delay_for(sample_rate, self.root_frequency);
            self.dc_reject.set_sample_rate(sample_rate);
            self.agc.set_sample_rate(sample_rate);
            self.clear();
        }
    }

    pub fn set_airflow(&mut self, airflow: f32) {
        self.airflow = clamp(airflow, 0.0, AIRFLOW_MAX);
    }

    pub fn set_root_frequency(&mut self, hz: f32) {
        let hz = clamp(hz, ROOT_FREQUENCY_MIN, ROOT_FREQUENCY_MAX);
        if hz != self.root_frequency {
            self.root_frequency = hz;
            self.delay = delay_for(self.sample_rate, hz);
        }
    }

    pub fn set_reflection_decay(&mut self, decay: f32) {
        let decay = clamp(decay, 0.0, 1.0);
        if decay != self.reflection_decay {
            self.reflection_decay = decay;
            self.reflection = reflection_for(decay);
        }
    }

    pub fn set_reflection_angle(&mut self, radians: f32) {
        self.reflection_angle = clamp(radians, 0.0, PI);
    }

    pub fn set_spring_constant(&mut self, k: f32) {
        self.spring_constant = clamp(k, SPRING_CONSTANT_MIN, SPRING_CONSTANT_MAX);
    }

    pub fn set_bypass_width(&mut self, width: f32) {
        self.bypass_width = clamp(width, BYPASS_WIDTH_MIN, BYPASS_WIDTH_MAX);
    }

    pub fn set_bypass_center(&mut self, center: f32) {
        self.bypass_center = clamp(center, BYPASS_CENTER_MIN, BYPASS_CENTER_MAX);
    }

    pub fn set_vortex(&mut self, vortex: f32) {
        self.vortex = clamp(vortex, 0.0, 1.0);
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = clamp(gain, 0.0, GAIN_MAX);
    }

    /// Stop (or resume) injecting air. The tube keeps ringing.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    pub fn set_agc_level(&mut self, level: f32) {
        self.agc.set_level(level);
    }

    pub fn set_agc_enabled(&mut self, enabled: bool) {
        self.agc.set_enabled(enabled);
    }

    pub fn set_dc_reject_frequency(&mut self, corner_hz: f32) {
        self.dc_reject.set_corner(corner_hz);
    }

    pub fn airflow(&self) -> f32 {
        self.airflow
    }

    pub fn root_frequency(&self) -> f32 {
        self.root_frequency
    }

    pub fn reflection_decay(&self) -> f32 {
        self.reflection_decay
    }

    pub fn reflection_angle(&self) -> f32 {
        self.reflection_angle
    }

    pub fn spring_constant(&self) -> f32 {
        self.spring_constant
    }

    pub fn bypass_width(&self) -> f32 {
        self.bypass_width
    }

    pub fn bypass_center(&self) -> f32 {
        self.bypass_center
    }

    pub fn vortex(&self) -> f32 {
        self.vortex
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn agc_level(&self) -> f32 {
        self.agc.level()
    }

    pub fn agc_enabled(&self) -> bool {
        self.agc.is_enabled()
    }

    pub fn agc_distortion(&self) -> f32 {
        self.agc.distortion()
    }

    /// Delay line length in samples for the current root and sample rate.
    pub fn delay_samples(&self) -> f32 {
        self.delay
    }

    /// Number of times `process` hit a non-finite value and cleared the tube.
    pub fn recovery_count(&self) -> u64 {
        self.recoveries
    }

    /// xorshift64, mapped to [-1, 1].
    #[inline]
    fn next_noise(&mut self) -> f32 {
        self.noise_state ^= self.noise_state << 13;
        self.noise_state ^= self.noise_state >> 7;
        self.noise_state ^= self.noise_state << 17;
        (self.noise_state as f32) / (u64::MAX as f32) * 2.0 - 1.0
    }

    fn recover(&mut self) -> (f32, f32) {
        self.recoveries += 1;
        self.clear();
        (0.0, 0.0)
    }

    /// Advance the tube one sample.
    #[inline]
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        if !left.is_finite() || !right.is_finite() {
            return self.recover();
        }
        let dt = 1.0 / self.sample_rate;
        let input = Complex32::new(
            clamp(left, -INPUT_LIMIT, INPUT_LIMIT),
            clamp(right, -INPUT_LIMIT, INPUT_LIMIT),
        );

        let delayed = self.line.read(self.delay);

        let theta = self.reflection_angle + self.vortex * VORTEX_DEPTH * self.vortex_phase.sin();
        self.vortex_phase += TAU * (VORTEX_MIN_HZ + self.vortex * VORTEX_SPAN_HZ) * dt;
        if self.vortex_phase >= TAU {
            self.vortex_phase -= TAU;
        }
        let reflected = delayed * Complex32::from_polar(1.0, theta) * -self.reflection;

        let pressure = self.airflow - reflected.re;
        let accel = VALVE_FORCE * pressure
            - self.spring_constant * VALVE_STIFFNESS * self.valve_pos
            - VALVE_DAMPING * self.valve_vel;
        self.valve_vel += accel * dt;
        self.valve_pos += self.valve_vel * dt;
        if self.valve_pos.abs() > VALVE_LIMIT {
            self.valve_pos = VALVE_LIMIT.copysign(self.valve_pos);
            self.valve_vel = 0.0;
        }

        let air = if self.quiet {
            0.0
        } else {
            let opening = clamp(self.valve_pos / VALVE_OPEN_SPAN, 0.0, 1.0);
            let turbulence = 1.0 + TURBULENCE * self.next_noise();
            AIR_SCALE * self.airflow * opening * turbulence
        };

        let sample = Complex32::new(air, 0.0) + input + reflected;
        if !sample.is_finite() || !self.valve_pos.is_finite() {
            return self.recover();
        }
        self.line.write(sample);

        let half_width = 0.5 * self.bypass_width;
        let offset = (self.valve_pos - self.bypass_center) / half_width;
        let bypass = 1.0 / (1.0 + offset * offset);

        let out = (sample + input * bypass) * self.gain;
        let (out_left, out_right) = self.dc_reject.apply(out.re, out.im);
        self.agc.apply_stereo(out_left, out_right)
    }
}

impl Default for TubeUnitEngine {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}

impl StereoEngine for TubeUnitEngine {
    fn set_sample_rate(&mut self, sample_rate: f32) {
        TubeUnitEngine::set_sample_rate(self, sample_rate);
    }

    fn render_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.process(left, right)
    }

    fn quiet(&mut self) {
        self.clear();
    }

    fn agc_distortion(&self) -> f32 {
        self.agc.distortion()
    }
}

#[inline]
fn delay_for(sample_rate: f32, root_frequency: f32) -> f32 {
    sample_rate / (2.0 * root_frequency)
}

/// Reflection coefficient: 0.5 at decay 0, approaching 1 at decay 1.
#[inline]
fn reflection_for(decay: f32) -> f32 {
    (1.0 - 0.5 * 10f32.powf(-3.0 * decay)).min(MAX_REFLECTION)
}
