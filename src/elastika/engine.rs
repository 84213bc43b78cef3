use std::f32::consts::{FRAC_1_SQRT_2, TAU};

use tracing::debug;

use crate::dsp::control::{clamp, lerp, AGC_LEVEL_DEFAULT};
use crate::dsp::dc_reject::DC_REJECT_DEFAULT_HZ;
use crate::dsp::{AutomaticGainControl, StereoDcReject};
use crate::elastika::mesh::{Mesh, MeshPorts, StepParams, SPACING};
use crate::elastika::vector::Vec3;
use crate::engine::StereoEngine;
use crate::{clamp_sample_rate, INPUT_LIMIT};

/*
Elastika Engine
===============

Wraps the spring mesh with everything a host needs: parameter setters, input
injection, output probing, DC rejection and the limiter.

    in L ──→ drive ──→ ┌────────────┐ ──→ pickup L ─→ ┐
                       │    mesh    │                 ├─→ gain → DC → AGC → out
    in R ──→ drive ──→ └────────────┘ ──→ pickup R ─→ ┘

Parameter to physics
--------------------

  friction   [0, 1]   velocity half-life 10^(0.5 − 3f) seconds
                      (3.2 s at 0, 3.2 ms at 1)
  stiffness  [0, 1]   spring natural frequency 20 × 10^(2s) Hz
                      (20 Hz .. 2 kHz)
  span       [0, 1]   rest length = spacing × (1 − (0.1 + 0.6 × span)),
                      i.e. how hard the mesh is stretched
  curl       [−1, 1]  velocity rotation rate curl × 400 Hz about z
  mass       [−1, 1]  impurity ball mass 10^mass (0.1 .. 10)
  drive      [0, 2]   input pre-gain
  gain       [0, 16]  output post-gain
  tilt       [0, 1]   left/right coupling cross-fade, see below

Tilt
----

Each tilt knob fades linearly from left-dominant coupling at 0, through
straight stereo at 0.5, to right-dominant coupling at 1:

    tilt      left port        right port
    0         L                L
    0.25      L                (L + R) / 2
    0.5       L                R
    0.75      (L + R) / 2      R
    1         R                R

Input tilt mixes the incoming channels before they reach the two driven
ports. Output tilt mixes the two pickup readings the same way before they
reach the output channels. The ports mirror each other across the y axis,
so the left port moves along (1, 0, 1)/√2 and the right one along
(−1, 0, 1)/√2, half in the mesh plane and half along its normal.

Stability
---------

The spring constant in per-sample units is κ = (2π f / fs)². The mesh caps
κ / m at KAPPA_LIMIT on each ball separately, so the stiffest mode of the
lattice stays well inside the stable region of the integrator at every
sample rate. A light impurity only slows its own balls; every other spring
keeps its full stiffness. At low sample rates and high stiffness the cap
lowers the effective pitch; nothing else changes.

Coefficients are recomputed only when a setter changed something or the
sample rate moved. Setters compare before writing, so calling them every
sample with the same value is free.
*/

pub const FRICTION_DEFAULT: f32 = 0.5;
pub const STIFFNESS_DEFAULT: f32 = 0.5;
pub const SPAN_DEFAULT: f32 = 0.5;
pub const CURL_DEFAULT: f32 = 0.0;
pub const MASS_DEFAULT: f32 = 0.0;
pub const DRIVE_DEFAULT: f32 = 1.0;
pub const DRIVE_MAX: f32 = 2.0;
pub const GAIN_DEFAULT: f32 = 1.0;
pub const GAIN_MAX: f32 = 16.0;
pub const TILT_DEFAULT: f32 = 0.5;

/// Highest curl rotation rate, in Hz.
pub const CURL_MAX_HZ: f32 = 400.0;
/// Stability cap on κ / m.
pub const KAPPA_LIMIT: f32 = 0.3;

/// Port displacement per unit of driven input.
const INPUT_DISPLACEMENT: f32 = 0.05;
/// Output level per unit of pickup displacement.
const OUTPUT_SCALE: f32 = 20.0;

pub struct ElastikaEngine {
    mesh: Mesh,
    ports: MeshPorts,

    friction: f32,
    stiffness: f32,
    span: f32,
    curl: f32,
    mass: f32,
    drive: f32,
    gain: f32,
    input_tilt: f32,
    output_tilt: f32,

    sample_rate: f32,
    dirty: bool,
    step: StepParams,
    port_dirs: (Vec3, Vec3),

    dc_reject: StereoDcReject,
    agc: AutomaticGainControl,
    recoveries: u64,
}

impl ElastikaEngine {
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = clamp_sample_rate(sample_rate);
        let mesh = Mesh::hexagon();
        let ports = mesh.ports();
        let mut engine = Self {
            mesh,
            ports,
            friction: FRICTION_DEFAULT,
            stiffness: STIFFNESS_DEFAULT,
            span: SPAN_DEFAULT,
            curl: CURL_DEFAULT,
            mass: MASS_DEFAULT,
            drive: DRIVE_DEFAULT,
            gain: GAIN_DEFAULT,
            input_tilt: TILT_DEFAULT,
            output_tilt: TILT_DEFAULT,
            sample_rate,
            dirty: true,
            step: StepParams {
                kappa: 0.0,
                kappa_limit: KAPPA_LIMIT,
                rest_length: SPACING,
                damping: 1.0,
                curl_cos: 1.0,
                curl_sin: 0.0,
            },
            port_dirs: (
                Vec3::new(FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
                Vec3::new(-FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
            ),
            dc_reject: StereoDcReject::new(DC_REJECT_DEFAULT_HZ, sample_rate),
            agc: AutomaticGainControl::new(AGC_LEVEL_DEFAULT, sample_rate),
            recoveries: 0,
        };
        engine.update_coefficients();
        engine
    }

    /// Restore every parameter to its default and put the mesh at rest.
    pub fn initialize(&mut self) {
        self.friction = FRICTION_DEFAULT;
        self.stiffness = STIFFNESS_DEFAULT;
        self.span = SPAN_DEFAULT;
        self.curl = CURL_DEFAULT;
        self.mass = MASS_DEFAULT;
        self.drive = DRIVE_DEFAULT;
        self.gain = GAIN_DEFAULT;
        self.input_tilt = TILT_DEFAULT;
        self.output_tilt = TILT_DEFAULT;
        self.dc_reject.set_corner(DC_REJECT_DEFAULT_HZ);
        self.agc.set_level(AGC_LEVEL_DEFAULT);
        self.agc.set_enabled(true);
        self.dirty = true;
        self.quiet();
    }

    /// Put the mesh at rest without touching parameters.
    pub fn quiet(&mut self) {
        self.mesh.reset();
        self.dc_reject.reset();
        self.agc.reset();
    }

    pub fn set_friction(&mut self, friction: f32) {
        update(&mut self.friction, clamp(friction, 0.0, 1.0), &mut self.dirty);
    }

    pub fn set_stiffness(&mut self, stiffness: f32) {
        update(&mut self.stiffness, clamp(stiffness, 0.0, 1.0), &mut self.dirty);
    }

    pub fn set_span(&mut self, span: f32) {
        update(&mut self.span, clamp(span, 0.0, 1.0), &mut self.dirty);
    }

    pub fn set_curl(&mut self, curl: f32) {
        update(&mut self.curl, clamp(curl, -1.0, 1.0), &mut self.dirty);
    }

    pub fn set_mass(&mut self, mass: f32) {
        update(&mut self.mass, clamp(mass, -1.0, 1.0), &mut self.dirty);
    }

    pub fn set_drive(&mut self, drive: f32) {
        self.drive = clamp(drive, 0.0, DRIVE_MAX);
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = clamp(gain, 0.0, GAIN_MAX);
    }

    pub fn set_input_tilt(&mut self, tilt: f32) {
        self.input_tilt = clamp(tilt, 0.0, 1.0);
    }

    pub fn set_output_tilt(&mut self, tilt: f32) {
        self.output_tilt = clamp(tilt, 0.0, 1.0);
    }

    pub fn set_dc_reject_frequency(&mut self, corner_hz: f32) {
        self.dc_reject.set_corner(corner_hz);
    }

    pub fn set_agc_level(&mut self, level: f32) {
        self.agc.set_level(level);
    }

    pub fn set_agc_enabled(&mut self, enabled: bool) {
        self.agc.set_enabled(enabled);
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    pub fn stiffness(&self) -> f32 {
        self.stiffness
    }

    pub fn span(&self) -> f32 {
        self.span
    }

    pub fn curl(&self) -> f32 {
        self.curl
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn input_tilt(&self) -> f32 {
        self.input_tilt
    }

    pub fn output_tilt(&self) -> f32 {
        self.output_tilt
    }

    pub fn dc_reject_frequency(&self) -> f32 {
        self.dc_reject.corner()
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

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.mesh.kinetic_energy()
    }

    /// Number of times `process` hit a non-finite value and reset the mesh.
    pub fn recovery_count(&self) -> u64 {
        self.recoveries
    }

    fn update_sample_rate(&mut self, sample_rate: f32) {
        let sample_rate = clamp_sample_rate(sample_rate);
        if sample_rate != self.sample_rate {
            debug!(from = self.sample_rate, to = sample_rate, "elastika sample rate changed");
            self.sample_rate = sample_rate;
            self.dc_reject.set_sample_rate(sample_rate);
            self.agc.set_sample_rate(sample_rate);
            self.dirty = true;
        }
    }

    fn update_coefficients(&mut self) {
        let fs = self.sample_rate;
        let impurity_mass = 10f32.powf(self.mass);
        self.mesh.set_impurity_mass(impurity_mass);

        let spring_hz = 20.0 * 10f32.powf(2.0 * self.stiffness);
        let omega = TAU * spring_hz / fs;
        let kappa = (omega * omega).min(KAPPA_LIMIT);

        let half_life = 10f32.powf(0.5 - 3.0 * self.friction);
        let damping = 0.5f32.powf(1.0 / (half_life * fs));

        let curl_angle = self.curl * TAU * CURL_MAX_HZ / fs;

        self.step = StepParams {
            kappa,
            kappa_limit: KAPPA_LIMIT,
            rest_length: SPACING * (1.0 - (0.1 + 0.6 * self.span)),
            damping,
            curl_cos: curl_angle.cos(),
            curl_sin: curl_angle.sin(),
        };
        self.dirty = false;
    }

    fn recover(&mut self) -> (f32, f32) {
        self.recoveries += 1;
        self.quiet();
        (0.0, 0.0)
    }

    /// Advance the mesh one sample.
    #[inline]
    pub fn process(&mut self, sample_rate: f32, left: f32, right: f32) -> (f32, f32) {
        self.update_sample_rate(sample_rate);
        if self.dirty {
            self.update_coefficients();
        }
        if !left.is_finite() || !right.is_finite() {
            return self.recover();
        }

        let push = self.drive * INPUT_DISPLACEMENT;
        let left = clamp(left, -INPUT_LIMIT, INPUT_LIMIT) * push;
        let right = clamp(right, -INPUT_LIMIT, INPUT_LIMIT) * push;
        let (left, right) = tilt_mix(self.input_tilt, left, right);
        self.mesh.drive(self.ports.input_left, self.port_dirs.0 * left);
        self.mesh.drive(self.ports.input_right, self.port_dirs.1 * right);

        if !self.mesh.step(&self.step).is_finite() {
            return self.recover();
        }

        let scale = OUTPUT_SCALE * self.gain;
        let pickup_left = self.mesh.displacement(self.ports.output_left).dot(self.port_dirs.0);
        let pickup_right = self.mesh.displacement(self.ports.output_right).dot(self.port_dirs.1);
        let (out_left, out_right) = tilt_mix(self.output_tilt, pickup_left, pickup_right);
        let (out_left, out_right) = (out_left * scale, out_right * scale);

        let (out_left, out_right) = self.dc_reject.apply(out_left, out_right);
        let (out_left, out_right) = self.agc.apply_stereo(out_left, out_right);
        if !out_left.is_finite() || !out_right.is_finite() {
            return self.recover();
        }
        (out_left, out_right)
    }
}

impl Default for ElastikaEngine {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}

/// Elastika keeps the sample rate it was last given.
impl StereoEngine for ElastikaEngine {
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.update_sample_rate(sample_rate);
    }

    fn render_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.process(self.sample_rate, left, right)
    }

    fn quiet(&mut self) {
        ElastikaEngine::quiet(self);
    }

    fn agc_distortion(&self) -> f32 {
        self.agc.distortion()
    }
}

#[inline]
fn update(slot: &mut f32, value: f32, dirty: &mut bool) {
    if *slot != value {
        *slot = value;
        *dirty = true;
    }
}

/// Cross-fade a stereo pair from (L, L) at tilt 0 through (L, R) at 0.5 to
/// (R, R) at 1.
#[inline]
fn tilt_mix(tilt: f32, left: f32, right: f32) -> (f32, f32) {
    let t = 2.0 * tilt;
    if t <= 1.0 {
        (left, lerp(left, right, t))
    } else {
        (lerp(left, right, t - 1.0), right)
    }
}
