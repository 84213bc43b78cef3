//! Host-side control groups for the Elastika engine.
//!
//! Each group's `value` result can be passed straight to the matching
//! [`ElastikaEngine`](super::ElastikaEngine) setter, except the output level
//! knob which goes through [`gain_from_level`].

use crate::dsp::control::{clamp, ControlGroup};

pub const FRICTION: ControlGroup = ControlGroup::new("Friction", 0.0, 1.0, 0.5);
pub const STIFFNESS: ControlGroup = ControlGroup::new("Stiffness", 0.0, 1.0, 0.5);
pub const SPAN: ControlGroup = ControlGroup::new("Spring span", 0.0, 1.0, 0.5);
pub const CURL: ControlGroup = ControlGroup::new("Magnetic field", -1.0, 1.0, 0.0);
pub const MASS: ControlGroup = ControlGroup::new("Impurity mass", -1.0, 1.0, 0.0);
pub const INPUT_TILT: ControlGroup = ControlGroup::new("Input tilt angle", 0.0, 1.0, 0.5);
pub const OUTPUT_TILT: ControlGroup = ControlGroup::new("Output tilt angle", 0.0, 1.0, 0.5);

/// Input drive knob, no CV.
pub const DRIVE: ControlGroup = ControlGroup::new("Input drive", 0.0, 2.0, 1.0);
/// Output level knob, no CV. Feed through [`gain_from_level`].
pub const LEVEL: ControlGroup = ControlGroup::new("Output level", 0.0, 2.0, 1.0);

/// Every control group with a slider, attenuverter and CV jack.
pub const SLIDERS: [ControlGroup; 7] = [
    FRICTION,
    STIFFNESS,
    SPAN,
    CURL,
    MASS,
    INPUT_TILT,
    OUTPUT_TILT,
];

/// Output level knob to engine gain. The fourth power gives the knob a
/// roughly logarithmic feel: 1.0 is unity, 2.0 is +24 dB.
#[inline]
pub fn gain_from_level(level: f32) -> f32 {
    let level = clamp(level, LEVEL.min, LEVEL.max);
    let squared = level * level;
    squared * squared
}

/// Inverse of [`gain_from_level`].
pub fn level_from_gain(gain: f32) -> f32 {
    clamp(gain, 0.0, gain_from_level(LEVEL.max)).sqrt().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elastika::ElastikaEngine;

    #[test]
    fn test_level_to_gain() {
        assert_eq!(gain_from_level(0.0), 0.0);
        assert_eq!(gain_from_level(1.0), 1.0);
        assert_eq!(gain_from_level(2.0), 16.0);
        assert_eq!(gain_from_level(5.0), 16.0);
        assert!((level_from_gain(gain_from_level(1.3)) - 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_defaults_match_engine() {
        let engine = ElastikaEngine::default();
        assert_eq!(FRICTION.default, engine.friction());
        assert_eq!(STIFFNESS.default, engine.stiffness());
        assert_eq!(SPAN.default, engine.span());
        assert_eq!(CURL.default, engine.curl());
        assert_eq!(MASS.default, engine.mass());
        assert_eq!(DRIVE.default, engine.drive());
        assert_eq!(gain_from_level(LEVEL.default), engine.gain());
        assert_eq!(INPUT_TILT.default, engine.input_tilt());
        assert_eq!(OUTPUT_TILT.default, engine.output_tilt());
    }

    #[test]
    fn test_cv_sweeps_curl_range() {
        // -5 V at full attenuverter pulls curl from +1 to -1.
        assert_eq!(CURL.value(1.0, 1.0, Some(-5.0)), -1.0);
        assert_eq!(CURL.value(0.0, 0.5, Some(2.5)), 0.5);
    }
}
