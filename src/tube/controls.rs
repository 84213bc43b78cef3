//! Host-side control groups for the TubeUnit engine.
//!
//! Slider values are not always engine values: root frequency is in octaves
//! above 4 Hz, reflection angle in half turns, and stiffness in decades.
//! [`TubeControl::engine_value`] does the conversion.

use std::f32::consts::PI;

use crate::dsp::control::ControlGroup;
use crate::tube::TubeUnitEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TubeControl {
    Airflow,
    RootFrequency,
    ReflectionDecay,
    ReflectionAngle,
    Stiffness,
    BypassWidth,
    BypassCenter,
    Vortex,
}

impl TubeControl {
    pub const ALL: [TubeControl; 8] = [
        TubeControl::Airflow,
        TubeControl::RootFrequency,
        TubeControl::ReflectionDecay,
        TubeControl::ReflectionAngle,
        TubeControl::Stiffness,
        TubeControl::BypassWidth,
        TubeControl::BypassCenter,
        TubeControl::Vortex,
    ];

    pub const fn group(self) -> ControlGroup {
        match self {
            TubeControl::Airflow => ControlGroup::new("Airflow", 0.0, 5.0, 1.0),
            TubeControl::RootFrequency => {
                ControlGroup::new("Root frequency", 0.0, 8.0, 2.727_924_8)
            }
            TubeControl::ReflectionDecay => ControlGroup::new("Reflection decay", 0.0, 1.0, 0.5),
            TubeControl::ReflectionAngle => ControlGroup::new("Reflection angle", 0.0, 1.0, 0.1),
            TubeControl::Stiffness => ControlGroup::new("Stiffness", 0.0, 1.0, 0.5),
            TubeControl::BypassWidth => ControlGroup::new("Bypass width", 0.5, 20.0, 6.0),
            TubeControl::BypassCenter => ControlGroup::new("Bypass center", -10.0, 10.0, 5.0),
            TubeControl::Vortex => ControlGroup::new("Vortex", 0.0, 1.0, 0.0),
        }
    }

    /// Convert a (clamped) control value to the engine's unit.
    pub fn engine_value(self, control: f32) -> f32 {
        match self {
            TubeControl::RootFrequency => 4.0 * 2f32.powf(control),
            TubeControl::ReflectionAngle => PI * control,
            TubeControl::Stiffness => 0.005 * 10f32.powf(4.0 * control),
            _ => control,
        }
    }

    /// Combine slider, attenuverter and CV, then program `engine`.
    pub fn apply(
        self,
        engine: &mut TubeUnitEngine,
        slider: f32,
        attenuverter: f32,
        cv: Option<f32>,
    ) {
        let value = self.engine_value(self.group().value(slider, attenuverter, cv));
        match self {
            TubeControl::Airflow => engine.set_airflow(value),
            TubeControl::RootFrequency => engine.set_root_frequency(value),
            TubeControl::ReflectionDecay => engine.set_reflection_decay(value),
            TubeControl::ReflectionAngle => engine.set_reflection_angle(value),
            TubeControl::Stiffness => engine.set_spring_constant(value),
            TubeControl::BypassWidth => engine.set_bypass_width(value),
            TubeControl::BypassCenter => engine.set_bypass_center(value),
            TubeControl::Vortex => engine.set_vortex(value),
        }
    }
}

/// Output level knob, no CV; passed to `set_gain` unchanged.
pub const LEVEL: ControlGroup = ControlGroup::new("Output level", 0.0, 2.0, 1.0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_defaults_map_to_engine_defaults() {
        let engine = TubeUnitEngine::default();
        let defaults: Vec<f32> = TubeControl::ALL
            .iter()
            .map(|c| c.engine_value(c.group().default))
            .collect();
        let expected = [
            engine.airflow(),
            engine.root_frequency(),
            engine.reflection_decay(),
            engine.reflection_angle(),
            engine.spring_constant(),
            engine.bypass_width(),
            engine.bypass_center(),
            engine.vortex(),
        ];
        for (got, want) in defaults.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-3 * want.abs().max(1.0), "{got} vs {want}");
        }
    }

    #[test]
    fn test_root_frequency_octaves() {
        let c = TubeControl::RootFrequency;
        assert_eq!(c.engine_value(0.0), 4.0);
        assert!((c.engine_value(8.0) - 1024.0).abs() < 1e-2);
        assert!((c.engine_value(c.group().value(0.0, 1.0, Some(5.0))) - 1024.0).abs() < 1e-2);
    }

    #[test]
    fn test_apply_programs_engine() {
        let mut engine = TubeUnitEngine::default();
        TubeControl::Stiffness.apply(&mut engine, 1.0, 0.0, None);
        assert!((engine.spring_constant() - 50.0).abs() < 1e-3);
        TubeControl::ReflectionAngle.apply(&mut engine, 0.0, 1.0, Some(10.0));
        assert_eq!(engine.reflection_angle(), PI);
        TubeControl::Airflow.apply(&mut engine, 3.0, 0.0, None);
        assert_eq!(engine.airflow(), 3.0);
    }
}
