//! Control value helpers.

/*
Control Groups
==============

Every continuously variable engine parameter is driven by a "control group":
a slider, an attenuverter and an optional CV input. The host sums them into a
single number before calling an engine setter.

    value = slider + attenu × (cv / 5) × (max − min)

With the attenuverter at 100% a ±5 V CV sweeps the whole slider range, so a
slider parked at its minimum can be pushed all the way to its maximum. The
sum is then clamped to [min, max]; engines clamp again on their side, so a
host that skips this step still can't push a parameter out of its domain.


Gate Debouncing
===============

Power and vent gates are voltages, not booleans. A Schmitt trigger with a
wide hysteresis band turns them into clean on/off states:

    voltage ≥ 1.0   → high
    voltage ≤ 0.1   → low
    in between      → keep previous state

A noisy gate hovering around 0.5 V therefore never chatters.
*/

/// Clamp `value` to `[lo, hi]`, mapping NaN to `lo`.
///
/// Setters use this instead of `f32::clamp` so a stray NaN from a host never
/// reaches engine state.
#[inline]
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    if value >= hi {
        hi
    } else if value >= lo {
        value
    } else {
        lo
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// A slider/attenuverter/CV triple mapped to one bounded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlGroup {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ControlGroup {
    pub const fn new(name: &'static str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name,
            min,
            max,
            default,
        }
    }

    /// Combine slider, attenuverter and an optional CV voltage.
    ///
    /// `attenuverter` is clamped to [-1, 1]. When `cv` is `None` the slider
    /// alone decides.
    pub fn value(&self, slider: f32, attenuverter: f32, cv: Option<f32>) -> f32 {
        let mut value = slider;
        if let Some(cv) = cv {
            let attenu = clamp(attenuverter, -1.0, 1.0);
            value += attenu * (cv / 5.0) * (self.max - self.min);
        }
        clamp(value, self.min, self.max)
    }
}

/// Schmitt-trigger debounce for gate voltages.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateTrigger {
    high: bool,
}

impl GateTrigger {
    pub const HIGH_THRESHOLD: f32 = 1.0;
    pub const LOW_THRESHOLD: f32 = 0.1;

    pub fn new(initial: bool) -> Self {
        Self { high: initial }
    }

    /// Feed one gate voltage and return the debounced state.
    #[inline]
    pub fn update(&mut self, voltage: f32) -> bool {
        if self.high {
            if voltage <= Self::LOW_THRESHOLD {
                self.high = false;
            }
        } else if voltage >= Self::HIGH_THRESHOLD {
            self.high = true;
        }
        self.high
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn set(&mut self, high: bool) {
        self.high = high;
    }
}

/// Lowest AGC ceiling, in normalized units (5 V on a 5 V-per-unit host).
pub const AGC_LEVEL_MIN: f32 = 1.0;
/// Highest AGC ceiling (10 V).
pub const AGC_LEVEL_MAX: f32 = 2.0;
/// Slider end stop; anything above [`AGC_LEVEL_MAX`] means "AGC off".
pub const AGC_DISABLE_MAX: f32 = 2.2;
pub const AGC_LEVEL_DEFAULT: f32 = 1.0;

/// The single "output limiter" slider: a level, or off past the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgcLevelControl {
    slider: f32,
}

impl AgcLevelControl {
    pub fn new(slider: f32) -> Self {
        Self {
            slider: clamp(slider, AGC_LEVEL_MIN, AGC_DISABLE_MAX),
        }
    }

    pub fn slider(&self) -> f32 {
        self.slider
    }

    pub fn is_enabled(&self) -> bool {
        self.slider <= AGC_LEVEL_MAX
    }

    /// The ceiling to program when enabled.
    pub fn level(&self) -> f32 {
        self.slider.min(AGC_LEVEL_MAX)
    }
}

impl Default for AgcLevelControl {
    fn default() -> Self {
        Self::new(AGC_LEVEL_DEFAULT)
    }
}
