//! Gated mute channels with click-free switching.

use tracing::debug;

use crate::dsp::control::GateTrigger;
use crate::dsp::slewer::{ramp_length_for, PowerSlewer, SlewStatus};

/*
Mute Bank
=========

Five independent controllers. Each passes a polyphonic block of samples
through when its controller is on and drops it when off:

    gate (optional) ──→ Schmitt trigger ─┐
                                         ├─→ on? ──→ slewer ──→ out
    button ──────────────────────────────┘

A connected gate overrides the button. Switching is instant until
anti-click ramping is turned on for a controller; from then on it fades over
the same 2.5 ms ramp the engines use for power. Ramping is a per-controller
host setting, so it starts off and `initialize` turns it off again.

When a controller is fully off `process` returns false and leaves the block
untouched; the host should emit zero channels (a "ghost" cable) rather than
a block of zeros.
*/

/// Number of mute controllers.
pub const MUTE_CONTROLLERS: usize = 5;

/// Indicator brightness for an off controller; dim, not dark.
pub const INDICATOR_OFF: f32 = 0.03;

#[derive(Debug, Clone)]
struct MuteController {
    gate: GateTrigger,
    slewer: PowerSlewer,
}

#[derive(Debug, Clone)]
pub struct MuteBank {
    controllers: [MuteController; MUTE_CONTROLLERS],
}

impl MuteBank {
    /// All controllers off, with anti-click ramping disabled.
    pub fn new(sample_rate: f32) -> Self {
        let ramp = ramp_length_for(sample_rate);
        let mut bank = Self {
            controllers: std::array::from_fn(|_| MuteController {
                gate: GateTrigger::new(false),
                slewer: PowerSlewer::new(ramp, false),
            }),
        };
        bank.initialize();
        bank
    }

    /// Turn every controller off and disable its anti-click ramping.
    pub fn initialize(&mut self) {
        for controller in &mut self.controllers {
            controller.gate.set(false);
            controller.slewer.reset();
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        debug!(sample_rate, "mute bank sample rate");
        for controller in &mut self.controllers {
            controller.slewer.set_sample_rate(sample_rate);
        }
    }

    /// Run one controller for one sample over a polyphonic block.
    ///
    /// `gate` is the summed gate voltage, or `None` when no gate is
    /// connected and `button` decides. Returns false when the output should
    /// be silent; `samples` is only faded when true is returned.
    #[inline]
    pub fn process(
        &mut self,
        index: usize,
        gate: Option<f32>,
        button: bool,
        samples: &mut [f32],
    ) -> bool {
        let Some(controller) = self.controllers.get_mut(index) else {
            return false;
        };
        let on = match gate {
            Some(voltage) => controller.gate.update(voltage),
            None => {
                controller.gate.set(button);
                button
            }
        };
        match controller.slewer.update(on) {
            SlewStatus::Audible => {
                controller.slewer.process(samples);
                true
            }
            SlewStatus::Silenced | SlewStatus::Silent => false,
        }
    }

    /// Whether the controller is switched on (by gate or button).
    pub fn is_active(&self, index: usize) -> bool {
        self.controllers
            .get(index)
            .is_some_and(|c| c.gate.is_high())
    }

    /// Brightness for the controller's indicator light.
    pub fn indicator(&self, index: usize) -> f32 {
        if self.is_active(index) {
            1.0
        } else {
            INDICATOR_OFF
        }
    }

    pub fn slew_enabled(&self, index: usize) -> bool {
        self.controllers
            .get(index)
            .is_some_and(|c| c.slewer.is_enabled())
    }

    /// Turn anti-click ramping on or off for one controller. The controller
    /// restarts from off either way.
    pub fn set_slew_enabled(&mut self, index: usize, enabled: bool) {
        if let Some(controller) = self.controllers.get_mut(index) {
            if enabled {
                controller.slewer.enable(false);
            } else {
                controller.slewer.reset();
            }
        }
    }

    pub fn slew_flags(&self) -> [bool; MUTE_CONTROLLERS] {
        std::array::from_fn(|i| self.controllers[i].slewer.is_enabled())
    }
}

impl Default for MuteBank {
    fn default() -> Self {
        Self::new(48_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_fades_in_and_out() {
        let mut bank = MuteBank::new(48_000.0);
        bank.set_slew_enabled(0, true);
        let mut block = [1.0f32; 4];
        assert!(!bank.process(0, None, false, &mut block));

        let mut gains = Vec::new();
        for _ in 0..130 {
            let mut block = [1.0f32; 4];
            assert!(bank.process(0, None, true, &mut block));
            assert!(block.iter().all(|&s| s == block[0]));
            gains.push(block[0]);
        }
        assert!((gains[0] - 1.0 / 120.0).abs() < 1e-6);
        assert_eq!(gains[129], 1.0);
        assert!(bank.is_active(0));
        assert_eq!(bank.indicator(0), 1.0);

        let mut audible = 0;
        for _ in 0..200 {
            let mut block = [1.0f32; 4];
            if bank.process(0, None, false, &mut block) {
                audible += 1;
            }
        }
        assert_eq!(audible, 119);
        assert_eq!(bank.indicator(0), INDICATOR_OFF);
    }

    #[test]
    fn test_gate_overrides_button_with_hysteresis() {
        let mut bank = MuteBank::new(48_000.0);
        let mut block = [0.5f32];
        assert!(!bank.process(2, Some(0.5), true, &mut block));
        assert!(bank.process(2, Some(1.0), false, &mut block));
        assert_eq!(block[0], 0.5);
        assert!(bank.process(2, Some(0.5), false, &mut block));
        assert!(!bank.process(2, Some(0.1), true, &mut block));
    }

    #[test]
    fn test_controllers_are_independent() {
        let mut bank = MuteBank::new(48_000.0);
        let mut block = [1.0f32; 2];
        assert!(bank.process(0, None, true, &mut block));
        assert!(bank.is_active(0));
        assert!(!bank.is_active(1));
        assert!(!bank.process(1, None, false, &mut block));
        assert!(!bank.process(MUTE_CONTROLLERS, None, true, &mut block));
    }

    #[test]
    fn test_slew_flags() {
        let mut bank = MuteBank::default();
        assert_eq!(bank.slew_flags(), [false; MUTE_CONTROLLERS]);
        bank.set_slew_enabled(3, true);
        assert!(bank.slew_enabled(3));
        assert_eq!(bank.slew_flags(), [false, false, false, true, false]);
    }

    #[test]
    fn test_initialize_turns_ramping_off() {
        let mut bank = MuteBank::default();
        for index in 0..MUTE_CONTROLLERS {
            bank.set_slew_enabled(index, true);
        }
        let mut block = [1.0f32];
        assert!(bank.process(1, None, true, &mut block));
        assert!(bank.is_active(1));

        bank.initialize();
        assert_eq!(bank.slew_flags(), [false; MUTE_CONTROLLERS]);
        assert!(!bank.is_active(1));

        // Without ramping the next press passes the block at full level.
        let mut block = [0.5f32];
        assert!(bank.process(1, None, true, &mut block));
        assert_eq!(block[0], 0.5);
    }
}
