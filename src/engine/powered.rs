use crate::dsp::slewer::{ramp_length_for, PowerSlewer, SlewState, SlewStatus};
use crate::engine::StereoEngine;

/// An engine behind a power switch.
///
/// While powered off the engine is not run at all, which saves CPU. Power
/// transitions fade through a [`PowerSlewer`]; the engine is quieted once, in
/// the sample where the fade-out completes.
pub struct Powered<E: StereoEngine> {
    engine: E,
    slewer: PowerSlewer,
    quiet_events: u64,
}

impl<E: StereoEngine> Powered<E> {
    /// Wrap `engine`, starting powered on.
    pub fn new(mut engine: E, sample_rate: f32) -> Self {
        engine.set_sample_rate(sample_rate);
        Self {
            engine,
            slewer: PowerSlewer::new(ramp_length_for(sample_rate), true),
            quiet_events: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_inner(self) -> E {
        self.engine
    }

    pub fn slewer(&self) -> &PowerSlewer {
        &self.slewer
    }

    pub fn slewer_mut(&mut self) -> &mut PowerSlewer {
        &mut self.slewer
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.engine.set_sample_rate(sample_rate);
        self.slewer.set_sample_rate(sample_rate);
    }

    /// True unless fully silent.
    pub fn is_running(&self) -> bool {
        self.slewer.state() != SlewState::Silent
    }

    /// How many times the engine has been quieted by power-off.
    pub fn quiet_events(&self) -> u64 {
        self.quiet_events
    }

    /// Advance one sample with the requested power state.
    #[inline]
    pub fn process(&mut self, power_on: bool, left: f32, right: f32) -> (f32, f32) {
        match self.slewer.update(power_on) {
            SlewStatus::Audible => {
                let (l, r) = self.engine.render_frame(left, right);
                self.slewer.process_stereo(l, r)
            }
            SlewStatus::Silenced => {
                self.engine.quiet();
                self.quiet_events += 1;
                (0.0, 0.0)
            }
            SlewStatus::Silent => (0.0, 0.0),
        }
    }
}
