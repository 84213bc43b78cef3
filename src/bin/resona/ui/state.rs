//! Shared state types for UI communication
//!
//! Designed for real-time safety: the parameter table is built once before
//! the stream starts, and everything crossing the ring buffers is `Copy`.

use resona_dsp::dsp::ControlGroup;
use resona_dsp::elastika::controls as elastika;
use resona_dsp::tube::controls::{self as tube, TubeControl};

/// Which resonator the demo drives
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    Elastika,
    Tube,
}

impl EngineKind {
    /// Parse the first command line argument
    pub fn from_arg(arg: Option<&str>) -> Option<Self> {
        match arg.map(str::to_ascii_lowercase).as_deref() {
            None | Some("elastika") => Some(EngineKind::Elastika),
            Some("tube") | Some("tubeunit") => Some(EngineKind::Tube),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EngineKind::Elastika => "Elastika",
            EngineKind::Tube => "Tube Unit",
        }
    }

    /// Control groups shown in the parameter list, in display order.
    ///
    /// The index into this list is what `ControlMessage::SetParam` carries.
    pub fn params(self) -> Vec<ControlGroup> {
        match self {
            EngineKind::Elastika => {
                let mut params = elastika::SLIDERS.to_vec();
                params.push(elastika::DRIVE);
                params.push(elastika::LEVEL);
                params
            }
            EngineKind::Tube => {
                let mut params: Vec<ControlGroup> =
                    TubeControl::ALL.iter().map(|c| c.group()).collect();
                params.push(tube::LEVEL);
                params
            }
        }
    }
}

/// Commands sent from UI thread to audio thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    /// Set parameter `index` (into `EngineKind::params`) to a slider value
    SetParam { index: usize, value: f32 },
    /// Flip the power switch
    TogglePower,
    /// Flip the output limiter
    ToggleAgc,
    /// Return the resonator to rest
    Quiet,
}

/// Dynamic state update sent from audio thread (allocation-free, Copy)
#[derive(Clone, Copy, Debug)]
pub struct StatusUpdate {
    /// Requested power state
    pub power_on: bool,
    /// False once the power-off fade has finished
    pub running: bool,
    pub agc_enabled: bool,
    /// Limiter compression in dB
    pub agc_distortion: f32,
    /// Non-finite recoveries since start
    pub recoveries: u64,
    /// Peak output level since the previous update
    pub peak: f32,
}

impl StatusUpdate {
    pub fn new() -> Self {
        Self {
            power_on: true,
            running: true,
            agc_enabled: true,
            agc_distortion: 0.0,
            recoveries: 0,
            peak: 0.0,
        }
    }
}

/// Parameter list as seen by the UI
pub struct ParamList {
    pub groups: Vec<ControlGroup>,
    pub values: Vec<f32>,
    pub selected: usize,
}

/// Fraction of a parameter's range moved by one key press
const ADJUST_STEPS: f32 = 50.0;

impl ParamList {
    pub fn new(groups: Vec<ControlGroup>) -> Self {
        let values = groups.iter().map(|g| g.default).collect();
        Self {
            groups,
            values,
            selected: 0,
        }
    }

    pub fn select_next(&mut self) {
        if !self.groups.is_empty() {
            self.selected = (self.selected + 1) % self.groups.len();
        }
    }

    pub fn select_prev(&mut self) {
        if !self.groups.is_empty() {
            self.selected = (self.selected + self.groups.len() - 1) % self.groups.len();
        }
    }

    /// Move the selected parameter by `steps` key presses and return the
    /// message to send, if any.
    pub fn adjust(&mut self, steps: f32) -> Option<ControlMessage> {
        let group = self.groups.get(self.selected)?;
        let step = (group.max - group.min) / ADJUST_STEPS;
        let value = (self.values[self.selected] + steps * step).clamp(group.min, group.max);
        self.values[self.selected] = value;
        Some(ControlMessage::SetParam {
            index: self.selected,
            value,
        })
    }

    /// Put the selected parameter back to its default.
    pub fn reset_selected(&mut self) -> Option<ControlMessage> {
        let group = self.groups.get(self.selected)?;
        self.values[self.selected] = group.default;
        Some(ControlMessage::SetParam {
            index: self.selected,
            value: group.default,
        })
    }
}
