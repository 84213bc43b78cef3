//! Resona - audio setup and the realtime render loop

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use tracing::{error, info};

use resona_dsp::elastika::{controls as elastika_controls, ElastikaEngine};
use resona_dsp::engine::Powered;
use resona_dsp::tube::controls::TubeControl;
use resona_dsp::tube::TubeUnitEngine;

use super::ui::state::{ControlMessage, EngineKind, StatusUpdate};
use super::ui::UiApp;

/// Ring capacity for UI -> audio control messages
const CONTROL_CAPACITY: usize = 256;
/// Ring capacity for audio -> UI scope samples
const SCOPE_CAPACITY: usize = 16_384;
/// Ring capacity for status snapshots
const STATUS_CAPACITY: usize = 16;
/// Status snapshots are sent this many times per second
const STATUS_RATE_HZ: f32 = 30.0;
/// Output trim before the device
const MASTER_GAIN: f32 = 0.5;

/// Main application builder
pub struct Resona {
    kind: EngineKind,
}

impl Resona {
    pub fn new(kind: EngineKind) -> Self {
        Self { kind }
    }

    /// Run the application: opens the audio device, then hands the terminal
    /// to the UI until the user quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        info!(engine = self.kind.title(), sample_rate, channels, "starting audio");

        let (control_tx, control_rx) = RingBuffer::<ControlMessage>::new(CONTROL_CAPACITY);
        let (scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_CAPACITY);
        let (status_tx, status_rx) = RingBuffer::<StatusUpdate>::new(STATUS_CAPACITY);

        let mut audio = AudioState::new(self.kind, sample_rate, control_rx, scope_tx, status_tx);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| audio.render(data, channels),
                |err| error!(%err, "audio stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;
        stream.play().wrap_err("failed to start output stream")?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(self.kind, sample_rate, control_tx, scope_rx, status_rx)
            .run(&mut terminal);
        ratatui::restore();

        drop(stream);
        info!("audio stopped");
        result
    }
}

/// The engine behind the power switch
enum Voice {
    Elastika(Powered<ElastikaEngine>),
    Tube(Powered<TubeUnitEngine>),
}

impl Voice {
    fn new(kind: EngineKind, sample_rate: f32) -> Self {
        match kind {
            EngineKind::Elastika => {
                Voice::Elastika(Powered::new(ElastikaEngine::new(sample_rate), sample_rate))
            }
            EngineKind::Tube => {
                Voice::Tube(Powered::new(TubeUnitEngine::new(sample_rate), sample_rate))
            }
        }
    }

    /// Apply a slider value for parameter `index` of `EngineKind::params`.
    fn set_param(&mut self, index: usize, value: f32) {
        match self {
            Voice::Elastika(powered) => {
                let engine = powered.engine_mut();
                match index {
                    0 => engine.set_friction(value),
                    1 => engine.set_stiffness(value),
                    2 => engine.set_span(value),
                    3 => engine.set_curl(value),
                    4 => engine.set_mass(value),
                    5 => engine.set_input_tilt(value),
                    6 => engine.set_output_tilt(value),
                    7 => engine.set_drive(value),
                    8 => engine.set_gain(elastika_controls::gain_from_level(value)),
                    _ => {}
                }
            }
            Voice::Tube(powered) => {
                let engine = powered.engine_mut();
                match TubeControl::ALL.get(index) {
                    Some(control) => control.apply(engine, value, 0.0, None),
                    None => engine.set_gain(value),
                }
            }
        }
    }

    fn toggle_agc(&mut self) {
        match self {
            Voice::Elastika(powered) => {
                let enabled = powered.engine().agc_enabled();
                powered.engine_mut().set_agc_enabled(!enabled);
            }
            Voice::Tube(powered) => {
                let enabled = powered.engine().agc_enabled();
                powered.engine_mut().set_agc_enabled(!enabled);
            }
        }
    }

    fn quiet(&mut self) {
        match self {
            Voice::Elastika(powered) => powered.engine_mut().quiet(),
            Voice::Tube(powered) => powered.engine_mut().clear(),
        }
    }

    #[inline]
    fn process(&mut self, power_on: bool, left: f32, right: f32) -> (f32, f32) {
        match self {
            Voice::Elastika(powered) => powered.process(power_on, left, right),
            Voice::Tube(powered) => powered.process(power_on, left, right),
        }
    }

    fn status(&self, power_on: bool, peak: f32) -> StatusUpdate {
        let (running, agc_enabled, recoveries) = match self {
            Voice::Elastika(p) => {
                (p.is_running(), p.engine().agc_enabled(), p.engine().recovery_count())
            }
            Voice::Tube(p) => {
                (p.is_running(), p.engine().agc_enabled(), p.engine().recovery_count())
            }
        };
        let agc_distortion = match self {
            Voice::Elastika(p) => p.engine().agc_distortion(),
            Voice::Tube(p) => p.engine().agc_distortion(),
        };
        StatusUpdate {
            power_on,
            running,
            agc_enabled,
            agc_distortion,
            recoveries,
            peak,
        }
    }
}

/// Periodic decaying bursts, so a mesh with no audio input has something
/// to ring with.
struct ClickTrain {
    period: usize,
    position: usize,
    level: f32,
    decay: f32,
}

impl ClickTrain {
    const INTERVAL_SECONDS: f32 = 0.75;
    const DECAY_SECONDS: f32 = 0.004;

    fn new(sample_rate: f32) -> Self {
        Self {
            period: (sample_rate * Self::INTERVAL_SECONDS) as usize,
            position: 0,
            level: 0.0,
            decay: (-1.0 / (sample_rate * Self::DECAY_SECONDS)).exp(),
        }
    }

    #[inline]
    fn next_sample(&mut self) -> f32 {
        if self.position == 0 {
            self.level = 1.0;
        }
        self.position = (self.position + 1) % self.period.max(1);
        let out = self.level;
        self.level *= self.decay;
        out
    }
}

/// Everything the audio callback owns
struct AudioState {
    voice: Voice,
    clicks: Option<ClickTrain>,
    power_on: bool,
    control_rx: Consumer<ControlMessage>,
    scope_tx: Producer<f32>,
    status_tx: Producer<StatusUpdate>,
    status_interval: usize,
    frames_since_status: usize,
    peak: f32,
}

impl AudioState {
    fn new(
        kind: EngineKind,
        sample_rate: f32,
        control_rx: Consumer<ControlMessage>,
        scope_tx: Producer<f32>,
        status_tx: Producer<StatusUpdate>,
    ) -> Self {
        let clicks = match kind {
            EngineKind::Elastika => Some(ClickTrain::new(sample_rate)),
            EngineKind::Tube => None,
        };
        Self {
            voice: Voice::new(kind, sample_rate),
            clicks,
            power_on: true,
            control_rx,
            scope_tx,
            status_tx,
            status_interval: (sample_rate / STATUS_RATE_HZ) as usize,
            frames_since_status: 0,
            peak: 0.0,
        }
    }

    fn drain_controls(&mut self) {
        while let Ok(message) = self.control_rx.pop() {
            match message {
                ControlMessage::SetParam { index, value } => self.voice.set_param(index, value),
                ControlMessage::TogglePower => self.power_on = !self.power_on,
                ControlMessage::ToggleAgc => self.voice.toggle_agc(),
                ControlMessage::Quiet => self.voice.quiet(),
            }
        }
    }

    /// Audio callback body. Interleaved output; extra channels get silence.
    fn render(&mut self, data: &mut [f32], channels: usize) {
        self.drain_controls();

        for frame in data.chunks_mut(channels.max(1)) {
            let excitation = self.clicks.as_mut().map_or(0.0, ClickTrain::next_sample);
            let (left, right) = self.voice.process(self.power_on, excitation, -excitation);
            let left = (left * MASTER_GAIN).clamp(-1.0, 1.0);
            let right = (right * MASTER_GAIN).clamp(-1.0, 1.0);

            for (ch, out) in frame.iter_mut().enumerate() {
                *out = match ch {
                    0 => left,
                    1 => right,
                    _ => 0.0,
                };
            }

            // Scope drops samples when the UI falls behind
            let _ = self.scope_tx.push(0.5 * (left + right));
            self.peak = self.peak.max(left.abs()).max(right.abs());

            self.frames_since_status += 1;
            if self.frames_since_status >= self.status_interval {
                let status = self.voice.status(self.power_on, self.peak);
                let _ = self.status_tx.push(status);
                self.frames_since_status = 0;
                self.peak = 0.0;
            }
        }
    }
}
