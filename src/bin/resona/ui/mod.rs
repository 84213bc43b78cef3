//! TUI module for resona
//!
//! Parameter list on the left, scope and spectrum on the right.

mod params;
mod spectrum;
pub mod state;
mod waveform;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use std::time::Duration;
use tracing::warn;

use params::{render_params, render_status};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use state::{ControlMessage, EngineKind, ParamList, StatusUpdate};
use waveform::render_waveform;

/// Audio visualization buffer size (also the FFT size)
const VIS_BUFFER_SIZE: usize = 2048;

/// UI application state
pub struct UiApp {
    kind: EngineKind,
    control_tx: Producer<ControlMessage>,
    scope_rx: Consumer<f32>,
    status_rx: Consumer<StatusUpdate>,
    status: StatusUpdate,
    params: ParamList,
    scope: Vec<f32>,
    spectrum: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        kind: EngineKind,
        sample_rate: f32,
        control_tx: Producer<ControlMessage>,
        scope_rx: Consumer<f32>,
        status_rx: Consumer<StatusUpdate>,
    ) -> Self {
        Self {
            kind,
            control_tx,
            scope_rx,
            status_rx,
            status: StatusUpdate::new(),
            params: ParamList::new(kind.params()),
            scope: vec![0.0; VIS_BUFFER_SIZE],
            spectrum: SpectrumAnalyzer::new(VIS_BUFFER_SIZE, sample_rate),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.poll_status();
            self.spectrum.update(&self.scope);

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        Ok(())
    }

    /// Keep the newest VIS_BUFFER_SIZE samples
    fn poll_scope(&mut self) {
        let available = self.scope_rx.slots();
        if available == 0 {
            return;
        }
        if let Ok(chunk) = self.scope_rx.read_chunk(available) {
            self.scope.extend(chunk);
        }
        if self.scope.len() > VIS_BUFFER_SIZE {
            let excess = self.scope.len() - VIS_BUFFER_SIZE;
            self.scope.drain(..excess);
        }
    }

    fn poll_status(&mut self) {
        while let Ok(status) = self.status_rx.pop() {
            self.status = status;
        }
    }

    fn send(&mut self, message: Option<ControlMessage>) {
        if let Some(message) = message {
            if self.control_tx.push(message).is_err() {
                warn!(?message, "control ring full, dropping message");
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.params.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => self.params.select_next(),
            KeyCode::Left | KeyCode::Char('h') => {
                let message = self.params.adjust(-1.0);
                self.send(message);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let message = self.params.adjust(1.0);
                self.send(message);
            }
            KeyCode::PageDown => {
                let message = self.params.adjust(-10.0);
                self.send(message);
            }
            KeyCode::PageUp => {
                let message = self.params.adjust(10.0);
                self.send(message);
            }
            KeyCode::Char('d') => {
                let message = self.params.reset_selected();
                self.send(message);
            }
            KeyCode::Char(' ') => self.send(Some(ControlMessage::TogglePower)),
            KeyCode::Char('a') => self.send(Some(ControlMessage::ToggleAgc)),
            KeyCode::Char('r') => self.send(Some(ControlMessage::Quiet)),
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(8),    // Params + scope
                Constraint::Length(10), // Spectrum
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        render_status(frame, rows[0], self.kind, &self.status);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(20)])
            .split(rows[1]);
        render_params(frame, columns[0], &self.params);
        render_waveform(frame, columns[1], &self.scope);

        render_spectrum(frame, rows[2], self.spectrum.data());

        let help = Paragraph::new(concat!(
            " [↑↓] Select  [←→] Adjust  [PgUp/PgDn] Coarse  [D] Default",
            "  [Space] Power  [A] AGC  [R] Rest  [Q] Quit",
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, rows[3]);
    }
}
