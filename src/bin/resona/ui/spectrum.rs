//! Spectrum widget
//!
//! Log-spaced FFT magnitudes with a falling peak-hold trace. Resonators
//! ring at a few sharp frequencies, so the held peaks are what make the
//! modes readable between excitations.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of points along the frequency axis
const SPECTRUM_POINTS: usize = 96;
/// Lowest frequency shown
const MIN_FREQ_HZ: f64 = 20.0;
/// Floor of the magnitude axis
const FLOOR_DB: f64 = -100.0;
/// How fast held peaks fall, in dB per UI frame
const PEAK_FALL_DB: f64 = 0.75;

pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    /// FFT bin range [start, end) folded into each point
    bands: Vec<(usize, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log10 Hz, dB)
    current: Vec<(f64, f64)>,
    held: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_size: usize, sample_rate: f32) -> Self {
        let fft_size = fft_size.max(2);
        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        // Hann
        let denom = (fft_size - 1) as f32;
        let window = (0..fft_size)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        let nyquist = f64::from(sample_rate.max(2.0)) / 2.0;
        let max_freq = nyquist.min(20_000.0).max(MIN_FREQ_HZ * 2.0);
        let hz_per_bin = f64::from(sample_rate.max(2.0)) / fft_size as f64;
        let last_bin = fft_size / 2 - 1;

        let edge = |t: f64| MIN_FREQ_HZ * (max_freq / MIN_FREQ_HZ).powf(t);
        let mut bands = Vec::with_capacity(SPECTRUM_POINTS);
        let mut points = Vec::with_capacity(SPECTRUM_POINTS);
        for i in 0..SPECTRUM_POINTS {
            let lo = edge(i as f64 / SPECTRUM_POINTS as f64);
            let hi = edge((i + 1) as f64 / SPECTRUM_POINTS as f64);
            let start = ((lo / hz_per_bin).round() as usize).min(last_bin);
            let end = ((hi / hz_per_bin).round() as usize).clamp(start + 1, last_bin + 1);
            bands.push((start, end));
            points.push(((lo * hi).sqrt().log10(), FLOOR_DB));
        }

        Self {
            window,
            bands,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
            held: points.clone(),
            current: points,
        }
    }

    /// Analyze the newest samples; buffers of the wrong length are ignored.
    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }

        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(samples).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        // Normalize so a full-scale sine reads near 0 dB
        let norm = 2.0 / self.window.len() as f32;
        for (i, &(start, end)) in self.bands.iter().enumerate() {
            let power = self.scratch[start..end]
                .iter()
                .map(|c| c.norm_sqr())
                .fold(0.0f32, f32::max)
                * norm
                * norm;
            let db = (10.0 * f64::from(power.max(1e-12)).log10()).max(FLOOR_DB);
            self.current[i].1 = db;
            let held = &mut self.held[i].1;
            *held = (*held - PEAK_FALL_DB).max(db);
        }
    }

    pub fn data(&self) -> (&[(f64, f64)], &[(f64, f64)]) {
        (&self.current, &self.held)
    }
}

pub fn render_spectrum(
    frame: &mut Frame,
    area: Rect,
    (current, held): (&[(f64, f64)], &[(f64, f64)]),
) {
    let block = Block::default().title(" Spectrum ").borders(Borders::ALL);

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(current),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(held),
    ];

    let lo = current.first().map_or(1.0, |p| p.0);
    let hi = current.last().map_or(4.0, |p| p.0);

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([lo, hi])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
