//! Scope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Samples drawn per frame; the rest of the buffer is trigger search room
const SCOPE_WINDOW: usize = 1024;

/// Index of the last rising zero crossing that still leaves a full window
/// after it, so a periodic signal holds still on screen.
fn trigger_point(samples: &[f32]) -> usize {
    let limit = samples.len().saturating_sub(SCOPE_WINDOW);
    (1..=limit)
        .rev()
        .find(|&i| samples[i - 1] <= 0.0 && samples[i] > 0.0)
        .unwrap_or(limit)
}

/// Render the resonator output, rescaled to its own peak
pub fn render_waveform(frame: &mut Frame, area: Rect, samples: &[f32]) {
    let start = trigger_point(samples);
    let window = &samples[start..samples.len().min(start + SCOPE_WINDOW)];

    let peak = window.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    let range = f64::from(peak.max(0.05)) * 1.1;

    let data: Vec<(f64, f64)> = window
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / SCOPE_WINDOW as f64, f64::from(sample)))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let block = Block::default()
        .title(format!(" Output  peak {peak:.3} "))
        .borders(Borders::ALL);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-range, range])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
