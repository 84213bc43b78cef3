//! Status bar and parameter list widgets

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::state::{EngineKind, ParamList, StatusUpdate};

/// Limiter compression above this many dB lights the warning
const LIMITER_WARNING_DB: f32 = 0.1;
/// Width of the value bar drawn next to each parameter
const BAR_WIDTH: usize = 16;

fn indicator(label: &str, lit: bool, color: Color) -> Span<'static> {
    let style = if lit {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("● {label}  "), style)
}

/// Render the power/limiter status bar
pub fn render_status(frame: &mut Frame, area: Rect, kind: EngineKind, status: &StatusUpdate) {
    let block = Block::default()
        .title(format!(" resona · {} ", kind.title()))
        .borders(Borders::ALL);

    let power_label = match (status.power_on, status.running) {
        (true, _) => "Power",
        (false, true) => "Fading",
        (false, false) => "Off",
    };

    let mut spans = vec![
        Span::raw(" "),
        indicator(power_label, status.power_on, Color::Green),
        indicator("AGC", status.agc_enabled, Color::Cyan),
        indicator(
            "Limiting",
            status.agc_enabled && status.agc_distortion > LIMITER_WARNING_DB,
            Color::Red,
        ),
        Span::styled(
            format!("Comp: {:>5.1} dB  ", status.agc_distortion),
            Style::default().fg(Color::Magenta),
        ),
        Span::styled(
            format!("Peak: {:.2}  ", status.peak),
            Style::default().fg(Color::Magenta),
        ),
    ];
    if status.recoveries > 0 {
        spans.push(Span::styled(
            format!("Recovered: {}", status.recoveries),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Render the selectable parameter list with a bar per value
pub fn render_params(frame: &mut Frame, area: Rect, params: &ParamList) {
    let block = Block::default().title(" Controls ").borders(Borders::ALL);

    let items: Vec<ListItem> = params
        .groups
        .iter()
        .zip(&params.values)
        .enumerate()
        .map(|(i, (group, &value))| {
            let span = group.max - group.min;
            let t = if span > 0.0 { (value - group.min) / span } else { 0.0 };
            let filled = ((t * BAR_WIDTH as f32).round() as usize).min(BAR_WIDTH);
            let bar = format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled));

            let style = if i == params.selected {
                Style::default().fg(Color::Black).bg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<17}", group.name), style),
                Span::styled(bar, Style::default().fg(Color::Cyan)),
                Span::styled(format!(" {value:>6.3}"), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
