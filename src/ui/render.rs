use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use super::app::App;
use crate::audio::parameters::Param;

/// Render the TUI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),                             // Title + devices
            Constraint::Length(Param::ALL.len() as u16 + 2),  // Parameters
            Constraint::Length(5),                             // Fairing
            Constraint::Length(7),                             // Meters
            Constraint::Min(4),                                // Help
        ])
        .split(frame.size());

    render_title(frame, chunks[0], app);
    render_parameters(frame, chunks[1], app);
    render_fairing(frame, chunks[2], app);
    render_meters(frame, chunks[3], app);
    render_help(frame, chunks[4]);
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let preset = app.preset();
    let midi = app.devices.midi_in.as_deref().unwrap_or("none");

    let lines = vec![
        Line::from(Span::styled(
            format!("Cosmos Verb - {}", preset.name),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "{} -> {} @ {:.0} Hz | MIDI: {}",
                app.devices.audio_in, app.devices.audio_out, app.devices.sample_rate, midi
            ),
            Style::default().fg(Color::Gray),
        )),
    ];

    let title = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, area);
}

fn render_parameters(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(format!("Parameters - {}", app.preset().description))
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(Param::ALL.iter().map(|_| Constraint::Length(1)))
        .split(inner);

    for (i, (param, row)) in Param::ALL.iter().zip(rows.iter()).enumerate() {
        render_parameter(frame, *row, *param, app.parameters.get(*param), i == app.selected);
    }
}

/// Render a single parameter with gauge
fn render_parameter(frame: &mut Frame, area: Rect, param: Param, value: f32, selected: bool) {
    let (min, max) = param.range();
    let ratio = ((value - min) / (max - min)).clamp(0.0, 1.0);

    let color = if selected { Color::Yellow } else { Color::Green };
    let style = if selected {
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(color)
    };

    let precision = if param.step() < 1.0 { 1 } else { 0 };
    let label = format!("{}: {:.*} {}", param.label(), precision, value, param.unit());

    let gauge = Gauge::default()
        .gauge_style(style)
        .label(label)
        .ratio(ratio as f64);

    frame.render_widget(gauge, area);
}

fn render_fairing(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title("Fairing Separation")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    let gate = app.parameters.fairing_enabled();
    let gate_style = if gate {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let status = Line::from(vec![
        Span::styled(if gate { "GATE OPEN" } else { "gate closed" }, gate_style),
        Span::raw(format!(
            "  |  Sync: {}  |  Tempo: {:.0} BPM  |  {}",
            app.fairing_sync().label(),
            app.parameters.get(Param::Tempo),
            if app.meters.transition_active { "separating" } else { "idle" },
        )),
    ]);
    frame.render_widget(Paragraph::new(status), rows[0]);

    let intensity = app.meters.transition_intensity.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Magenta))
        .label(format!("Intensity: {:.0}%", intensity * 100.0))
        .ratio(intensity as f64);
    frame.render_widget(gauge, rows[1]);
}

fn render_meters(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default().title("Meters").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 5])
        .split(inner);

    let meters = &app.meters;
    render_level(frame, rows[0], "Decay", meters.decay_envelope, None, Color::Cyan);
    render_level(frame, rows[1], "In L ", meters.input_peak[0], None, Color::Green);
    render_level(frame, rows[2], "In R ", meters.input_peak[1], None, Color::Green);
    render_level(
        frame,
        rows[3],
        "Out L",
        meters.output_peak[0],
        Some(app.held_peak[0]),
        Color::Green,
    );
    render_level(
        frame,
        rows[4],
        "Out R",
        meters.output_peak[1],
        Some(app.held_peak[1]),
        Color::Green,
    );
}

fn render_level(frame: &mut Frame, area: Rect, name: &str, level: f32, held: Option<f32>, color: Color) {
    // Over full scale shows red
    let color = if level > 1.0 { Color::Red } else { color };
    let mut label = format!("{}: {}", name, format_db(level));
    if let Some(held) = held {
        label.push_str(&format!(" (peak {})", format_db(held)));
    }

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .label(label)
        .ratio(level.clamp(0.0, 1.0) as f64);
    frame.render_widget(gauge, area);
}

fn format_db(level: f32) -> String {
    if level <= 1e-5 {
        return "-inf dB".to_string();
    }
    format!("{:.1} dB", 20.0 * level.log10())
}

/// Render help text
fn render_help(frame: &mut Frame, area: Rect) {
    let help_text = vec![
        Line::from("  ←/→: Select parameter  |  ↑/↓: Adjust value  |  P: Next preset"),
        Line::from("  Space: Fairing gate  |  S: Sync length  |  R: Reset meters  |  Q: Quit"),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(Block::default().title("Controls").borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray));

    frame.render_widget(paragraph, area);
}
