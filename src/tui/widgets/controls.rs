use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::tui::state::AppState;

/// Top bar showing the session controls and their current availability
pub fn render_controls_bar(f: &mut Frame, area: Rect, state: &AppState) {
    let a = &state.affordances;

    let mut spans = vec![
        control_span(&format!(" {} [c] ", a.connect_label), a.connect_enabled),
        Span::raw(" "),
        control_span(" Program [p] ", a.program_enabled),
        Span::raw(" "),
        control_span(&format!(" {} [m] ", a.monitor_label), a.monitor_enabled),
        Span::raw("   "),
        Span::styled(
            format!("{}", a.phase),
            Style::default().fg(phase_color(state)),
        ),
    ];

    if let Some(port) = &state.connected_port {
        spans.push(Span::raw(" on "));
        spans.push(Span::styled(
            port.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("FlashTerm"));

    f.render_widget(bar, area);
}

fn control_span(label: &str, enabled: bool) -> Span<'static> {
    let style = if enabled {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(label.to_string(), style)
}

fn phase_color(state: &AppState) -> Color {
    use crate::core::session::SessionPhase;
    match state.affordances.phase {
        SessionPhase::Disconnected => Color::Red,
        SessionPhase::Connected => Color::Green,
        SessionPhase::Monitoring => Color::Cyan,
    }
}
