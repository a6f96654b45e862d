use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::core::log::LogKind;
use crate::tui::state::AppState;

pub fn render_console_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = if state.auto_scroll {
        state.log.len().saturating_sub(visible)
    } else {
        0
    };

    let lines: Vec<Line> = state
        .log
        .iter()
        .skip(skip)
        .map(|entry| {
            let style = match entry.kind {
                LogKind::Status => Style::default(),
                LogKind::Notice => Style::default().fg(Color::Cyan),
                LogKind::Error => Style::default().fg(Color::Red),
                LogKind::Progress => Style::default().fg(Color::Yellow),
            };
            Line::from(Span::styled(entry.text.clone(), style))
        })
        .collect();

    let title = format!("Console ({})", state.log.len());
    let console = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(
                if matches!(state.active_panel, crate::tui::ui::ActivePanel::Console) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                },
            ),
    );

    f.render_widget(console, area);
}
