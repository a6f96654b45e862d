use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::{state::AppState, ui::centered_rect};

pub fn render_confirm_popup(f: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(50, 25, area);

    // Clear the background
    f.render_widget(Clear, popup_area);

    let firmware = state
        .selected_firmware_entry()
        .map(|entry| entry.name.as_str())
        .unwrap_or("?");
    let port = state.connected_port.as_deref().unwrap_or("?");

    let content = vec![
        Line::from(vec![
            Span::raw("Program "),
            Span::styled(firmware, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to "),
            Span::styled(port, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("?"),
        ]),
        Line::from(""),
        Line::from("The flash is erased before the image is written."),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", Style::default().fg(Color::Green)),
            Span::raw("start    "),
            Span::styled("n ", Style::default().fg(Color::Red)),
            Span::raw("cancel"),
        ]),
    ];

    let confirm = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(confirm, popup_area);
}
