use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::tui::state::AppState;

pub fn render_firmware_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let items: Vec<ListItem> = state
        .firmware
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let mut spans = vec![Span::raw(entry.name.clone())];
            if !entry.description.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", entry.description),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let mut item = ListItem::new(vec![Line::from(spans)]);
            if index == state.selected_firmware {
                item = item.style(Style::default().bg(Color::Blue).fg(Color::White));
            }
            item
        })
        .collect();

    let title = format!("Firmware ({})", state.firmware.len());
    let firmware_list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(
                if matches!(state.active_panel, crate::tui::ui::ActivePanel::Firmware) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                },
            ),
    );

    f.render_widget(firmware_list, area);
}
