use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::tui::state::AppState;

pub fn render_ports_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let items: Vec<ListItem> = state
        .ports
        .iter()
        .enumerate()
        .map(|(index, port)| {
            let connected = state.connected_port.as_deref() == Some(port.as_str());
            let marker = if connected { "●" } else { "○" };
            let marker_color = if connected { Color::Green } else { Color::DarkGray };

            let content = vec![Line::from(vec![
                Span::styled(marker, Style::default().fg(marker_color)),
                Span::raw(" "),
                Span::raw(port.as_str()),
            ])];

            let mut item = ListItem::new(content);
            if index == state.selected_port {
                item = item.style(Style::default().bg(Color::Blue).fg(Color::White));
            }
            item
        })
        .collect();

    let title = format!("Ports ({})", state.ports.len());
    let ports_list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(
                if matches!(state.active_panel, crate::tui::ui::ActivePanel::Ports) {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                },
            ),
    );

    f.render_widget(ports_list, area);
}
