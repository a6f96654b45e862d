use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::tui::{state::AppState, ui::centered_rect};

pub fn render_help_popup(f: &mut Frame, area: Rect, _state: &AppState) {
    let popup_area = centered_rect(70, 80, area);

    // Clear the background
    f.render_widget(Clear, popup_area);

    let help_content = vec![
        Line::from("FlashTerm Help"),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  q / Esc  - Quit"),
        Line::from("  h        - Toggle help"),
        Line::from("  Tab      - Cycle panel focus (Ports → Firmware → Console)"),
        Line::from("  ↑/k ↓/j  - Move selection in the focused panel"),
        Line::from("  r        - Rescan serial ports"),
        Line::from(""),
        Line::from("Session:"),
        Line::from("  c        - Connect to the selected port / disconnect"),
        Line::from("  p        - Program the selected firmware (asks first)"),
        Line::from("  m        - Start or stop the console monitor"),
        Line::from(""),
        Line::from("Workflow:"),
        Line::from("  1. Pick a port and press 'c' to connect."),
        Line::from("  2. Pick a firmware image and press 'p' to program it."),
        Line::from("  3. Press 'm', reset the device, and watch its console."),
        Line::from(""),
        Line::from("Programming runs at 921600 baud; the console opens at"),
        Line::from("115200 baud two seconds after the reset prompt."),
    ];

    let help = Paragraph::new(help_content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(help, popup_area);
}
