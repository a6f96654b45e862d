use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    Frame,
};

use super::{
    state::AppState,
    widgets::{
        confirm::render_confirm_popup,
        console::render_console_panel,
        controls::render_controls_bar,
        firmware::render_firmware_panel,
        help::render_help_popup,
        ports::render_ports_panel,
        status::render_status_bar,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePanel {
    Ports,
    Firmware,
    Console,
}

impl std::fmt::Display for ActivePanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivePanel::Ports => write!(f, "Ports"),
            ActivePanel::Firmware => write!(f, "Firmware"),
            ActivePanel::Console => write!(f, "Console"),
        }
    }
}

pub fn draw_ui(f: &mut Frame, state: &mut AppState) {
    let size = f.size();
    state.terminal_size = (size.width, size.height);

    // Main layout
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Controls bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(size);

    render_controls_bar(f, chunks[0], state);

    // Main content: device selectors on the left, console on the right
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(chunks[1]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(body[0]);

    render_ports_panel(f, sidebar[0], state);
    render_firmware_panel(f, sidebar[1], state);
    render_console_panel(f, body[1], state);

    // Status bar
    render_status_bar(f, chunks[2], state);

    // Popups (if active)
    if state.confirm_program {
        render_confirm_popup(f, size, state);
    }
    if state.show_help {
        render_help_popup(f, size, state);
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
