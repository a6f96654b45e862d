use crate::core::log::LogEntry;
use crate::core::session::{SessionPhase, UiAffordances};
use crate::domain::config::FirmwareEntry;

use super::ui::ActivePanel;

#[derive(Debug)]
pub struct AppState {
    pub active_panel: ActivePanel,
    pub terminal_size: (u16, u16),
    pub ports: Vec<String>,
    pub selected_port: usize,
    pub firmware: Vec<FirmwareEntry>,
    pub selected_firmware: usize,
    pub affordances: UiAffordances,
    pub connected_port: Option<String>,
    pub log: Vec<LogEntry>,
    pub auto_scroll: bool,
    pub status_message: Option<String>,
    pub show_help: bool,
    pub confirm_program: bool,
}

impl AppState {
    pub fn new(firmware: Vec<FirmwareEntry>, auto_scroll: bool) -> Self {
        Self {
            active_panel: ActivePanel::Ports,
            terminal_size: (80, 24),
            ports: Vec::new(),
            selected_port: 0,
            firmware,
            selected_firmware: 0,
            affordances: UiAffordances::for_phase(SessionPhase::Disconnected, false, false),
            connected_port: None,
            log: Vec::new(),
            auto_scroll,
            status_message: Some("Welcome to FlashTerm! Press 'h' for help.".to_string()),
            show_help: false,
            confirm_program: false,
        }
    }

    pub fn set_ports(&mut self, ports: Vec<String>) {
        self.ports = ports;
        if self.selected_port >= self.ports.len() {
            self.selected_port = self.ports.len().saturating_sub(1);
        }
    }

    pub fn selected_port_name(&self) -> Option<&str> {
        self.ports.get(self.selected_port).map(String::as_str)
    }

    pub fn selected_firmware_entry(&self) -> Option<&FirmwareEntry> {
        self.firmware.get(self.selected_firmware)
    }

    pub fn select_previous(&mut self) {
        match self.active_panel {
            ActivePanel::Ports => {
                self.selected_port = self.selected_port.saturating_sub(1);
            }
            ActivePanel::Firmware => {
                self.selected_firmware = self.selected_firmware.saturating_sub(1);
            }
            ActivePanel::Console => {}
        }
    }

    pub fn select_next(&mut self) {
        match self.active_panel {
            ActivePanel::Ports => {
                if self.selected_port + 1 < self.ports.len() {
                    self.selected_port += 1;
                }
            }
            ActivePanel::Firmware => {
                if self.selected_firmware + 1 < self.firmware.len() {
                    self.selected_firmware += 1;
                }
            }
            ActivePanel::Console => {}
        }
    }

    pub fn next_panel(&mut self) {
        self.active_panel = match self.active_panel {
            ActivePanel::Ports => ActivePanel::Firmware,
            ActivePanel::Firmware => ActivePanel::Console,
            ActivePanel::Console => ActivePanel::Ports,
        };
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status_message(&mut self) {
        self.status_message = None;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::FirmwareSource;

    fn create_test_entries() -> Vec<FirmwareEntry> {
        vec![
            FirmwareEntry {
                name: "app".to_string(),
                description: "Main application".to_string(),
                source: FirmwareSource::Path {
                    path: std::path::PathBuf::from("firmware/app.bin"),
                },
            },
            FirmwareEntry {
                name: "bootloader".to_string(),
                description: String::new(),
                source: FirmwareSource::Path {
                    path: std::path::PathBuf::from("firmware/boot.bin"),
                },
            },
        ]
    }

    #[test]
    fn test_new_state_defaults() {
        let state = AppState::new(create_test_entries(), true);
        assert_eq!(state.active_panel, ActivePanel::Ports);
        assert!(state.ports.is_empty());
        assert_eq!(state.firmware.len(), 2);
        assert!(!state.show_help);
        assert!(!state.confirm_program);
        assert!(state.status_message.is_some());
    }

    #[test]
    fn test_port_cursor_stays_in_bounds() {
        let mut state = AppState::new(Vec::new(), true);
        state.set_ports(vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()]);

        state.select_previous();
        assert_eq!(state.selected_port, 0);

        state.select_next();
        assert_eq!(state.selected_port, 1);
        state.select_next();
        assert_eq!(state.selected_port, 1);
    }

    #[test]
    fn test_set_ports_clamps_cursor() {
        let mut state = AppState::new(Vec::new(), true);
        state.set_ports(vec![
            "/dev/ttyUSB0".to_string(),
            "/dev/ttyUSB1".to_string(),
            "/dev/ttyUSB2".to_string(),
        ]);
        state.select_next();
        state.select_next();
        assert_eq!(state.selected_port, 2);

        state.set_ports(vec!["/dev/ttyUSB0".to_string()]);
        assert_eq!(state.selected_port, 0);

        state.set_ports(Vec::new());
        assert_eq!(state.selected_port, 0);
        assert!(state.selected_port_name().is_none());
    }

    #[test]
    fn test_firmware_cursor_follows_panel_focus() {
        let mut state = AppState::new(create_test_entries(), true);
        state.next_panel();
        assert_eq!(state.active_panel, ActivePanel::Firmware);

        state.select_next();
        assert_eq!(state.selected_firmware, 1);
        assert_eq!(
            state.selected_firmware_entry().map(|e| e.name.as_str()),
            Some("bootloader")
        );
    }

    #[test]
    fn test_panel_cycle() {
        let mut state = AppState::new(Vec::new(), true);
        state.next_panel();
        state.next_panel();
        assert_eq!(state.active_panel, ActivePanel::Console);
        state.next_panel();
        assert_eq!(state.active_panel, ActivePanel::Ports);
    }
}
