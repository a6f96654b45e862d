use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::{
    core::{
        flasher::SimFlasherFactory,
        session::{SessionController, SessionPhase},
    },
    domain::{config::FlashTermConfig, error::FlashTermError},
    infrastructure::{firmware::FirmwareCatalog, serial::available_ports},
};
use super::{state::AppState, ui::draw_ui};

pub struct App {
    state: AppState,
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    should_quit: bool,
    last_tick: Instant,
    tick_rate: Duration,
    controller: Arc<SessionController>,
}

impl App {
    pub fn new(config: &FlashTermConfig) -> Result<Self, FlashTermError> {
        // Setup terminal
        enable_raw_mode().map_err(|e| FlashTermError::Tui(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .map_err(|e| FlashTermError::Tui(e.to_string()))?;
        let backend = CrosstermBackend::new(stdout);
        let terminal =
            Terminal::new(backend).map_err(|e| FlashTermError::Tui(e.to_string()))?;

        let catalog = FirmwareCatalog::from_config(config);
        let controller = Arc::new(SessionController::new(
            Arc::new(SimFlasherFactory::new()),
            config.global.log_limit,
        ));

        let mut state = AppState::new(catalog.entries().to_vec(), config.global.auto_scroll);
        state.set_ports(port_names());

        Ok(Self {
            state,
            terminal,
            should_quit: false,
            last_tick: Instant::now(),
            tick_rate: Duration::from_millis(250),
            controller,
        })
    }

    pub async fn run(&mut self) -> Result<(), FlashTermError> {
        loop {
            // Handle events
            if let Ok(true) = event::poll(self.tick_rate) {
                if let Ok(event) = event::read() {
                    match event {
                        Event::Key(key) => {
                            if self.handle_key_event(key).await? {
                                break;
                            }
                        }
                        Event::Resize(width, height) => {
                            self.state.terminal_size = (width, height);
                        }
                        _ => {}
                    }
                }
            }

            // Tick
            if self.last_tick.elapsed() >= self.tick_rate {
                self.tick().await;
                self.last_tick = Instant::now();
            }

            // Draw UI
            self.terminal
                .draw(|f| draw_ui(f, &mut self.state))
                .map_err(|e| FlashTermError::Tui(e.to_string()))?;

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    async fn handle_key_event(
        &mut self,
        key: crossterm::event::KeyEvent,
    ) -> Result<bool, FlashTermError> {
        // The confirmation popup swallows every key
        if self.state.confirm_program {
            match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.state.confirm_program = false;
                    self.start_programming();
                }
                KeyCode::Char('n') | KeyCode::Esc => {
                    self.state.confirm_program = false;
                    self.state.set_status_message("Programming cancelled".to_string());
                }
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Char('q') => return Ok(true), // Quit
            KeyCode::Esc => return Ok(true),       // Quit
            KeyCode::Char('h') => {
                self.state.toggle_help();
            }
            KeyCode::Tab => {
                self.state.next_panel();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.state.select_previous();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.state.select_next();
            }
            KeyCode::Char('r') => {
                self.state.set_ports(port_names());
                self.state
                    .set_status_message(format!("Found {} serial ports", self.state.ports.len()));
            }
            KeyCode::Char('c') => {
                self.toggle_connection().await;
            }
            KeyCode::Char('p') => {
                if self.state.affordances.program_enabled {
                    if self.state.selected_firmware_entry().is_some() {
                        self.state.confirm_program = true;
                    } else {
                        self.state.set_status_message("No firmware selected".to_string());
                    }
                }
            }
            KeyCode::Char('m') => {
                self.toggle_monitor();
            }
            _ => {}
        }

        Ok(false)
    }

    async fn toggle_connection(&mut self) {
        if !self.state.affordances.connect_enabled {
            return;
        }

        if self.state.affordances.phase == SessionPhase::Disconnected {
            let port = match self.state.selected_port_name() {
                Some(port) => port.to_string(),
                None => {
                    self.state
                        .set_status_message("No serial port selected".to_string());
                    return;
                }
            };
            match self.controller.connect(&port).await {
                Ok(()) => self
                    .state
                    .set_status_message(format!("Connected to {}", port)),
                Err(e) => self
                    .state
                    .set_status_message(format!("Connect failed: {}", e)),
            }
        } else {
            match self.controller.disconnect().await {
                Ok(()) => self.state.clear_status_message(),
                Err(e) => self
                    .state
                    .set_status_message(format!("Disconnect failed: {}", e)),
            }
        }
    }

    /// Kick off programming in the background. Outcome lines, rejections
    /// included, land in the display log.
    fn start_programming(&mut self) {
        // The confirm popup may have sat open across a state change
        if !self.state.affordances.program_enabled {
            self.state
                .set_status_message("Programming is not available right now".to_string());
            return;
        }

        let entry = match self.state.selected_firmware_entry() {
            Some(entry) => entry.clone(),
            None => {
                self.state
                    .set_status_message("No firmware selected".to_string());
                return;
            }
        };

        self.state
            .set_status_message(format!("Programming '{}'...", entry.name));
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let _ = controller.program(&entry, None).await;
        });
    }

    /// Start or stop the console monitor in the background. The start path
    /// waits for the user to reset the device, so it must not block the UI
    /// loop; failures are reported through the display log.
    fn toggle_monitor(&mut self) {
        if !self.state.affordances.monitor_enabled {
            return;
        }

        self.state.clear_status_message();
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let _ = controller.toggle_monitor().await;
        });
    }

    async fn tick(&mut self) {
        self.controller.poll_monitor().await;
        self.state.affordances = self.controller.affordances().await;
        self.state.connected_port = self.controller.port_name().await;
        self.state.log = self.controller.log().snapshot();
    }
}

fn port_names() -> Vec<String> {
    available_ports()
        .map(|ports| ports.into_iter().map(|p| p.port_name).collect())
        .unwrap_or_default()
}

impl Drop for App {
    fn drop(&mut self) {
        // Restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = self.terminal.show_cursor();
    }
}
