//! FlashTerm Library
//!
//! Firmware programming and console monitoring for embedded devices,
//! combining a serial flasher front end with a line-oriented display log.

pub mod cli;
pub mod tui;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::config::FlashTermConfig;
pub use domain::error::{FlashTermError, FlashTermResult};
pub use core::flasher::{FlasherClient, FlasherFactory, SimFlasherFactory};
pub use core::log::{DisplayLog, LogEntry, LogKind, SharedLog, TerminalSink};
pub use core::session::{SessionController, SessionPhase, UiAffordances};
