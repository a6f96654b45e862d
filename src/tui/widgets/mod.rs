// Widget rendering for the TUI panels and popups

pub mod confirm;
pub mod console;
pub mod controls;
pub mod firmware;
pub mod help;
pub mod ports;
pub mod status;
