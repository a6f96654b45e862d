// Core module - Session control, flashing, terminal handling
pub mod flasher;
pub mod log;
pub mod session;
pub mod terminal;
