// TUI module - Terminal User Interface

pub mod app;
pub mod state;
pub mod ui;
pub mod widgets;
