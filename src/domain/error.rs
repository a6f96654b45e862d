use thiserror::Error;

/// FlashTerm unified error type
#[derive(Error, Debug)]
pub enum FlashTermError {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Flasher error: {0}")]
    Flasher(String),

    #[error("Firmware fetch failed: {0}")]
    Fetch(String),

    #[error("Device not connected")]
    DeviceNotConnected,

    #[error("Monitor error: {0}")]
    Monitor(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("TUI error: {0}")]
    Tui(String),
}

pub type FlashTermResult<T> = Result<T, FlashTermError>;
