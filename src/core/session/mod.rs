// Session module - Device session lifecycle
pub mod controller;
pub mod state;

pub use controller::{SessionController, FLASH_BAUD, FLASH_OFFSET, MONITOR_BAUD, RESET_DELAY};
pub use state::{SessionPhase, UiAffordances};
