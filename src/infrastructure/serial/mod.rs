// Serial module - Serial device access
pub mod transport;

pub use transport::{available_ports, SerialTransport, SharedTransport};
