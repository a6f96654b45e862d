use std::io;
use std::sync::Arc;
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::core::terminal::monitor::ByteSource;
use crate::domain::error::{FlashTermError, FlashTermResult};

/// Serial device handle that survives open/close cycles.
///
/// The transport keeps the port name and opens the OS device only for the
/// duration of an operation, so programming and monitoring can reopen the
/// same device at different baud rates.
pub struct SerialTransport {
    port_name: String,
    port: Option<Box<dyn SerialPort + Send>>,
}

/// Transport shared between the session controller and background tasks
pub type SharedTransport = Arc<Mutex<SerialTransport>>;

impl SerialTransport {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            port: None,
        }
    }

    /// Wrap a transport for use across tasks
    pub fn shared(port_name: impl Into<String>) -> SharedTransport {
        Arc::new(Mutex::new(Self::new(port_name)))
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Open the OS device at the given baud rate, replacing any prior handle
    pub fn open(&mut self, baud_rate: u32) -> FlashTermResult<()> {
        self.port = None;

        let port = serialport::new(&self.port_name, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(FlashTermError::Serial)?;

        info!("Opened {} at {} baud", self.port_name, baud_rate);
        self.port = Some(port);
        Ok(())
    }

    /// Drop the OS handle; the transport stays usable for reopening
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed {}", self.port_name);
        }
    }

    pub fn write_all(&mut self, data: &[u8]) -> FlashTermResult<()> {
        match self.port.as_mut() {
            Some(port) => {
                port.write_all(data)?;
                Ok(())
            }
            None => Err(FlashTermError::DeviceNotConnected),
        }
    }

    /// Hand the transport an already-open device handle, the way a flash
    /// backend would leave one behind
    #[cfg(test)]
    pub(crate) fn attach(&mut self, port: Box<dyn SerialPort + Send>) {
        self.port = Some(port);
    }
}

impl ByteSource for SerialTransport {
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.as_mut() {
            Some(port) => port.read(buf),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "serial port is not open",
            )),
        }
    }
}

/// Enumerate serial devices visible to the OS
pub fn available_ports() -> FlashTermResult<Vec<SerialPortInfo>> {
    serialport::available_ports().map_err(FlashTermError::Serial)
}

/// Whether a read error means the device went away rather than a transient
/// fault. Timeouts never reach this check.
pub fn is_device_lost(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::PermissionDenied
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_starts_closed() {
        let transport = SerialTransport::new("/dev/ttyUSB0");
        assert_eq!(transport.port_name(), "/dev/ttyUSB0");
        assert!(!transport.is_open());
    }

    #[test]
    fn test_read_without_open_is_not_connected() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0");
        let mut buf = [0u8; 16];
        let err = transport.read_chunk(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_write_without_open_fails() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0");
        assert!(matches!(
            transport.write_all(b"hi"),
            Err(FlashTermError::DeviceNotConnected)
        ));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut transport = SerialTransport::new("/dev/ttyUSB0");
        transport.close();
        transport.close();
        assert!(!transport.is_open());
    }

    #[test]
    fn test_device_lost_classification() {
        assert!(is_device_lost(&io::Error::new(io::ErrorKind::BrokenPipe, "gone")));
        assert!(is_device_lost(&io::Error::new(io::ErrorKind::NotConnected, "gone")));
        assert!(!is_device_lost(&io::Error::new(io::ErrorKind::TimedOut, "slow")));
        assert!(!is_device_lost(&io::Error::new(io::ErrorKind::Interrupted, "eintr")));
    }
}
