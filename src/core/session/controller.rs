use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::state::{SessionPhase, UiAffordances};
use crate::core::flasher::{
    image_checksum, FlashSegment, FlashSizePolicy, FlasherFactory, ProgressFn, ResetMode,
    WriteOptions,
};
use crate::core::log::SharedLog;
use crate::core::terminal::monitor::MonitorSession;
use crate::domain::config::FirmwareEntry;
use crate::domain::error::{FlashTermError, FlashTermResult};
use crate::infrastructure::firmware::fetch_firmware;
use crate::infrastructure::serial::transport::{self, SerialTransport, SharedTransport};

/// Baud rate used while programming
pub const FLASH_BAUD: u32 = 921_600;
/// Baud rate used for the console monitor
pub const MONITOR_BAUD: u32 = 115_200;
/// Flash address the image is written to
pub const FLASH_OFFSET: u32 = 0x0;
/// Pause between the reset prompt and opening the console
pub const RESET_DELAY: Duration = Duration::from_secs(2);

struct Inner {
    transport: Option<SharedTransport>,
    monitor: Option<MonitorSession>,
    programming: bool,
    monitor_pending: bool,
}

impl Inner {
    fn phase(&self) -> SessionPhase {
        if self.monitor.as_ref().map_or(false, |m| m.is_active()) {
            SessionPhase::Monitoring
        } else if self.transport.is_some() {
            SessionPhase::Connected
        } else {
            SessionPhase::Disconnected
        }
    }
}

/// Drives the device session through its three phases.
///
/// Holds the selected transport, the display log, and whichever background
/// monitor task is running. The port itself is opened only for the duration
/// of a programming pass or a console session, so the two can use different
/// baud rates on the same device.
pub struct SessionController {
    factory: Arc<dyn FlasherFactory>,
    log: SharedLog,
    inner: Arc<RwLock<Inner>>,
}

impl SessionController {
    pub fn new(factory: Arc<dyn FlasherFactory>, log_limit: usize) -> Self {
        Self {
            factory,
            log: SharedLog::new(log_limit),
            inner: Arc::new(RwLock::new(Inner {
                transport: None,
                monitor: None,
                programming: false,
                monitor_pending: false,
            })),
        }
    }

    /// Handle to the display log this session writes to
    pub fn log(&self) -> SharedLog {
        self.log.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.read().await.phase()
    }

    /// Current UI affordances for this session
    pub async fn affordances(&self) -> UiAffordances {
        let inner = self.inner.read().await;
        UiAffordances::for_phase(inner.phase(), inner.programming, inner.monitor_pending)
    }

    /// Name of the selected serial device, if any
    pub async fn port_name(&self) -> Option<String> {
        let transport = self.inner.read().await.transport.clone();
        match transport {
            Some(transport) => Some(transport.lock().await.port_name().to_string()),
            None => None,
        }
    }

    /// Transport handle for tests that observe the port state
    #[cfg(test)]
    async fn transport_handle(&self) -> Option<SharedTransport> {
        self.inner.read().await.transport.clone()
    }

    /// Select a serial device. The port is not opened yet.
    pub async fn connect(&self, port_name: &str) -> FlashTermResult<()> {
        let mut inner = self.inner.write().await;
        if inner.transport.is_some() {
            return Err(FlashTermError::Session {
                message: "A device is already connected".to_string(),
            });
        }
        if !port_exists(port_name) {
            return Err(FlashTermError::Session {
                message: format!("Serial port not found: {}", port_name),
            });
        }

        inner.transport = Some(SerialTransport::shared(port_name));
        info!("Connected to {}", port_name);
        self.log.notice(format!("Connected to {}", port_name));
        Ok(())
    }

    /// Drop the device selection. While monitoring this only stops the
    /// monitor and keeps the device selected.
    pub async fn disconnect(&self) -> FlashTermResult<()> {
        if self.phase().await == SessionPhase::Monitoring {
            return self.stop_monitoring().await;
        }

        let (transport, monitor) = {
            let mut inner = self.inner.write().await;
            if inner.programming {
                return Err(FlashTermError::Session {
                    message: "Cannot disconnect while programming".to_string(),
                });
            }
            if inner.monitor_pending {
                return Err(FlashTermError::Session {
                    message: "Console monitor is starting".to_string(),
                });
            }
            match inner.transport.take() {
                Some(transport) => (transport, inner.monitor.take()),
                None => return Err(FlashTermError::DeviceNotConnected),
            }
        };

        if let Some(monitor) = monitor {
            monitor.stop().await;
        }
        transport.lock().await.close();
        info!("Disconnected");
        self.log.notice("Disconnected");
        Ok(())
    }

    /// Run the full programming sequence with the fixed write policy.
    ///
    /// The caller may supply a progress callback; when omitted, progress is
    /// visible only through the display log. The port is closed and the
    /// session returns to its idle connected state no matter how the
    /// sequence ends.
    pub async fn program(
        &self,
        firmware: &FirmwareEntry,
        progress: Option<ProgressFn>,
    ) -> FlashTermResult<()> {
        // Rejections are written to the log as well; TUI actions run as
        // background tasks and have no other channel back to the user.
        let transport = match self.claim_programming().await {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Programming rejected: {}", e);
                self.log.error(format!("Programming failed: {}", e));
                return Err(e);
            }
        };

        self.log.reset_progress();
        let result = self.run_programming(&transport, firmware, progress).await;

        // Cleanup runs for success and failure alike
        transport.lock().await.close();
        self.inner.write().await.programming = false;

        if let Err(ref e) = result {
            warn!("Programming failed: {}", e);
            self.log.error(format!("Programming failed: {}", e));
        }
        result
    }

    /// Check the programming preconditions and mark the pass active,
    /// handing back the transport it will run on
    async fn claim_programming(&self) -> FlashTermResult<SharedTransport> {
        let mut inner = self.inner.write().await;
        if inner.monitor.as_ref().map_or(false, |m| m.is_active()) {
            return Err(FlashTermError::Session {
                message: "Stop the console monitor before programming".to_string(),
            });
        }
        if inner.monitor_pending {
            return Err(FlashTermError::Session {
                message: "Console monitor is starting".to_string(),
            });
        }
        if inner.programming {
            return Err(FlashTermError::Session {
                message: "Programming is already in progress".to_string(),
            });
        }
        match inner.transport.clone() {
            Some(transport) => {
                inner.programming = true;
                Ok(transport)
            }
            None => Err(FlashTermError::DeviceNotConnected),
        }
    }

    async fn run_programming(
        &self,
        transport: &SharedTransport,
        firmware: &FirmwareEntry,
        progress: Option<ProgressFn>,
    ) -> FlashTermResult<()> {
        info!("Programming firmware '{}'", firmware.name);
        let started = Instant::now();

        let mut client = self
            .factory
            .connect(Arc::clone(transport), FLASH_BAUD, Box::new(self.log.clone()))
            .await?;

        let result: FlashTermResult<()> = async {
            client.enter_bootloader(ResetMode::DefaultReset).await?;

            self.log.status("Erasing flash memory...");
            let erase_started = Instant::now();
            client.erase_flash().await?;
            self.log.status(format!(
                "Flash erased in {:.1}s",
                erase_started.elapsed().as_secs_f64()
            ));

            self.log
                .status(format!("Fetching firmware: {}", firmware.source.identifier()));
            let image = fetch_firmware(&firmware.source).await?;
            self.log.status(format!("Firmware image: {} bytes", image.len()));

            client
                .write_flash(WriteOptions {
                    segments: vec![FlashSegment {
                        address: FLASH_OFFSET,
                        data: image,
                    }],
                    flash_size: FlashSizePolicy::Keep,
                    erase_all: false,
                    compress: true,
                    progress,
                    checksum: image_checksum,
                })
                .await?;
            Ok(())
        }
        .await;

        // The device is reset and the port given back even after a failure
        let release_result = client.release().await;
        result?;
        release_result?;

        self.log.notice(format!(
            "Programming finished in {:.1}s",
            started.elapsed().as_secs_f64()
        ));
        Ok(())
    }

    /// Start or stop the console monitor depending on the current phase
    pub async fn toggle_monitor(&self) -> FlashTermResult<()> {
        if self.phase().await == SessionPhase::Monitoring {
            self.stop_monitoring().await
        } else {
            self.start_monitoring().await
        }
    }

    /// Prompt for a reset, wait, then open the console at the monitor baud
    /// rate. An open failure leaves the session connected.
    pub async fn start_monitoring(&self) -> FlashTermResult<()> {
        let transport = match self.claim_monitor_start().await {
            Ok(transport) => transport,
            Err(e) => {
                warn!("Console monitor rejected: {}", e);
                self.log.error(format!("Could not start console: {}", e));
                return Err(e);
            }
        };

        self.log.notice(format!(
            "Reset the device now; console opens in {} seconds...",
            RESET_DELAY.as_secs()
        ));
        // No locks held while the user resets the device
        tokio::time::sleep(RESET_DELAY).await;

        let opened = transport.lock().await.open(MONITOR_BAUD);

        let mut inner = self.inner.write().await;
        inner.monitor_pending = false;
        match opened {
            Ok(()) => {
                if let Some(old) = inner.monitor.take() {
                    old.stop().await;
                }
                self.log.clear();
                inner.monitor = Some(MonitorSession::spawn(
                    Arc::clone(&transport),
                    self.log.clone(),
                ));
                info!("Console monitor started at {} baud", MONITOR_BAUD);
                Ok(())
            }
            Err(e) => {
                self.log.error(format!("Could not open console: {}", e));
                Err(e)
            }
        }
    }

    async fn claim_monitor_start(&self) -> FlashTermResult<SharedTransport> {
        let mut inner = self.inner.write().await;
        if inner.programming {
            return Err(FlashTermError::Session {
                message: "Cannot monitor while programming".to_string(),
            });
        }
        if inner.monitor_pending {
            return Err(FlashTermError::Session {
                message: "Console monitor is already starting".to_string(),
            });
        }
        if inner.monitor.as_ref().map_or(false, |m| m.is_active()) {
            return Err(FlashTermError::Session {
                message: "Console monitor is already running".to_string(),
            });
        }
        match inner.transport.clone() {
            Some(transport) => {
                inner.monitor_pending = true;
                Ok(transport)
            }
            None => Err(FlashTermError::DeviceNotConnected),
        }
    }

    /// Stop the monitor task and close the port
    pub async fn stop_monitoring(&self) -> FlashTermResult<()> {
        let (monitor, transport) = {
            let mut inner = self.inner.write().await;
            match inner.monitor.take() {
                Some(monitor) => (monitor, inner.transport.clone()),
                None => {
                    let e = FlashTermError::Session {
                        message: "Console monitor is not running".to_string(),
                    };
                    self.log.error(format!("Could not stop console: {}", e));
                    return Err(e);
                }
            }
        };

        monitor.stop().await;
        if let Some(transport) = transport {
            transport.lock().await.close();
        }
        info!("Console monitor stopped");
        self.log.notice("Console monitor stopped");
        Ok(())
    }

    /// Reap a monitor task that ended on its own, closing the port so the
    /// session is back in its idle connected state
    pub async fn poll_monitor(&self) {
        let finished = {
            let mut inner = self.inner.write().await;
            let ended = inner.monitor.as_ref().map_or(false, |m| !m.is_active());
            if ended {
                inner.monitor.take().map(|m| (m, inner.transport.clone()))
            } else {
                None
            }
        };

        if let Some((monitor, transport)) = finished {
            monitor.stop().await;
            if let Some(transport) = transport {
                transport.lock().await.close();
            }
            debug!("Console monitor ended");
        }
    }
}

fn port_exists(port_name: &str) -> bool {
    if Path::new(port_name).exists() {
        return true;
    }
    transport::available_ports()
        .map(|ports| ports.iter().any(|p| p.port_name == port_name))
        .unwrap_or(false)
}
