use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{FlasherClient, FlasherFactory, ResetMode, WriteOptions};
use crate::core::log::TerminalSink;
use crate::domain::error::{FlashTermError, FlashTermResult};
use crate::infrastructure::serial::transport::SharedTransport;

const STEP_DELAY: Duration = Duration::from_millis(5);
const CHUNK_DELAY: Duration = Duration::from_millis(1);
const WRITE_CHUNK: usize = 4096;

/// Programming step a simulated failure can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStep {
    EnterBootloader,
    Erase,
    Write,
    Release,
}

impl SimStep {
    fn label(&self) -> &'static str {
        match self {
            SimStep::EnterBootloader => "bootloader entry",
            SimStep::Erase => "erase",
            SimStep::Write => "write",
            SimStep::Release => "reset",
        }
    }
}

/// Backend that emulates a flash tool against in-memory storage.
///
/// It never touches the OS device, so sessions can be exercised without
/// hardware. Written images land in a shared byte vector that tests and
/// demos can inspect.
pub struct SimFlasherFactory {
    chip: String,
    storage: Arc<Mutex<Vec<u8>>>,
    fail_at: Option<SimStep>,
}

impl SimFlasherFactory {
    pub fn new() -> Self {
        Self::with_chip("ESP32-S3")
    }

    pub fn with_chip(chip: impl Into<String>) -> Self {
        Self {
            chip: chip.into(),
            storage: Arc::new(Mutex::new(Vec::new())),
            fail_at: None,
        }
    }

    /// Backend that fails at the given step, for exercising error paths
    pub fn failing_at(step: SimStep) -> Self {
        Self {
            fail_at: Some(step),
            ..Self::new()
        }
    }

    /// Handle to the emulated flash contents
    pub fn storage(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.storage)
    }
}

impl Default for SimFlasherFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlasherFactory for SimFlasherFactory {
    async fn connect(
        &self,
        transport: SharedTransport,
        baud_rate: u32,
        mut sink: Box<dyn TerminalSink>,
    ) -> FlashTermResult<Box<dyn FlasherClient>> {
        let port_name = transport.lock().await.port_name().to_string();
        debug!("Simulated flasher connecting to {}", port_name);

        sink.write_line(&format!("Serial port {}", port_name));
        sink.write_line("Connecting....");
        sink.write_line(&format!("Changing baud rate to {}", baud_rate));
        tokio::time::sleep(STEP_DELAY).await;

        Ok(Box::new(SimFlasher {
            chip: self.chip.clone(),
            sink,
            storage: Arc::clone(&self.storage),
            fail_at: self.fail_at,
        }))
    }
}

struct SimFlasher {
    chip: String,
    sink: Box<dyn TerminalSink>,
    storage: Arc<Mutex<Vec<u8>>>,
    fail_at: Option<SimStep>,
}

impl SimFlasher {
    fn trip(&self, step: SimStep) -> FlashTermResult<()> {
        if self.fail_at == Some(step) {
            return Err(FlashTermError::Flasher(format!(
                "simulated {} failure",
                step.label()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl FlasherClient for SimFlasher {
    async fn enter_bootloader(&mut self, mode: ResetMode) -> FlashTermResult<()> {
        self.trip(SimStep::EnterBootloader)?;

        if mode == ResetMode::NoReset {
            self.sink.write_line("Skipping reset, assuming bootloader is active");
        }
        tokio::time::sleep(STEP_DELAY).await;
        self.sink.write_line(&format!("Chip is {}", self.chip));
        Ok(())
    }

    async fn erase_flash(&mut self) -> FlashTermResult<()> {
        self.trip(SimStep::Erase)?;

        self.sink.write_line("Erasing flash (this may take a while)...");
        tokio::time::sleep(STEP_DELAY).await;
        if let Ok(mut storage) = self.storage.lock() {
            storage.clear();
        }
        self.sink.write_line("Chip erase completed");
        Ok(())
    }

    async fn write_flash(&mut self, mut options: WriteOptions) -> FlashTermResult<()> {
        self.trip(SimStep::Write)?;

        let total: u64 = options.segments.iter().map(|s| s.data.len() as u64).sum();
        if options.compress {
            self.sink
                .write_line(&format!("Compressed {} bytes to {}...", total, total * 6 / 10));
        }

        let mut written: u64 = 0;
        for segment in &options.segments {
            let mut offset = 0;
            while offset < segment.data.len() {
                let end = (offset + WRITE_CHUNK).min(segment.data.len());
                let address = segment.address as usize + offset;

                if let Ok(mut storage) = self.storage.lock() {
                    if storage.len() < address + (end - offset) {
                        storage.resize(address + (end - offset), 0xFF);
                    }
                    storage[address..address + (end - offset)]
                        .copy_from_slice(&segment.data[offset..end]);
                }

                written += (end - offset) as u64;
                let percent = if total == 0 { 100 } else { written * 100 / total };
                self.sink
                    .write(&format!("Writing at 0x{:08x}... ({} %)", address, percent));
                if let Some(progress) = options.progress.as_mut() {
                    progress(written, total);
                }

                tokio::time::sleep(CHUNK_DELAY).await;
                offset = end;
            }
        }

        let image: Vec<u8> = options
            .segments
            .iter()
            .flat_map(|s| s.data.iter().copied())
            .collect();
        let checksum = (options.checksum)(&image);
        self.sink
            .write_line(&format!("Wrote {} bytes (checksum 0x{:02x})", total, checksum));
        self.sink.write_line("Hash of data verified.");
        Ok(())
    }

    async fn release(&mut self) -> FlashTermResult<()> {
        self.trip(SimStep::Release)?;

        self.sink.write_line("Hard resetting via RTS pin...");
        tokio::time::sleep(STEP_DELAY).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flasher::{image_checksum, FlashSegment, FlashSizePolicy};
    use crate::core::log::SharedLog;
    use crate::infrastructure::serial::transport::SerialTransport;

    fn write_options(data: Vec<u8>) -> WriteOptions {
        WriteOptions {
            segments: vec![FlashSegment { address: 0x0, data }],
            ..WriteOptions::default()
        }
    }

    async fn run_sequence(
        factory: &SimFlasherFactory,
        log: &SharedLog,
        options: WriteOptions,
    ) -> FlashTermResult<()> {
        let transport = SerialTransport::shared("/dev/ttySIM0");
        let mut client = factory
            .connect(transport, 921_600, Box::new(log.clone()))
            .await?;

        let result = async {
            client.enter_bootloader(ResetMode::DefaultReset).await?;
            client.erase_flash().await?;
            client.write_flash(options).await?;
            Ok(())
        }
        .await;

        client.release().await?;
        result
    }

    #[tokio::test]
    async fn test_image_lands_in_storage() {
        let factory = SimFlasherFactory::new();
        let storage = factory.storage();
        let log = SharedLog::new(100);
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        run_sequence(&factory, &log, write_options(data.clone()))
            .await
            .unwrap();

        assert_eq!(*storage.lock().unwrap(), data);
    }

    #[tokio::test]
    async fn test_sink_receives_tool_output() {
        let factory = SimFlasherFactory::with_chip("ESP32-C3");
        let log = SharedLog::new(100);

        run_sequence(&factory, &log, write_options(vec![0xAA; 100]))
            .await
            .unwrap();

        let texts: Vec<String> = log.snapshot().iter().map(|e| e.text.clone()).collect();
        assert!(texts.iter().any(|t| t == "Chip is ESP32-C3"));
        assert!(texts.iter().any(|t| t == "Hash of data verified."));
        assert!(texts.iter().any(|t| t == "Hard resetting via RTS pin..."));
        // All progress updates collapse into one entry
        assert_eq!(texts.iter().filter(|t| t.starts_with("Writing at")).count(), 1);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_complete() {
        let factory = SimFlasherFactory::new();
        let log = SharedLog::new(100);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);

        let mut options = write_options(vec![0x55; 10_000]);
        options.progress = Some(Box::new(move |written, total| {
            recorded.lock().unwrap().push((written, total));
        }));

        run_sequence(&factory, &log, options).await.unwrap();

        let calls = calls.lock().unwrap();
        assert!(!calls.is_empty());
        assert!(calls.windows(2).all(|w| w[0].0 <= w[1].0));
        assert_eq!(calls.last().unwrap(), &(10_000, 10_000));
    }

    #[tokio::test]
    async fn test_checksum_reported() {
        let factory = SimFlasherFactory::new();
        let log = SharedLog::new(100);
        let data = vec![0x12, 0x34, 0x56];
        let expected = image_checksum(&data);

        run_sequence(&factory, &log, write_options(data)).await.unwrap();

        let texts: Vec<String> = log.snapshot().iter().map(|e| e.text.clone()).collect();
        assert!(texts
            .iter()
            .any(|t| t.contains(&format!("checksum 0x{:02x}", expected))));
    }

    #[tokio::test]
    async fn test_erase_failure_leaves_storage_untouched() {
        let factory = SimFlasherFactory::failing_at(SimStep::Erase);
        let storage = factory.storage();
        storage.lock().unwrap().extend_from_slice(&[1, 2, 3]);
        let log = SharedLog::new(100);

        let result = run_sequence(&factory, &log, write_options(vec![9; 10])).await;

        assert!(result.is_err());
        assert_eq!(*storage.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_flash_size_policy_defaults_hold() {
        let options = write_options(vec![0; 4]);
        assert_eq!(options.flash_size, FlashSizePolicy::Keep);
        assert!(!options.erase_all);
        assert!(options.compress);
    }
}
