pub mod sim;

use async_trait::async_trait;

use crate::core::log::TerminalSink;
use crate::domain::error::FlashTermResult;
use crate::infrastructure::serial::transport::SharedTransport;

pub use sim::{SimFlasherFactory, SimStep};

/// How the device should be put into its bootloader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Toggle the control lines the usual way
    DefaultReset,
    /// Assume the device is already in the bootloader
    NoReset,
}

/// Flash size handling during a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashSizePolicy {
    /// Leave the size field in the image header untouched
    #[default]
    Keep,
    /// Detect the size from the chip
    Detect,
}

/// One contiguous region of image data to write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashSegment {
    pub address: u32,
    pub data: Vec<u8>,
}

/// Progress callback: (bytes written, total bytes)
pub type ProgressFn = Box<dyn FnMut(u64, u64) + Send>;

/// Image checksum function handed to the backend
pub type ChecksumFn = fn(&[u8]) -> u8;

/// XOR fold over the image bytes with the bootloader's seed value
pub fn image_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0xEF, |acc, byte| acc ^ byte)
}

/// Everything a single flash write needs
pub struct WriteOptions {
    pub segments: Vec<FlashSegment>,
    pub flash_size: FlashSizePolicy,
    pub erase_all: bool,
    pub compress: bool,
    pub progress: Option<ProgressFn>,
    pub checksum: ChecksumFn,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            flash_size: FlashSizePolicy::Keep,
            erase_all: false,
            compress: true,
            progress: None,
            checksum: image_checksum,
        }
    }
}

/// A connected flasher backend.
///
/// Obtained from a [`FlasherFactory`]; the caller drives the programming
/// sequence step by step and must call [`release`](FlasherClient::release)
/// once, whether the earlier steps succeeded or not.
#[async_trait]
pub trait FlasherClient: Send {
    /// Put the device into its bootloader
    async fn enter_bootloader(&mut self, mode: ResetMode) -> FlashTermResult<()>;

    /// Erase the flash regions the coming write will cover
    async fn erase_flash(&mut self) -> FlashTermResult<()>;

    /// Write the image segments
    async fn write_flash(&mut self, options: WriteOptions) -> FlashTermResult<()>;

    /// Reset the device out of the bootloader and give up the port
    async fn release(&mut self) -> FlashTermResult<()>;
}

/// Creates flasher backends bound to a transport.
///
/// Implementations open the port themselves at the requested baud rate and
/// close it again in [`FlasherClient::release`]. Backend output goes through
/// the supplied sink.
#[async_trait]
pub trait FlasherFactory: Send + Sync {
    async fn connect(
        &self,
        transport: SharedTransport,
        baud_rate: u32,
        sink: Box<dyn TerminalSink>,
    ) -> FlashTermResult<Box<dyn FlasherClient>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_seed() {
        assert_eq!(image_checksum(&[]), 0xEF);
        assert_eq!(image_checksum(&[0xEF]), 0x00);
    }

    #[test]
    fn test_checksum_folds_all_bytes() {
        assert_eq!(image_checksum(&[0x01, 0x02, 0x04]), 0xEF ^ 0x07);
        // XOR is order independent
        assert_eq!(image_checksum(&[0x04, 0x02, 0x01]), image_checksum(&[0x01, 0x02, 0x04]));
    }

    #[test]
    fn test_write_options_defaults() {
        let options = WriteOptions::default();
        assert_eq!(options.flash_size, FlashSizePolicy::Keep);
        assert!(!options.erase_all);
        assert!(options.compress);
        assert!(options.segments.is_empty());
        assert!(options.progress.is_none());
    }
}
