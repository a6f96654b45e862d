use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::config::{FirmwareEntry, FirmwareSource, FlashTermConfig};
use crate::domain::error::{FlashTermError, FlashTermResult};

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Named firmware images the user can pick from.
///
/// The catalog starts with the built-in entries and grows with whatever the
/// configuration files add. Identifiers that match no entry are treated as
/// ad-hoc paths or URLs.
pub struct FirmwareCatalog {
    entries: Vec<FirmwareEntry>,
}

impl FirmwareCatalog {
    pub fn new() -> Self {
        Self {
            entries: vec![FirmwareEntry {
                name: "app".to_string(),
                description: "Application image from the local build directory".to_string(),
                source: FirmwareSource::Path {
                    path: PathBuf::from("firmware/app.bin"),
                },
            }],
        }
    }

    /// Built-in entries plus everything the configuration declares
    pub fn from_config(config: &FlashTermConfig) -> Self {
        let mut catalog = Self::new();
        catalog.entries.extend(config.firmware.iter().cloned());
        catalog
    }

    pub fn entries(&self) -> &[FirmwareEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&FirmwareEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Resolve an identifier to an entry, falling back to an ad-hoc
    /// path or URL entry when no catalog name matches
    pub fn resolve(&self, identifier: &str) -> FirmwareEntry {
        match self.find(identifier) {
            Some(entry) => entry.clone(),
            None => FirmwareEntry {
                name: identifier.to_string(),
                description: String::new(),
                source: FirmwareSource::parse(identifier),
            },
        }
    }
}

impl Default for FirmwareCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the firmware image bytes for a source.
///
/// Local paths read from disk; URLs download on a blocking worker so the
/// async runtime is not stalled by the HTTP client.
pub async fn fetch_firmware(source: &FirmwareSource) -> FlashTermResult<Vec<u8>> {
    match source {
        FirmwareSource::Path { path } => {
            debug!("Reading firmware image from {}", path.display());
            tokio::fs::read(path).await.map_err(|e| {
                FlashTermError::Fetch(format!("Failed to read {}: {}", path.display(), e))
            })
        }
        FirmwareSource::Url { url } => {
            info!("Downloading firmware image from {}", url);
            let url = url.clone();
            tokio::task::spawn_blocking(move || {
                let response = ureq::get(&url)
                    .timeout(FETCH_TIMEOUT)
                    .call()
                    .map_err(|e| FlashTermError::Fetch(format!("Failed to fetch {}: {}", url, e)))?;

                let mut data = Vec::new();
                response
                    .into_reader()
                    .read_to_end(&mut data)
                    .map_err(|e| {
                        FlashTermError::Fetch(format!("Failed to read response from {}: {}", url, e))
                    })?;
                Ok(data)
            })
            .await
            .map_err(|e| FlashTermError::Fetch(format!("Download task failed: {}", e)))?
        }
    }
}
