use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// FlashTerm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashTermConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Serial port defaults
    #[serde(default)]
    pub serial: SerialDefaults,
    /// Firmware catalog entries
    #[serde(default)]
    pub firmware: Vec<FirmwareEntry>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Follow the newest log entry in the TUI
    #[serde(default = "default_auto_scroll")]
    pub auto_scroll: bool,
    /// Maximum number of retained display log entries
    #[serde(default = "default_log_limit")]
    pub log_limit: usize,
}

/// Serial port defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerialDefaults {
    /// Preferred port name; skips the interactive picker when set
    #[serde(default)]
    pub port: Option<String>,
}

/// Firmware catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirmwareEntry {
    /// Entry name shown in the selector
    pub name: String,
    /// Entry description
    #[serde(default)]
    pub description: String,
    /// Where the image bytes come from
    pub source: FirmwareSource,
}

/// Firmware image source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FirmwareSource {
    #[serde(rename = "url")]
    Url { url: String },
    #[serde(rename = "path")]
    Path { path: PathBuf },
}

impl FirmwareSource {
    /// Parse an identifier string: http(s) schemes become URLs, anything
    /// else is treated as a filesystem path.
    pub fn parse(identifier: &str) -> Self {
        if identifier.starts_with("http://") || identifier.starts_with("https://") {
            FirmwareSource::Url {
                url: identifier.to_string(),
            }
        } else {
            FirmwareSource::Path {
                path: PathBuf::from(identifier),
            }
        }
    }

    /// Identifier string for display
    pub fn identifier(&self) -> String {
        match self {
            FirmwareSource::Url { url } => url.clone(),
            FirmwareSource::Path { path } => path.display().to_string(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_auto_scroll() -> bool {
    true
}

fn default_log_limit() -> usize {
    1000
}

impl Default for FlashTermConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            serial: SerialDefaults::default(),
            firmware: Vec::new(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            auto_scroll: default_auto_scroll(),
            log_limit: default_log_limit(),
        }
    }
}
