use crate::domain::{
    config::{FirmwareEntry, FirmwareSource, FlashTermConfig},
    error::{FlashTermError, FlashTermResult},
};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> FlashTermResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = Self::find_project_config_path();

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Load configuration from files
    pub fn load_config(&self) -> FlashTermResult<FlashTermConfig> {
        // Start with default configuration
        let mut config = FlashTermConfig::default();

        // Load global configuration if exists
        if self.global_config_path.exists() {
            let global_config = self.load_config_from_path(&self.global_config_path)?;
            config.global = global_config.global;
            config.serial = global_config.serial;
            config.firmware.extend(global_config.firmware);
        }

        // Load and merge project configuration if exists
        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project_config = self.load_config_from_path(project_path)?;
                // Merge project firmware entries with existing entries
                config.firmware.extend(project_config.firmware);
                if project_config.serial.port.is_some() {
                    config.serial.port = project_config.serial.port;
                }
            }
        }

        Ok(config)
    }

    /// Save configuration to files
    pub fn save_config(&self, config: &FlashTermConfig) -> FlashTermResult<()> {
        // Ensure global config directory exists
        if let Some(parent) = self.global_config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| FlashTermError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        // Save global configuration; firmware entries live in project files
        let global_config = FlashTermConfig {
            global: config.global.clone(),
            serial: config.serial.clone(),
            firmware: Vec::new(),
        };
        self.save_config_to_path(&self.global_config_path, &global_config)?;

        // Save project configuration if path is available
        if let Some(project_path) = &self.project_config_path {
            let project_config = FlashTermConfig {
                global: crate::domain::config::GlobalConfig::default(),
                serial: crate::domain::config::SerialDefaults::default(),
                firmware: config.firmware.clone(),
            };

            // Ensure project config directory exists
            if let Some(parent) = project_path.parent() {
                fs::create_dir_all(parent).map_err(|e| FlashTermError::Config {
                    message: format!("Failed to create project config directory: {}", e),
                })?;
            }

            self.save_config_to_path(project_path, &project_config)?;
        }

        Ok(())
    }

    /// Get global configuration path
    fn get_global_config_path() -> FlashTermResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| FlashTermError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join("flashterm").join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut path = current_dir.as_path();

        loop {
            let config_path = path.join(".flashterm").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> FlashTermResult<FlashTermConfig> {
        let content = fs::read_to_string(path).map_err(|e| FlashTermError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| FlashTermError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &FlashTermConfig) -> FlashTermResult<()> {
        let content = toml::to_string_pretty(config).map_err(|e| FlashTermError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| FlashTermError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration
    pub fn init_project_config(&self, path: &Path) -> FlashTermResult<()> {
        let config_dir = path.join(".flashterm");
        let config_file = config_dir.join("config.toml");

        if config_file.exists() {
            return Err(FlashTermError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        fs::create_dir_all(&config_dir).map_err(|e| FlashTermError::Config {
            message: format!("Failed to create .flashterm directory: {}", e),
        })?;

        let default_config = FlashTermConfig {
            global: crate::domain::config::GlobalConfig::default(),
            serial: crate::domain::config::SerialDefaults::default(),
            firmware: vec![
                FirmwareEntry {
                    name: "example_app".to_string(),
                    description: "Application image from the local build".to_string(),
                    source: FirmwareSource::Path {
                        path: std::path::PathBuf::from("firmware/app.bin"),
                    },
                },
                FirmwareEntry {
                    name: "example_release".to_string(),
                    description: "Released image fetched on demand".to_string(),
                    source: FirmwareSource::Url {
                        url: "https://example.com/firmware/release.bin".to_string(),
                    },
                },
            ],
        };

        self.save_config_to_path(&config_file, &default_config)?;

        Ok(())
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_manager_creation() {
        let _manager = ConfigManager::new().unwrap();
    }

    #[test]
    fn test_init_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new().unwrap();

        manager.init_project_config(temp_dir.path()).unwrap();

        let config_file = temp_dir.path().join(".flashterm").join("config.toml");
        assert!(config_file.exists());

        let content = fs::read_to_string(&config_file).unwrap();
        let config: FlashTermConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.firmware.len(), 2);
    }

    #[test]
    fn test_init_project_config_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new().unwrap();

        manager.init_project_config(temp_dir.path()).unwrap();
        assert!(manager.init_project_config(temp_dir.path()).is_err());
    }

    #[test]
    fn test_round_trip_through_path() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = FlashTermConfig::default();
        config.serial.port = Some("/dev/ttyACM0".to_string());
        config.firmware.push(FirmwareEntry {
            name: "nightly".to_string(),
            description: "Nightly build".to_string(),
            source: FirmwareSource::Url {
                url: "https://example.com/nightly.bin".to_string(),
            },
        });

        manager.save_config_to_path(&path, &config).unwrap();
        let loaded = manager.load_config_from_path(&path).unwrap();

        assert_eq!(loaded.serial.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(loaded.firmware.len(), 1);
        assert_eq!(loaded.firmware[0].name, "nightly");
    }
}
