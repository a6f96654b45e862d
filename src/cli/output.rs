use crate::cli::args::OutputFormat;
use crate::domain::config::{FirmwareEntry, FlashTermConfig};
use serde::Serialize;
use serde_json;
use serialport::{SerialPortInfo, SerialPortType};
use std::io;
use tabled::{Table, Tabled};

/// Output writer trait for different formats
pub trait OutputWriter {
    fn write_ports(&self, ports: &[SerialPortInfo]) -> Result<(), OutputError>;
    fn write_firmware(&self, entries: &[FirmwareEntry]) -> Result<(), OutputError>;
    fn write_config(&self, config: &FlashTermConfig) -> Result<(), OutputError>;
    fn write_message(&self, message: &str) -> Result<(), OutputError>;
    fn write_error(&self, error: &str) -> Result<(), OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Table formatting error: {0}")]
    TableError(String),
}

impl From<OutputError> for crate::domain::error::FlashTermError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Console output writer
pub struct ConsoleWriter {
    format: OutputFormat,
}

impl ConsoleWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl OutputWriter for ConsoleWriter {
    fn write_ports(&self, ports: &[SerialPortInfo]) -> Result<(), OutputError> {
        let rows: Vec<PortRow> = ports.iter().map(PortRow::from).collect();
        match self.format {
            OutputFormat::Text => {
                for row in &rows {
                    println!("Port: {}", row.name);
                    println!("  Type: {}", row.kind);
                    if !row.description.is_empty() {
                        println!("  Description: {}", row.description);
                    }
                    println!();
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(&rows)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                if !rows.is_empty() {
                    let table = Table::new(&rows);
                    println!("{}", table);
                }
            }
            OutputFormat::Csv => {
                println!("name,type,description");
                for row in &rows {
                    println!("{},{},{}", row.name, row.kind, row.description);
                }
            }
        }
        Ok(())
    }

    fn write_firmware(&self, entries: &[FirmwareEntry]) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                for entry in entries {
                    println!("Firmware: {}", entry.name);
                    let desc = if entry.description.is_empty() {
                        "No description"
                    } else {
                        &entry.description
                    };
                    println!("  Description: {}", desc);
                    println!("  Source: {}", entry.source.identifier());
                    println!();
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(entries)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                if !entries.is_empty() {
                    let table_data: Vec<FirmwareRow> =
                        entries.iter().map(FirmwareRow::from).collect();
                    let table = Table::new(table_data);
                    println!("{}", table);
                }
            }
            OutputFormat::Csv => {
                println!("name,source,description");
                for entry in entries {
                    println!(
                        "{},{},{}",
                        entry.name,
                        entry.source.identifier(),
                        entry.description
                    );
                }
            }
        }
        Ok(())
    }

    fn write_config(&self, config: &FlashTermConfig) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Text => {
                println!("FlashTerm Configuration:");
                println!("  Log level: {}", config.global.log_level);
                println!("  Auto scroll: {}", config.global.auto_scroll);
                println!("  Log limit: {}", config.global.log_limit);
                match &config.serial.port {
                    Some(port) => println!("  Default port: {}", port),
                    None => println!("  Default port: (none)"),
                }

                if !config.firmware.is_empty() {
                    println!("  Firmware:");
                    for entry in &config.firmware {
                        let desc = if entry.description.is_empty() {
                            "No description"
                        } else {
                            &entry.description
                        };
                        println!("    {}: {}", entry.name, desc);
                    }
                }
            }
            OutputFormat::Json => {
                let output = serde_json::to_string_pretty(config)?;
                println!("{}", output);
            }
            OutputFormat::Table => {
                if !config.firmware.is_empty() {
                    let table_data: Vec<FirmwareRow> =
                        config.firmware.iter().map(FirmwareRow::from).collect();
                    let table = Table::new(table_data);
                    println!("{}", table);
                }
            }
            OutputFormat::Csv => {
                println!("name,source,description");
                for entry in &config.firmware {
                    println!(
                        "{},{},{}",
                        entry.name,
                        entry.source.identifier(),
                        entry.description
                    );
                }
            }
        }
        Ok(())
    }

    fn write_message(&self, message: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "message": message,
                    "level": "info"
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                println!("{}", message);
            }
        }
        Ok(())
    }

    fn write_error(&self, error: &str) -> Result<(), OutputError> {
        match self.format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "error": error,
                    "level": "error"
                });
                eprintln!("{}", serde_json::to_string_pretty(&output)?);
            }
            _ => {
                eprintln!("Error: {}", error);
            }
        }
        Ok(())
    }
}

/// Table row for a serial port
#[derive(Tabled, Serialize)]
struct PortRow {
    name: String,
    #[tabled(rename = "type")]
    kind: String,
    description: String,
}

impl From<&SerialPortInfo> for PortRow {
    fn from(info: &SerialPortInfo) -> Self {
        let (kind, description) = match &info.port_type {
            SerialPortType::UsbPort(usb) => (
                "USB",
                usb.product
                    .clone()
                    .or_else(|| usb.manufacturer.clone())
                    .unwrap_or_default(),
            ),
            SerialPortType::PciPort => ("PCI", String::new()),
            SerialPortType::BluetoothPort => ("Bluetooth", String::new()),
            SerialPortType::Unknown => ("Unknown", String::new()),
        };

        Self {
            name: info.port_name.clone(),
            kind: kind.to_string(),
            description,
        }
    }
}

/// Table row for a firmware catalog entry
#[derive(Tabled)]
struct FirmwareRow {
    name: String,
    source: String,
    description: String,
}

impl From<&FirmwareEntry> for FirmwareRow {
    fn from(entry: &FirmwareEntry) -> Self {
        Self {
            name: entry.name.clone(),
            source: entry.source.identifier(),
            description: entry.description.clone(),
        }
    }
}
