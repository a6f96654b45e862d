use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for FlashTerm
#[derive(Parser, Debug)]
#[command(
    name = "flashterm",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serial firmware flasher and console monitor for embedded devices",
    long_about = "Programs firmware images onto embedded devices over a serial port and follows their console output, with a catalog of named images and an interactive TUI."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive TUI mode
    Tui,
    /// List available serial ports
    Ports,
    /// List firmware images in the catalog
    Firmware,
    /// Program a firmware image onto a device
    Flash(FlashArgs),
    /// Follow the device console
    Monitor(MonitorArgs),
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
    /// CSV output
    Csv,
}

/// Flash command arguments
#[derive(ClapArgs, Debug)]
pub struct FlashArgs {
    /// Firmware name from the catalog, or a path or URL
    pub firmware: Option<String>,

    /// Serial port path
    #[arg(short, long)]
    pub port: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Monitor command arguments
#[derive(ClapArgs, Debug)]
pub struct MonitorArgs {
    /// Serial port path
    #[arg(short, long)]
    pub port: Option<String>,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Validate configuration
    Validate {
        /// Configuration file path
        file: Option<String>,
    },
    /// Create default project configuration
    Init,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Text
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
