use crate::cli::args::{Args, Command, ConfigCommand, FlashArgs, MonitorArgs};
use crate::cli::output::{ConsoleWriter, OutputWriter};
use crate::core::flasher::{ProgressFn, SimFlasherFactory};
use crate::core::log::{LogEntry, LogKind, SharedLog};
use crate::core::session::{SessionController, SessionPhase};
use crate::domain::config::FlashTermConfig;
use crate::domain::error::FlashTermError;
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::firmware::FirmwareCatalog;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::serial::available_ports;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

const TAIL_INTERVAL: Duration = Duration::from_millis(100);

/// Execute CLI command
pub async fn execute_command(args: Args) -> Result<(), FlashTermError> {
    let writer = ConsoleWriter::new(args.output.clone());

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    // Initialize logging
    if !args.quiet && !matches!(args.command, Command::Tui) {
        init_logging(&config.global.log_level, args.verbose).map_err(|e| {
            FlashTermError::Config {
                message: format!("Failed to initialize logging: {}", e),
            }
        })?;
    }

    let catalog = FirmwareCatalog::from_config(&config);

    match args.command {
        Command::Tui => {
            let mut app = crate::tui::app::App::new(&config)?;
            app.run().await
        }
        Command::Ports => {
            let ports = available_ports()?;
            writer.write_ports(&ports)?;
            Ok(())
        }
        Command::Firmware => {
            writer.write_firmware(catalog.entries())?;
            Ok(())
        }
        Command::Flash(flash_args) => {
            execute_flash_command(flash_args, &writer, &config, &catalog).await
        }
        Command::Monitor(monitor_args) => {
            execute_monitor_command(monitor_args, &writer, &config).await
        }
        Command::Config(config_args) => {
            execute_config_command(config_args, &writer, &config, &config_manager).await
        }
        Command::Version => {
            writer.write_message(&format!("flashterm {}", env!("CARGO_PKG_VERSION")))?;
            Ok(())
        }
    }
}

async fn execute_flash_command(
    args: FlashArgs,
    writer: &ConsoleWriter,
    config: &FlashTermConfig,
    catalog: &FirmwareCatalog,
) -> Result<(), FlashTermError> {
    let port = resolve_port(args.port, config)?;
    let identifier = args.firmware.as_deref().unwrap_or("app");
    let firmware = catalog.resolve(identifier);

    if !args.yes {
        let prompt = format!(
            "This will erase the flash on {} and write '{}'. Continue? [y/N] ",
            port, firmware.name
        );
        if !confirm(&prompt)? {
            writer.write_message("Aborted")?;
            return Ok(());
        }
    }

    let controller = SessionController::new(
        Arc::new(SimFlasherFactory::new()),
        config.global.log_limit,
    );
    controller.connect(&port).await?;
    let log = controller.log();

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .map_err(|e| FlashTermError::Output(format!("Invalid progress template: {}", e)))?
            .progress_chars("#>-"),
    );

    let progress_bar = bar.clone();
    let progress: ProgressFn = Box::new(move |written, total| {
        if progress_bar.length() != Some(total) {
            progress_bar.set_length(total);
        }
        progress_bar.set_position(written);
    });

    // Backend output streams above the bar; raw progress lines are covered
    // by the bar itself
    let mut tail = LogTail::new();
    let emit_bar = bar.clone();
    let mut emit = move |entry: &LogEntry| {
        if entry.kind != LogKind::Progress {
            emit_bar.println(&entry.text);
        }
    };

    let result = drive_with_tail(
        controller.program(&firmware, Some(progress)),
        &log,
        &mut tail,
        &mut emit,
    )
    .await;

    bar.finish_and_clear();
    result
}

async fn execute_monitor_command(
    args: MonitorArgs,
    writer: &ConsoleWriter,
    config: &FlashTermConfig,
) -> Result<(), FlashTermError> {
    let port = resolve_port(args.port, config)?;

    let controller = SessionController::new(
        Arc::new(SimFlasherFactory::new()),
        config.global.log_limit,
    );
    controller.connect(&port).await?;
    let log = controller.log();

    writer.write_message(&format!("Monitoring {} (Press Ctrl+C to stop)", port))?;

    let mut tail = LogTail::new();
    let mut emit = |entry: &LogEntry| println!("{}", entry.text);

    drive_with_tail(controller.start_monitoring(), &log, &mut tail, &mut emit).await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                if controller.phase().await == SessionPhase::Monitoring {
                    controller.stop_monitoring().await?;
                }
                tail.drain(&log, &mut emit);
                break;
            }
            _ = tokio::time::sleep(TAIL_INTERVAL) => {
                tail.drain(&log, &mut emit);
                // The monitor ends on its own when the device goes away
                if controller.phase().await != SessionPhase::Monitoring {
                    controller.poll_monitor().await;
                    tail.drain(&log, &mut emit);
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn execute_config_command(
    args: crate::cli::args::ConfigArgs,
    writer: &ConsoleWriter,
    config: &FlashTermConfig,
    config_manager: &ConfigManager,
) -> Result<(), FlashTermError> {
    match args.command {
        ConfigCommand::Show => {
            writer.write_config(config)?;
            Ok(())
        }
        ConfigCommand::Validate { file } => {
            if let Some(config_path) = file {
                match config_manager.load_config_from_path(config_path.as_ref()) {
                    Ok(_) => writer.write_message(&format!(
                        "Configuration file '{}' is valid",
                        config_path
                    ))?,
                    Err(e) => {
                        writer.write_error(&format!("Configuration validation failed: {}", e))?
                    }
                }
            } else {
                match config_manager.load_config() {
                    Ok(_) => writer.write_message("Current configuration is valid")?,
                    Err(e) => {
                        writer.write_error(&format!("Configuration validation failed: {}", e))?
                    }
                }
            }
            Ok(())
        }
        ConfigCommand::Init => {
            let current_dir = std::env::current_dir().map_err(|e| FlashTermError::Config {
                message: format!("Failed to get current directory: {}", e),
            })?;
            config_manager.init_project_config(&current_dir)?;
            writer.write_message("Project configuration initialized in current directory")?;
            Ok(())
        }
    }
}

/// Tracks which display log entries have already been printed
struct LogTail {
    printed: u64,
}

impl LogTail {
    fn new() -> Self {
        Self { printed: 0 }
    }

    fn drain(&mut self, log: &SharedLog, emit: &mut impl FnMut(&LogEntry)) {
        let total = log.total_pushed();
        let entries = log.snapshot();
        let new = (total - self.printed) as usize;
        let start = entries.len().saturating_sub(new);
        for entry in &entries[start..] {
            emit(entry);
        }
        self.printed = total;
    }
}

/// Await a session operation while echoing new display log entries
async fn drive_with_tail<T>(
    future: impl std::future::Future<Output = T>,
    log: &SharedLog,
    tail: &mut LogTail,
    emit: &mut impl FnMut(&LogEntry),
) -> T {
    tokio::pin!(future);
    loop {
        tokio::select! {
            result = &mut future => {
                tail.drain(log, emit);
                return result;
            }
            _ = tokio::time::sleep(TAIL_INTERVAL) => {
                tail.drain(log, emit);
            }
        }
    }
}

fn resolve_port(requested: Option<String>, config: &FlashTermConfig) -> Result<String, FlashTermError> {
    requested
        .or_else(|| config.serial.port.clone())
        .ok_or_else(|| {
            FlashTermError::InvalidInput(
                "no serial port given; use --port or set serial.port in the configuration"
                    .to_string(),
            )
        })
}

fn confirm(prompt: &str) -> Result<bool, FlashTermError> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
