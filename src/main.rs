// FlashTerm - Serial Firmware Flasher and Console Monitor
mod cli;
mod tui;
mod core;
mod domain;
mod infrastructure;

use clap::Parser;
use cli::args::{Args, Command};
use cli::commands::execute_command;
use domain::error::FlashTermError;

#[tokio::main]
async fn main() -> Result<(), FlashTermError> {
    let args = Args::parse();

    match &args.command {
        Command::Tui => {
            execute_command(args).await?;
            Ok(())
        }
        _ => {
            match execute_command(args).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
