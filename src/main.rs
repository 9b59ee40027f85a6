//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `username_probe` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Interrupt wiring
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::process;
use tokio_util::sync::CancellationToken;

use username_probe::{install_interrupt_handler, run_scan_with, Config, INTERRUPT_EXIT_CODE};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    env_logger::Builder::from_default_env()
        .filter_level(config.log_level.clone().into())
        .init();

    let cancel = CancellationToken::new();
    install_interrupt_handler(cancel.clone());

    match run_scan_with(&config, cancel).await {
        Ok(report) => {
            let summary = format!(
                "Found {} confirmed profile{} across {} checked site{} in {:.1}s",
                report.confirmed.len(),
                if report.confirmed.len() == 1 { "" } else { "s" },
                report.completed,
                if report.completed == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            if report.interrupted {
                println!("{}", "Scan interrupted; partial results saved".yellow());
            }
            println!("{}", summary.green());
            println!("Results saved in {}", report.text_path.display());

            if report.interrupted {
                process::exit(INTERRUPT_EXIT_CODE);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("username_probe error: {:#}", e);
            process::exit(1);
        }
    }
}
