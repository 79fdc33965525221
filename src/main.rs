//! Network Quality Probe - Main CLI Application
//!
//! Measures jitter/VoIP-MOS, throughput/latency and video rebuffering over
//! the current network path and prints a combined summary.

use clap::Parser;
use network_quality_probe::{
    app::App,
    cli::Cli,
    error::{AppError, ErrorReporter},
};
use std::process;

#[tokio::main]
async fn main() {
    // Set up better panic handling
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    let use_color = cli.use_colors();
    let verbose = cli.verbose;

    if let Err(e) = run_application(cli).await {
        let reporter = ErrorReporter::new(use_color, verbose);
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run_application(cli: Cli) -> network_quality_probe::Result<()> {
    let app = App::from_cli(cli)?;
    app.run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::Validation(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Check your .env file format and NQP_* variables");
            eprintln!("  - Verify URL formats (must start with http:// or https://)");
            eprintln!("  - Run with --help to see all options");
        }
        AppError::Transport(_) | AppError::HttpRequest(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - Try different endpoints with --url");
            eprintln!("  - Verify firewall settings");
        }
        AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Timeout troubleshooting:");
            eprintln!("  - Increase the timeout with --timeout");
            eprintln!("  - Reduce the transfer size with --payload");
        }
        AppError::Media(_) | AppError::DegenerateInput(_) => {
            eprintln!();
            eprintln!("Video probe help:");
            eprintln!("  - Verify the media URL is reachable");
            eprintln!("  - Pass the clip's real length with --video-duration");
        }
        _ => {}
    }
}
