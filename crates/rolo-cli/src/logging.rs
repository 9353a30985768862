//! Logging setup
//!
//! Nothing is logged unless ROLO_LOG is set to a level (`debug`, `info`, ...).
//! CLI commands log to stderr; the TUI owns the terminal and logs to a file.

use std::fs::File;
use std::sync::Mutex;

use rolo_core::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ROLO_LOG";

/// Filter covering the core library and this binary
fn filter_directives(level: &str) -> String {
    format!("rolo_core={level},rolo={level}", level = level)
}

/// Initialize logging for command-line mode
pub fn init_cli_logging() {
    let Ok(log_level) = std::env::var(LOG_ENV) else {
        return;
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directives(&log_level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Initialize logging for TUI mode
///
/// Logs to file (config.log_file or default {data_dir}/debug.log).
pub fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var(LOG_ENV) else {
        return;
    };

    let log_path = config.log_path();

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directives(&log_level)))
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
