//! CLI command implementations

pub mod import;
pub mod logs;
pub mod lookups;

use std::path::PathBuf;

use anyhow::{Context, Result};
use finboard_core::services::{EntryPoint, LogEvent, LoggingService};
use finboard_core::FinboardContext;
use tokio::runtime::Runtime;

/// Get the logging service for CLI operations
///
/// Returns None if the event log cannot be opened; logging never blocks a command.
pub fn get_logger() -> Option<LoggingService> {
    let finboard_dir = get_finboard_dir().ok()?;
    std::fs::create_dir_all(&finboard_dir).ok()?;
    LoggingService::new(&finboard_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// `$FINBOARD_DIR`, or `~/.finboard`
pub fn get_finboard_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINBOARD_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".finboard"))
}

pub fn get_context() -> Result<FinboardContext> {
    let finboard_dir = get_finboard_dir()?;

    std::fs::create_dir_all(&finboard_dir)
        .with_context(|| format!("Failed to create finboard directory: {:?}", finboard_dir))?;

    FinboardContext::new(&finboard_dir).context("Failed to initialize finboard context")
}

/// Single-threaded runtime: one API call in flight at a time
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}
