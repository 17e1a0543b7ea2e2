//! Logs command - view and manage the event log

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_finboard_dir;
use crate::output::{self, format_timestamp};
use finboard_core::services::{EntryPoint, LoggingService};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only errors
        #[arg(long)]
        errors: bool,
        /// Show every event of one import
        #[arg(long)]
        import: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete log entries
    Clear {
        /// Only delete entries older than N days
        #[arg(long)]
        older_than_days: Option<u64>,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show event counts and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let finboard_dir = get_finboard_dir()?;
    std::fs::create_dir_all(&finboard_dir)?;
    LoggingService::new(&finboard_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List {
            limit,
            errors,
            import,
            json,
        } => {
            let service = get_logging_service()?;
            let entries = match (&import, errors) {
                (Some(id), _) => service.get_import(id)?,
                (None, true) => service.get_errors(limit)?,
                (None, false) => service.get_recent(limit)?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Event", "Import", "Row", "Error"]);

            for entry in &entries {
                // First block of the uuid is enough to tell imports apart
                let import_short = entry
                    .import_id
                    .as_deref()
                    .map(|id| id.split('-').next().unwrap_or(id).to_string())
                    .unwrap_or_default();
                let error = match &entry.error_message {
                    Some(msg) => msg.red().to_string(),
                    None => String::new(),
                };

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.event.clone(),
                    import_short,
                    entry.row_number.map(|r| r.to_string()).unwrap_or_default(),
                    error,
                ]);
            }

            println!("{}", table);
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let service = get_logging_service()?;

            let prompt = match older_than_days {
                Some(days) => format!("Delete log entries older than {} days?", days),
                None => "Delete all log entries?".to_string(),
            };
            if !force && !json {
                use dialoguer::Confirm;
                if !Confirm::new().with_prompt(prompt).default(false).interact()? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = match older_than_days {
                Some(days) => service.delete_before(now_ms() - (days as i64 * 24 * 60 * 60 * 1000))?,
                None => service.clear()?,
            };

            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} log entries", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let service = get_logging_service()?;
            let stats = service.stats()?;
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": stats.total,
                        "error_count": stats.errors,
                        "oldest": stats.oldest,
                        "newest": stats.newest,
                        "by_event": stats.by_event,
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes
                    })
                );
                return Ok(());
            }

            println!("{}", "Log Statistics".bold());
            println!("  Total entries: {}", stats.total);
            println!("  Errors: {}", stats.errors);
            if let (Some(oldest), Some(newest)) = (stats.oldest, stats.newest) {
                println!(
                    "  Range: {} .. {}",
                    format_timestamp(oldest),
                    format_timestamp(newest)
                );
            }
            println!("  Database: {}", db_path.display());
            println!("  Size: {} bytes", size_bytes);

            if !stats.by_event.is_empty() {
                println!();
                let mut table = output::create_table();
                table.set_header(vec!["Event", "Count"]);
                for (event, count) in &stats.by_event {
                    table.add_row(vec![event.clone(), count.to_string()]);
                }
                println!("{}", table);
            }
        }
    }

    Ok(())
}
