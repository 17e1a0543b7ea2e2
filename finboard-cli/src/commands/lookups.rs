//! Lookups command - categories and payment methods from the API

use anyhow::{Context, Result};
use colored::Colorize;

use super::{get_context, get_logger, log_event, runtime};
use crate::output;
use finboard_core::services::LogEvent;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("lookups"));

    let lookups = match runtime()?.block_on(ctx.import_service.load_lookups()) {
        Ok(lookups) => lookups,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("lookups_failed")
                    .with_command("lookups")
                    .with_error(e.to_string()),
            );
            return Err(e).context(format!("Failed to load lookups from {}", ctx.config.api_url));
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&lookups)?);
        return Ok(());
    }

    println!("{}", "Categories".bold());
    if lookups.categories.is_empty() {
        output::warning("  No categories. Create one in the dashboard before importing.");
    } else {
        let mut table = output::create_table();
        table.set_header(vec!["ID", "Title", "Description"]);
        for category in &lookups.categories {
            table.add_row(vec![
                category.id.to_string(),
                category.title.clone(),
                category.description.clone().unwrap_or_default(),
            ]);
        }
        println!("{}", table);
    }

    println!();
    println!("{}", "Payment methods".bold());
    if lookups.payment_types.is_empty() {
        output::warning("  No payment methods. Create one in the dashboard before importing.");
    } else {
        let mut table = output::create_table();
        table.set_header(vec!["ID", "Name in CSV", "Brand", "Bank"]);
        for payment in &lookups.payment_types {
            table.add_row(vec![
                payment.id.to_string(),
                payment.label(),
                payment.card_brand_name.clone().unwrap_or_default(),
                payment.card_bank_name.clone().unwrap_or_default(),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
