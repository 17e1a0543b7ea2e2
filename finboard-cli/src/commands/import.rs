//! Import command - CSV file to transactions in the dashboard

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use colored::Colorize;
use dialoguer::{Confirm, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use uuid::Uuid;

use super::{get_context, get_logger, log_event, runtime};
use crate::output;
use finboard_core::services::import::{describe_profile, parse_options};
use finboard_core::services::logging::events;
use finboard_core::services::parser::{check_file, FileCheck};
use finboard_core::services::{CancelFlag, ColumnMapping, ImportRequest, LogEvent, ValidationReport};
use finboard_core::{
    CommonValues, CreditDebit, DateFormat, FinboardContext, Lookups, OperationResult, QuoteMode,
    RawTable, Separator, TargetField, TransactionType,
};

/// Drafts shown by --preview
const PREVIEW_ROWS: usize = 10;

/// Validation errors printed before the rest are summarized
const MAX_PRINTED_ERRORS: usize = 50;

#[derive(Args)]
pub struct ImportArgs {
    /// Path to a .csv or .txt file (max 5 MB)
    pub file: Option<PathBuf>,
    /// Column separator: ';', ',' or '|'
    #[arg(long, short = 's')]
    pub separator: Option<Separator>,
    /// Date pattern of the date column, e.g. dd/MM/yyyy
    #[arg(long)]
    pub date_format: Option<DateFormat>,
    /// Honour double-quoted values that contain the separator
    #[arg(long)]
    pub rfc4180: bool,
    /// Map a column onto a field, e.g. --map "Valor=amount" (repeatable)
    #[arg(long = "map", value_name = "HEADER=FIELD")]
    pub mappings: Vec<String>,
    /// Use a saved import profile
    #[arg(long)]
    pub profile: Option<String>,
    /// Save the final settings as a profile
    #[arg(long)]
    pub save_profile: Option<String>,
    /// List saved profiles
    #[arg(long)]
    pub list_profiles: bool,
    /// Delete a saved profile
    #[arg(long, value_name = "NAME")]
    pub delete_profile: Option<String>,
    /// Apply the common values below to every row
    #[arg(long)]
    pub common: bool,
    /// Common category id
    #[arg(long, requires = "common")]
    pub category_id: Option<i64>,
    /// Common payment method id
    #[arg(long, requires = "common")]
    pub payment_type_id: Option<i64>,
    /// Common transaction type: single, recurring or installments
    #[arg(long, requires = "common", value_parser = parse_transaction_type)]
    pub transaction_type: Option<TransactionType>,
    /// Common direction: credit or debit
    #[arg(long, requires = "common", value_parser = parse_credit_debit)]
    pub credit_debit: Option<CreditDebit>,
    /// Choose the field of every column interactively
    #[arg(long, short)]
    pub interactive: bool,
    /// Validate and show the drafts without importing
    #[arg(long)]
    pub preview: bool,
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_transaction_type(s: &str) -> Result<TransactionType, String> {
    TransactionType::from_text(s)
        .ok_or_else(|| format!("expected single, recurring or installments, got '{}'", s))
}

fn parse_credit_debit(s: &str) -> Result<CreditDebit, String> {
    CreditDebit::from_text(s).ok_or_else(|| format!("expected credit or debit, got '{}'", s))
}

/// `HEADER=FIELD`; the last `=` separates, so headers may contain one
fn parse_map_entry(entry: &str) -> Result<(&str, TargetField)> {
    let (header, field) = entry
        .rsplit_once('=')
        .ok_or_else(|| anyhow!("Invalid --map '{}', expected HEADER=FIELD", entry))?;
    let target = field.parse::<TargetField>()?;
    Ok((header.trim(), target))
}

pub fn run(args: ImportArgs) -> Result<()> {
    let ctx = get_context()?;

    if args.list_profiles {
        return list_profiles(&ctx, args.json);
    }
    if let Some(name) = &args.delete_profile {
        if !ctx.import_service.remove_profile(name)? {
            bail!("Profile not found: {}", name);
        }
        if !args.json {
            output::success(&format!("Profile '{}' deleted", name));
        }
        return Ok(());
    }

    let file = args
        .file
        .clone()
        .ok_or_else(|| anyhow!("File path required for import"))?;
    let size = std::fs::metadata(&file)
        .with_context(|| format!("Cannot read {}", file.display()))?
        .len();
    if let FileCheck::Rejected(message) = check_file(&file, size) {
        bail!(message);
    }

    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("import"));

    let profile = match &args.profile {
        Some(name) => Some(
            ctx.config
                .profile(name)
                .cloned()
                .ok_or_else(|| anyhow!("Profile not found: {}", name))?,
        ),
        None => None,
    };

    let mut options = parse_options(&ctx.config, profile.as_ref());
    if let Some(separator) = args.separator {
        options.separator = separator;
    }
    if args.rfc4180 {
        options.quote_mode = QuoteMode::Rfc4180;
    }

    let rt = runtime()?;
    let lookups = rt
        .block_on(ctx.import_service.load_lookups())
        .with_context(|| {
            format!(
                "Failed to load categories and payment methods from {}",
                ctx.config.api_url
            )
        })?;
    let table = ctx.import_service.read(&file, &options)?;
    debug!(
        file = %file.display(),
        columns = table.headers.len(),
        rows = table.row_count(),
        "file read"
    );

    let common = common_values(&args, &lookups)?;
    let mut request = match &profile {
        Some(p) => {
            let (request, missing) = ImportRequest::from_profile(p, &table.headers, common);
            if !missing.is_empty() && !args.json {
                output::warning(&format!(
                    "Profile columns not in this file: {}",
                    missing.join(", ")
                ));
            }
            request
        }
        None => ImportRequest::new(ColumnMapping::detect(&table.headers), common)
            .with_date_format(ctx.config.import.date_format),
    };
    if args.common {
        request.common = common;
    }
    request.common.ensure_known(&lookups).with_context(|| match &args.profile {
        Some(name) if !args.common => format!("Profile '{}' has stale common values", name),
        _ => "Invalid common values".to_string(),
    })?;
    if let Some(date_format) = args.date_format {
        request.date_format = date_format;
    }
    for entry in &args.mappings {
        let (header, target) = parse_map_entry(entry)?;
        request.mapping.set(header, target)?;
    }
    if args.interactive {
        choose_mapping(&mut request.mapping, &table)?;
    }

    if !args.json {
        if let Some(name) = &args.profile {
            output::info(&format!("Using profile '{}'", name));
        }
        print_mapping(&request.mapping, &table);
    }

    let import_id = Uuid::new_v4();
    let import_ref = import_id.to_string();
    let mut started = LogEvent::new(events::IMPORT_STARTED)
        .with_command("import")
        .with_import(&import_ref);
    if let Some(checksum) = &table.checksum {
        started = started.with_checksum(checksum);
    }
    log_event(&logger, started);

    let report = ctx.import_service.prepare(&table, &request, &lookups);

    if report.is_blocking() {
        log_event(
            &logger,
            LogEvent::new(events::IMPORT_VALIDATION_FAILED)
                .with_import(&import_ref)
                .with_error(format!("{} validation errors", report.errors.len())),
        );
        if args.json {
            let mut context = HashMap::new();
            context.insert("errors".to_string(), serde_json::json!(report.errors));
            context.insert("warnings".to_string(), serde_json::json!(report.warnings));
            let result: OperationResult<()> =
                OperationResult::fail_with_context("Import blocked by validation errors", context);
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_errors(&report);
        }
        bail!("Import blocked: fix the column mapping or the file and try again");
    }

    if !args.json {
        for warning in &report.warnings {
            output::warning(warning);
        }
    }

    if let Some(name) = &args.save_profile {
        ctx.import_service
            .save_profile(name, request.to_profile(&options, args.common))?;
        if !args.json {
            output::success(&format!("Profile '{}' saved", name));
        }
    }

    if args.preview {
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", "PREVIEW MODE - Nothing imported".yellow());
            print_preview(&report, &lookups);
        }
        return Ok(());
    }

    if !args.yes && !args.json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Import {} transactions?", report.row_count()))
            .default(true)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(report.row_count() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}")?
                .progress_chars("##-"),
        );
        bar
    };

    let cancel = CancelFlag::new();
    let outcome = rt.block_on(async {
        let flag = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.cancel();
            }
        });

        ctx.import_service
            .submit(import_id, &report.drafts, cancel.clone(), |step| {
                progress.set_position(step.outcome.processed as u64);
                if let Some(err) = step.error {
                    progress.set_message(format!("{} failed", step.outcome.errors));
                    log_event(
                        &logger,
                        LogEvent::new(events::IMPORT_ROW_FAILED)
                            .with_import(&import_ref)
                            .with_row(step.row)
                            .with_error(err.to_string()),
                    );
                }
            })
            .await
    });
    progress.finish_and_clear();

    let finished = if outcome.cancelled {
        LogEvent::new(events::IMPORT_CANCELLED)
    } else {
        LogEvent::new(events::IMPORT_COMPLETED)
    };
    let finished = if outcome.errors > 0 {
        finished.with_error(format!("{} of {} failed", outcome.errors, outcome.total))
    } else {
        finished
    };
    log_event(&logger, finished.with_import(&import_ref));

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "importId": import_ref,
                "outcome": outcome,
                "summary": outcome.summary(),
                "warnings": report.warnings,
            }))?
        );
        return Ok(());
    }

    if outcome.is_success() {
        output::success(&outcome.summary());
    } else {
        output::warning(&outcome.summary());
        if outcome.errors > 0 {
            println!(
                "  Failed rows: fb logs list --import {}",
                import_ref.dimmed()
            );
        }
    }

    Ok(())
}

/// Lookup defaults, replaced by any --common values given
fn common_values(args: &ImportArgs, lookups: &Lookups) -> Result<CommonValues> {
    let mut common = CommonValues::from_lookups(lookups)?;
    if !args.common {
        return Ok(common);
    }

    if let Some(id) = args.category_id {
        common.category_id = id;
    }
    if let Some(id) = args.payment_type_id {
        common.payment_type_id = id;
    }
    if let Some(kind) = args.transaction_type {
        common.transaction_type = kind;
    }
    if let Some(direction) = args.credit_debit {
        common.credit_debit = direction;
    }
    Ok(common)
}

fn choose_mapping(mapping: &mut ColumnMapping, table: &RawTable) -> Result<()> {
    if atty::isnt(atty::Stream::Stdin) {
        bail!("--interactive needs a terminal");
    }

    let labels: Vec<&str> = TargetField::ALL.iter().map(|f| f.label()).collect();
    let current: Vec<(String, TargetField)> = mapping
        .iter()
        .map(|(header, target)| (header.to_string(), target))
        .collect();
    let first_row = table.rows.first();

    for (header, target) in current {
        let sample = first_row.and_then(|r| r.get(&header)).unwrap_or("");
        let default = TargetField::ALL
            .iter()
            .position(|f| *f == target)
            .unwrap_or(TargetField::ALL.len() - 1);
        let choice = Select::new()
            .with_prompt(format!("Column '{}' (e.g. \"{}\")", header, sample))
            .items(&labels)
            .default(default)
            .interact()?;
        mapping.set(&header, TargetField::ALL[choice])?;
    }
    Ok(())
}

fn print_mapping(mapping: &ColumnMapping, table: &RawTable) {
    let first_row = table.rows.first();
    let mut out = output::create_table();
    out.set_header(vec!["Column", "Field", "First value"]);
    for (header, target) in mapping.iter() {
        let field = if target.is_ignore() {
            target.label().dimmed().to_string()
        } else {
            target.label().to_string()
        };
        out.add_row(vec![
            header.to_string(),
            field,
            first_row.and_then(|r| r.get(header)).unwrap_or("").to_string(),
        ]);
    }
    println!("{}", out);
    println!(
        "{} of {} columns mapped, {} rows",
        mapping.mapped_count(),
        table.headers.len(),
        table.row_count()
    );
    println!();
}

fn print_errors(report: &ValidationReport) {
    output::error(&format!(
        "Import blocked by {} errors:",
        report.errors.len()
    ));
    for message in report.errors.iter().take(MAX_PRINTED_ERRORS) {
        eprintln!("  {}", message);
    }
    if report.errors.len() > MAX_PRINTED_ERRORS {
        eprintln!("  ... and {} more", report.errors.len() - MAX_PRINTED_ERRORS);
    }
}

fn print_preview(report: &ValidationReport, lookups: &Lookups) {
    let category_title = |id: i64| {
        lookups
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.title.clone())
            .unwrap_or_else(|| format!("#{}", id))
    };
    let payment_label = |id: i64| {
        lookups
            .payment_types
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.label())
            .unwrap_or_else(|| format!("#{}", id))
    };

    let mut table = output::create_table();
    table.set_header(vec![
        "Row", "Date", "Amount", "Note", "Category", "Payment", "Type", "C/D", "Inst.",
    ]);
    for draft in report.drafts.iter().take(PREVIEW_ROWS) {
        table.add_row(vec![
            draft.row.to_string(),
            draft.transaction_date.to_string(),
            output::format_amount(draft.amount),
            draft.note.clone(),
            category_title(draft.category_id),
            payment_label(draft.payment_type_id),
            draft.transaction_type.to_string(),
            draft.credit_debit.to_string(),
            draft.installments_number.to_string(),
        ]);
    }
    println!("{}", table);
    if report.row_count() > PREVIEW_ROWS {
        println!("... and {} more", report.row_count() - PREVIEW_ROWS);
    }
}

fn list_profiles(ctx: &FinboardContext, json: bool) -> Result<()> {
    let profiles = ctx.import_service.list_profiles()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No saved profiles.");
        return Ok(());
    }

    println!("Saved import profiles:");
    for (name, profile) in &profiles {
        println!();
        println!("  {}  {}", name.green(), describe_profile(profile).dimmed());
        for (header, target) in &profile.column_mappings {
            println!("    {} -> {}", header, target.label());
        }
        if let Some(common) = &profile.common_values {
            println!(
                "    Common: category #{}, payment #{}, {}, {}",
                common.category_id,
                common.payment_type_id,
                common.transaction_type,
                common.credit_debit
            );
        }
    }
    Ok(())
}
