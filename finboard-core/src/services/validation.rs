//! Type coercion and validation - rows plus mapping to transaction drafts
//!
//! Batch-level problems (too few mapped columns, a required field unmapped,
//! no data rows) stop validation before any row is read. Row-level problems
//! never stop it: the offending value is replaced by a safe default, a message
//! tagged `Row N:` is recorded, and the row still yields a draft.

use std::str::FromStr;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::{
    CommonValues, CreditDebit, DateFormat, Lookups, RawRow, RawTable, TargetField,
    TransactionDraft, TransactionType,
};

use super::mapping::{ColumnMapping, MIN_MAPPED_COLUMNS};
use super::resolver::ReferenceResolver;

/// Drafts plus every problem found while building them
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub drafts: Vec<TransactionDraft>,
    /// Blocking problems, batch-level or `Row N: ...`
    pub errors: Vec<String>,
    /// Non-blocking notes, e.g. two columns feeding the same field
    pub warnings: Vec<String>,
}

impl ValidationReport {
    /// Errors block submission until the user fixes the mapping or the file
    pub fn is_blocking(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.drafts.len()
    }

    fn batch_failure(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            drafts: Vec::new(),
            errors,
            warnings,
        }
    }
}

/// Check the mapping alone, before any row is parsed
pub fn check_mapping(mapping: &ColumnMapping) -> Vec<String> {
    let mut errors = Vec::new();

    let mapped = mapping.mapped_count();
    if mapped < MIN_MAPPED_COLUMNS {
        errors.push(format!(
            "At least {} columns must be mapped (currently {} mapped)",
            MIN_MAPPED_COLUMNS, mapped
        ));
    }

    for field in TargetField::REQUIRED {
        if !mapping.contains_target(field) {
            errors.push(format!("Required field \"{}\" is not mapped", field));
        }
    }

    errors
}

/// Warnings for targets fed by several columns
pub fn mapping_warnings(mapping: &ColumnMapping) -> Vec<String> {
    mapping
        .duplicate_targets()
        .into_iter()
        .map(|(target, headers)| {
            let quoted: Vec<String> = headers.iter().map(|h| format!("\"{}\"", h)).collect();
            format!(
                "Columns {} all map to {}; the last one wins",
                quoted.join(", "),
                target
            )
        })
        .collect()
}

/// Raw names captured from a row, resolved once all its columns are applied
#[derive(Debug, Default)]
struct PendingReferences {
    category_name: Option<String>,
    payment_type_name: Option<String>,
}

/// Builds drafts for one import session
#[derive(Debug, Clone, Copy)]
pub struct Validator<'a> {
    lookups: &'a Lookups,
    date_format: DateFormat,
    today: NaiveDate,
}

impl<'a> Validator<'a> {
    pub fn new(lookups: &'a Lookups, date_format: DateFormat) -> Self {
        Self {
            lookups,
            date_format,
            today: Local::now().date_naive(),
        }
    }

    /// Override the date used when a row's date cannot be read
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn validate(
        &self,
        table: &RawTable,
        mapping: &ColumnMapping,
        common: &CommonValues,
    ) -> ValidationReport {
        let warnings = mapping_warnings(mapping);

        let mut errors = check_mapping(mapping);
        if table.is_empty() {
            errors.push("The file has no data rows".to_string());
        }
        if !errors.is_empty() {
            return ValidationReport::batch_failure(errors, warnings);
        }

        let resolver = ReferenceResolver::new(self.lookups);
        let drafts: Vec<TransactionDraft> = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| self.build_draft(i + 1, row, mapping, common, &resolver, &mut errors))
            .collect();

        debug!(
            drafts = drafts.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "validated import rows"
        );

        ValidationReport {
            drafts,
            errors,
            warnings,
        }
    }

    fn build_draft(
        &self,
        row_number: usize,
        row: &RawRow,
        mapping: &ColumnMapping,
        common: &CommonValues,
        resolver: &ReferenceResolver<'_>,
        errors: &mut Vec<String>,
    ) -> TransactionDraft {
        let mut draft = TransactionDraft::from_common(common, self.today, row_number);
        let mut pending = PendingReferences::default();

        for (header, target) in mapping.mapped() {
            let raw = row.get(header).unwrap_or("");
            self.apply_field(row_number, target, raw, &mut draft, &mut pending, errors);
        }

        if let Some(name) = pending.category_name {
            match resolver.category_id(&name) {
                Some(id) => draft.category_id = id,
                None => errors.push(format!("Row {}: Category \"{}\" not found", row_number, name)),
            }
        }
        if let Some(name) = pending.payment_type_name {
            match resolver.payment_type_id(&name) {
                Some(id) => draft.payment_type_id = id,
                None => errors.push(format!(
                    "Row {}: Payment method \"{}\" not found",
                    row_number, name
                )),
            }
        }

        draft
    }

    /// Coerce one cell onto the draft
    ///
    /// A blank cell gets no special treatment: it fails the same parse as any
    /// other unreadable value.
    fn apply_field(
        &self,
        row_number: usize,
        target: TargetField,
        raw: &str,
        draft: &mut TransactionDraft,
        pending: &mut PendingReferences,
        errors: &mut Vec<String>,
    ) {
        let value = raw.trim();

        match target {
            TargetField::Amount => match parse_amount(value) {
                Some(amount) => draft.amount = amount,
                None => {
                    draft.amount = Decimal::ZERO;
                    errors.push(format!("Row {}: Invalid amount value \"{}\"", row_number, raw));
                }
            },
            TargetField::Note => draft.note = value.to_string(),
            TargetField::TransactionDate => match parse_date(value, self.date_format) {
                Some(date) => draft.transaction_date = date,
                None => {
                    draft.transaction_date = self.today;
                    errors.push(format!(
                        "Row {}: Invalid date value \"{}\" (expected {})",
                        row_number, raw, self.date_format
                    ));
                }
            },
            TargetField::InstallmentsNumber => match parse_installments(value) {
                Some(n) => draft.installments_number = n,
                None => {
                    draft.installments_number = 1;
                    errors.push(format!(
                        "Row {}: Invalid installments number \"{}\"",
                        row_number, raw
                    ));
                }
            },
            TargetField::TransactionType => match TransactionType::from_text(value) {
                Some(kind) => draft.transaction_type = kind,
                None => {
                    draft.transaction_type = TransactionType::Single;
                    errors.push(format!(
                        "Row {}: Invalid transaction type \"{}\"",
                        row_number, raw
                    ));
                }
            },
            TargetField::CreditDebit => match CreditDebit::from_text(value) {
                Some(direction) => draft.credit_debit = direction,
                None => {
                    draft.credit_debit = CreditDebit::Debit;
                    errors.push(format!(
                        "Row {}: Invalid credit/debit value \"{}\"",
                        row_number, raw
                    ));
                }
            },
            TargetField::CategoryId => match i64::from_str(value) {
                Ok(id) => draft.category_id = id,
                Err(_) => errors.push(format!("Row {}: Invalid category id \"{}\"", row_number, raw)),
            },
            TargetField::PaymentTypeId => match i64::from_str(value) {
                Ok(id) => draft.payment_type_id = id,
                Err(_) => errors.push(format!(
                    "Row {}: Invalid payment type id \"{}\"",
                    row_number, raw
                )),
            },
            TargetField::CategoryName => pending.category_name = Some(value.to_string()),
            TargetField::PaymentTypeName => pending.payment_type_name = Some(value.to_string()),
            TargetField::Ignore => {}
        }
    }
}

/// Amount with either `.` or `,` as decimal mark: "50,00" -> 50.00
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let normalized = value.replacen(',', ".", 1);
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .ok()
}

/// Date in the chosen pattern
pub fn parse_date(raw: &str, format: DateFormat) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format.chrono_format()).ok()
}

/// Whole number of installments, at least one
pub fn parse_installments(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}
