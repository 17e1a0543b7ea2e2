//! Transaction draft assembled from one CSV row

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::lookup::{deserialize_id, Lookups};
use super::result::{Error, Result};

/// Direction of money flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CreditDebit {
    #[default]
    Debit,
    Credit,
}

impl CreditDebit {
    /// Substring match: "credit"/"income" and "debit"/"expense", case-insensitive
    pub fn from_text(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        if lower.contains("credit") || lower.contains("income") {
            Some(CreditDebit::Credit)
        } else if lower.contains("debit") || lower.contains("expense") {
            Some(CreditDebit::Debit)
        } else {
            None
        }
    }
}

impl fmt::Display for CreditDebit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditDebit::Debit => f.write_str("DEBIT"),
            CreditDebit::Credit => f.write_str("CREDIT"),
        }
    }
}

/// Recurrence of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    #[default]
    Single,
    Recurring,
    Installments,
}

impl TransactionType {
    /// Substring match against "single", "recurring", "installment", case-insensitive
    pub fn from_text(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        if lower.contains("single") {
            Some(TransactionType::Single)
        } else if lower.contains("recurring") {
            Some(TransactionType::Recurring)
        } else if lower.contains("installment") {
            Some(TransactionType::Installments)
        } else {
            None
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Single => f.write_str("SINGLE"),
            TransactionType::Recurring => f.write_str("RECURRING"),
            TransactionType::Installments => f.write_str("INSTALLMENTS"),
        }
    }
}

/// Defaults applied to every imported row before its mapped columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonValues {
    pub category_id: i64,
    pub payment_type_id: i64,
    #[serde(default)]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub credit_debit: CreditDebit,
}

impl CommonValues {
    /// First category and first payment type, single debit
    pub fn from_lookups(lookups: &Lookups) -> Result<Self> {
        let category = lookups.categories.first().ok_or_else(|| {
            Error::validation("No categories available. Create a category before importing.")
        })?;
        let payment_type = lookups.payment_types.first().ok_or_else(|| {
            Error::validation(
                "No payment methods available. Create a payment method before importing.",
            )
        })?;

        Ok(Self {
            category_id: category.id,
            payment_type_id: payment_type.id,
            transaction_type: TransactionType::Single,
            credit_debit: CreditDebit::Debit,
        })
    }

    /// Fail when the category or payment type is not in `lookups`
    ///
    /// Saved values can outlive the records they point at.
    pub fn ensure_known(&self, lookups: &Lookups) -> Result<()> {
        if !lookups.categories.iter().any(|c| c.id == self.category_id) {
            return Err(Error::not_found(format!(
                "Category id {} does not exist",
                self.category_id
            )));
        }
        if !lookups.payment_types.iter().any(|p| p.id == self.payment_type_id) {
            return Err(Error::not_found(format!(
                "Payment method id {} does not exist",
                self.payment_type_id
            )));
        }
        Ok(())
    }
}

/// A not-yet-submitted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub note: String,
    pub transaction_date: NaiveDate,
    pub payment_type_id: i64,
    pub category_id: i64,
    pub credit_debit: CreditDebit,
    pub transaction_type: TransactionType,
    pub installments_number: u32,
    /// 1-based source row, for reporting only
    #[serde(skip)]
    pub row: usize,
}

impl TransactionDraft {
    /// Start a draft for `row` from the common values
    ///
    /// Fields with no common value start at safe defaults: zero amount,
    /// empty note, `today`, one installment.
    pub fn from_common(common: &CommonValues, today: NaiveDate, row: usize) -> Self {
        Self {
            amount: Decimal::ZERO,
            note: String::new(),
            transaction_date: today,
            payment_type_id: common.payment_type_id,
            category_id: common.category_id,
            credit_debit: common.credit_debit,
            transaction_type: common.transaction_type,
            installments_number: 1,
            row,
        }
    }
}

/// Record returned by the API after creating a transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedTransaction {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, JsonValue>,
}
