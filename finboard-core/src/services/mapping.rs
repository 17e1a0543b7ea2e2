//! Field mapping registry - which source column feeds which target field

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};
use crate::domain::TargetField;

/// Fewest non-ignored columns an import may use
pub const MIN_MAPPED_COLUMNS: usize = 4;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]").expect("static regex"));

/// Header patterns tried by [`ColumnMapping::detect`], most specific field first
const DETECTION_PATTERNS: &[(TargetField, &[&str])] = &[
    (TargetField::CategoryId, &["categoryid"]),
    (TargetField::PaymentTypeId, &["paymenttypeid", "paymentmethodid"]),
    (TargetField::InstallmentsNumber, &["installment", "parcel"]),
    (TargetField::CreditDebit, &["creditdebit", "debitcredit", "direction", "inout"]),
    (TargetField::PaymentTypeName, &["paymenttype", "paymentmethod", "payment", "card"]),
    (TargetField::CategoryName, &["category"]),
    (TargetField::TransactionType, &["transactiontype", "recurrence", "type"]),
    (TargetField::TransactionDate, &["date", "posted", "when"]),
    (TargetField::Amount, &["amount", "amt", "value", "total"]),
    (
        TargetField::Note,
        &["note", "description", "desc", "memo", "payee", "merchant", "details", "narration", "title"],
    ),
];

/// One header and its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAssignment {
    pub header: String,
    pub target: TargetField,
}

/// Header to target field, in header order
///
/// Every header starts as [`TargetField::Ignore`]. Several headers may share a
/// target; validation applies them in order so the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    assignments: Vec<ColumnAssignment>,
}

impl ColumnMapping {
    /// All headers ignored; repeated header names collapse into one entry
    pub fn new(headers: &[String]) -> Self {
        let mut assignments: Vec<ColumnAssignment> = Vec::with_capacity(headers.len());
        for header in headers {
            if !assignments.iter().any(|a| &a.header == header) {
                assignments.push(ColumnAssignment {
                    header: header.clone(),
                    target: TargetField::Ignore,
                });
            }
        }
        Self { assignments }
    }

    /// Best-guess mapping from header names
    ///
    /// Each target is given to at most one header. Headers matching nothing
    /// stay ignored.
    pub fn detect(headers: &[String]) -> Self {
        let mut mapping = Self::new(headers);
        let normalized: Vec<String> = mapping
            .assignments
            .iter()
            .map(|a| normalize_header(&a.header))
            .collect();

        for (target, patterns) in DETECTION_PATTERNS {
            let found = mapping.assignments.iter().enumerate().position(|(i, a)| {
                a.target.is_ignore() && patterns.iter().any(|p| normalized[i].contains(p))
            });
            if let Some(i) = found {
                mapping.assignments[i].target = *target;
            }
        }

        mapping
    }

    /// Assign `target` to `header`
    pub fn set(&mut self, header: &str, target: TargetField) -> Result<()> {
        let assignment = self
            .assignments
            .iter_mut()
            .find(|a| a.header == header)
            .ok_or_else(|| Error::not_found(format!("Column '{}' is not in the file", header)))?;
        assignment.target = target;
        Ok(())
    }

    pub fn get(&self, header: &str) -> Option<TargetField> {
        self.assignments
            .iter()
            .find(|a| a.header == header)
            .map(|a| a.target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TargetField)> {
        self.assignments.iter().map(|a| (a.header.as_str(), a.target))
    }

    /// Non-ignored assignments in header order
    pub fn mapped(&self) -> impl Iterator<Item = (&str, TargetField)> {
        self.iter().filter(|(_, target)| !target.is_ignore())
    }

    pub fn mapped_count(&self) -> usize {
        self.mapped().count()
    }

    pub fn contains_target(&self, target: TargetField) -> bool {
        self.mapped().any(|(_, t)| t == target)
    }

    /// Targets fed by more than one header, with those headers in order
    pub fn duplicate_targets(&self) -> Vec<(TargetField, Vec<String>)> {
        let mut duplicates: Vec<(TargetField, Vec<String>)> = Vec::new();
        for (header, target) in self.mapped() {
            match duplicates.iter_mut().find(|(t, _)| *t == target) {
                Some((_, headers)) => headers.push(header.to_string()),
                None => duplicates.push((target, vec![header.to_string()])),
            }
        }
        duplicates.retain(|(_, headers)| headers.len() > 1);
        duplicates
    }

    /// Non-ignored assignments keyed by header, for saving in a profile
    pub fn to_saved(&self) -> BTreeMap<String, TargetField> {
        self.mapped()
            .map(|(header, target)| (header.to_string(), target))
            .collect()
    }

    /// Apply saved assignments; returns saved headers missing from this file
    pub fn apply_saved(&mut self, saved: &BTreeMap<String, TargetField>) -> Vec<String> {
        let mut missing = Vec::new();
        for (header, target) in saved {
            if self.set(header, *target).is_err() {
                missing.push(header.clone());
            }
        }
        missing
    }
}

/// Lowercase alphanumerics only: "Transaction Date" -> "transactiondate"
fn normalize_header(header: &str) -> String {
    NON_ALNUM.replace_all(&header.to_lowercase(), "").to_string()
}
