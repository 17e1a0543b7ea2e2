//! Target fields a source column can be mapped onto

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::result::Error;

/// Transaction attribute a CSV column may feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TargetField {
    Amount,
    Note,
    TransactionDate,
    InstallmentsNumber,
    TransactionType,
    CreditDebit,
    CategoryId,
    CategoryName,
    PaymentTypeId,
    PaymentTypeName,
    #[default]
    Ignore,
}

impl TargetField {
    pub const ALL: [TargetField; 11] = [
        TargetField::Amount,
        TargetField::Note,
        TargetField::TransactionDate,
        TargetField::InstallmentsNumber,
        TargetField::TransactionType,
        TargetField::CreditDebit,
        TargetField::CategoryId,
        TargetField::CategoryName,
        TargetField::PaymentTypeId,
        TargetField::PaymentTypeName,
        TargetField::Ignore,
    ];

    /// Fields every import must map
    pub const REQUIRED: [TargetField; 3] = [
        TargetField::Amount,
        TargetField::Note,
        TargetField::TransactionDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetField::Amount => "amount",
            TargetField::Note => "note",
            TargetField::TransactionDate => "transactionDate",
            TargetField::InstallmentsNumber => "installmentsNumber",
            TargetField::TransactionType => "transactionType",
            TargetField::CreditDebit => "creditDebit",
            TargetField::CategoryId => "categoryId",
            TargetField::CategoryName => "categoryName",
            TargetField::PaymentTypeId => "paymentTypeId",
            TargetField::PaymentTypeName => "paymentTypeName",
            TargetField::Ignore => "ignore",
        }
    }

    /// Human label for prompts and tables
    pub fn label(&self) -> &'static str {
        match self {
            TargetField::Amount => "Amount",
            TargetField::Note => "Note",
            TargetField::TransactionDate => "Transaction date",
            TargetField::InstallmentsNumber => "Installments",
            TargetField::TransactionType => "Transaction type",
            TargetField::CreditDebit => "Credit / debit",
            TargetField::CategoryId => "Category (id)",
            TargetField::CategoryName => "Category (name)",
            TargetField::PaymentTypeId => "Payment method (id)",
            TargetField::PaymentTypeName => "Payment method (name)",
            TargetField::Ignore => "Ignore",
        }
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, TargetField::Ignore)
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetField {
    type Err = Error;

    /// Accepts the wire name in any case, so `transactiondate` works on the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TargetField::ALL
            .iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| Error::validation(format!("Unknown target field '{}'", s)))
    }
}
