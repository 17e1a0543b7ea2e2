//! Core domain entities
//!
//! Pure data structures for the import engine - no I/O.

mod field;
mod lookup;
mod options;
mod outcome;
mod table;
mod transaction;
pub mod result;

pub use field::TargetField;
pub use lookup::{Category, Lookups, PaymentType};
pub use options::{DateFormat, QuoteMode, Separator};
pub use outcome::ImportOutcome;
pub use table::{RawRow, RawTable};
pub use transaction::{CommonValues, CreatedTransaction, CreditDebit, TransactionDraft, TransactionType};
