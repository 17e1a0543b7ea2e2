//! Service layer - the import pipeline
//!
//! Leaf-first: parser, mapping, resolver and validation are pure; submission
//! and import talk to the [`TransactionApi`](crate::ports::TransactionApi)
//! port; logging owns the event log database.

pub mod import;
pub mod logging;
pub mod mapping;
pub mod parser;
pub mod resolver;
pub mod submission;
pub mod validation;

pub use import::{ImportRequest, ImportResult, ImportService};
pub use logging::{EntryPoint, LogEntry, LogEvent, LogStats, LoggingService};
pub use mapping::{ColumnAssignment, ColumnMapping, MIN_MAPPED_COLUMNS};
pub use parser::{FileCheck, ParseOptions};
pub use resolver::ReferenceResolver;
pub use submission::{CancelFlag, SubmissionDriver, SubmissionStep};
pub use validation::{ValidationReport, Validator};
