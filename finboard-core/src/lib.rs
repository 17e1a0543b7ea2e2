//! Finboard Core - CSV transaction import for the finboard dashboard
//!
//! This crate follows a hexagonal layout:
//!
//! - **domain**: import entities (RawTable, TransactionDraft, lookups, options)
//! - **ports**: the `TransactionApi` trait the engine submits through
//! - **services**: parser, mapping, validation, resolver, submission, event log
//! - **adapters**: concrete implementations (reqwest HTTP client)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::http::HttpTransactionApi;
use config::Config;
use ports::TransactionApi;
use services::ImportService;

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult};
pub use domain::{
    Category, CommonValues, CreditDebit, DateFormat, ImportOutcome, Lookups, PaymentType,
    QuoteMode, RawTable, Separator, TargetField, TransactionDraft, TransactionType,
};

/// Main context for finboard operations
///
/// Holds the loaded configuration, the API client and the import service.
pub struct FinboardContext {
    pub config: Config,
    pub finboard_dir: PathBuf,
    pub api: Arc<dyn TransactionApi>,
    pub import_service: ImportService,
}

impl FinboardContext {
    /// Load settings from `finboard_dir` and connect to the configured API
    pub fn new(finboard_dir: &Path) -> Result<Self> {
        let config = Config::load(finboard_dir)?;
        let api: Arc<dyn TransactionApi> =
            Arc::new(HttpTransactionApi::new(config.request_context())?);
        Ok(Self::with_api(config, finboard_dir, api))
    }

    /// Build a context around an existing API implementation
    pub fn with_api(config: Config, finboard_dir: &Path, api: Arc<dyn TransactionApi>) -> Self {
        let import_service = ImportService::new(Arc::clone(&api), finboard_dir.to_path_buf());
        Self {
            config,
            finboard_dir: finboard_dir.to_path_buf(),
            api,
            import_service,
        }
    }
}
