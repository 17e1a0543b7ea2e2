//! Import service - one CSV import session from file to created transactions
//!
//! The session runs in fixed steps: fetch lookups, read the file, validate
//! against the mapping, then submit. Submission never starts while the
//! validation report has errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result as AnyResult;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{Config, ImportProfile};
use crate::domain::result::Result;
use crate::domain::{CommonValues, DateFormat, ImportOutcome, Lookups, QuoteMode, RawTable, Separator, TransactionDraft};
use crate::ports::TransactionApi;

use super::mapping::ColumnMapping;
use super::parser::{self, ParseOptions};
use super::submission::{CancelFlag, SubmissionDriver, SubmissionStep};
use super::validation::{ValidationReport, Validator};

/// Everything validation needs besides the file and the lookups
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub mapping: ColumnMapping,
    pub date_format: DateFormat,
    pub common: CommonValues,
    /// Date used for unreadable dates; the local date when unset
    pub today: Option<NaiveDate>,
}

impl ImportRequest {
    pub fn new(mapping: ColumnMapping, common: CommonValues) -> Self {
        Self {
            mapping,
            date_format: DateFormat::default(),
            common,
            today: None,
        }
    }

    pub fn with_date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Build a request for `headers` from a saved profile
    ///
    /// The profile's overlay values win over `fallback`. Returns the saved
    /// headers that this file does not have.
    pub fn from_profile(
        profile: &ImportProfile,
        headers: &[String],
        fallback: CommonValues,
    ) -> (Self, Vec<String>) {
        let mut mapping = ColumnMapping::new(headers);
        let missing = mapping.apply_saved(&profile.column_mappings);
        let request = Self::new(mapping, profile.common_values.unwrap_or(fallback))
            .with_date_format(profile.date_format);
        (request, missing)
    }

    /// Snapshot as a profile; overlay values are kept only when `keep_common`
    pub fn to_profile(&self, options: &ParseOptions, keep_common: bool) -> ImportProfile {
        ImportProfile {
            separator: options.separator,
            date_format: self.date_format,
            quote_mode: options.quote_mode,
            column_mappings: self.mapping.to_saved(),
            common_values: keep_common.then_some(self.common),
        }
    }
}

/// Result of [`ImportService::import`]
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub import_id: Uuid,
    pub report: ValidationReport,
    /// `None` when nothing was submitted: a preview, or a blocking report
    pub outcome: Option<ImportOutcome>,
}

impl ImportResult {
    pub fn submitted(&self) -> bool {
        self.outcome.is_some()
    }
}

/// CSV import orchestration over a [`TransactionApi`]
pub struct ImportService {
    api: Arc<dyn TransactionApi>,
    finboard_dir: PathBuf,
}

impl ImportService {
    pub fn new(api: Arc<dyn TransactionApi>, finboard_dir: PathBuf) -> Self {
        Self { api, finboard_dir }
    }

    /// Fetch both lookup lists once for the session
    pub async fn load_lookups(&self) -> Result<Lookups> {
        let categories = self.api.fetch_categories().await?;
        let payment_types = self.api.fetch_payment_types().await?;
        info!(
            categories = categories.len(),
            payment_types = payment_types.len(),
            "loaded lookups"
        );
        Ok(Lookups::new(categories, payment_types))
    }

    pub fn read(&self, path: &Path, options: &ParseOptions) -> Result<RawTable> {
        parser::read_file(path, options)
    }

    /// Validate without contacting the API
    pub fn prepare(
        &self,
        table: &RawTable,
        request: &ImportRequest,
        lookups: &Lookups,
    ) -> ValidationReport {
        let mut validator = Validator::new(lookups, request.date_format);
        if let Some(today) = request.today {
            validator = validator.with_today(today);
        }
        validator.validate(table, &request.mapping, &request.common)
    }

    /// Submit prepared drafts in order
    pub async fn submit<F>(
        &self,
        import_id: Uuid,
        drafts: &[TransactionDraft],
        cancel: CancelFlag,
        on_step: F,
    ) -> ImportOutcome
    where
        F: FnMut(&SubmissionStep<'_>),
    {
        let driver = SubmissionDriver::new(Arc::clone(&self.api)).with_cancel(cancel);
        driver
            .submit_with_progress(drafts, on_step)
            .instrument(info_span!("import", %import_id))
            .await
    }

    /// Validate and, unless `preview_only` or the report has errors, submit
    pub async fn import<F>(
        &self,
        table: &RawTable,
        request: &ImportRequest,
        lookups: &Lookups,
        preview_only: bool,
        cancel: CancelFlag,
        on_step: F,
    ) -> ImportResult
    where
        F: FnMut(&SubmissionStep<'_>),
    {
        let import_id = Uuid::new_v4();
        let report = self.prepare(table, request, lookups);

        let outcome = if preview_only || report.is_blocking() {
            info!(
                %import_id,
                errors = report.errors.len(),
                preview_only,
                "import stopped after validation"
            );
            None
        } else {
            Some(self.submit(import_id, &report.drafts, cancel, on_step).await)
        };

        ImportResult {
            import_id,
            report,
            outcome,
        }
    }

    pub fn list_profiles(&self) -> AnyResult<BTreeMap<String, ImportProfile>> {
        let config = Config::load(&self.finboard_dir)?;
        Ok(config.import_profiles)
    }

    pub fn get_profile(&self, name: &str) -> AnyResult<Option<ImportProfile>> {
        let config = Config::load(&self.finboard_dir)?;
        Ok(config.profile(name).cloned())
    }

    pub fn save_profile(&self, name: &str, profile: ImportProfile) -> AnyResult<()> {
        let mut config = Config::load(&self.finboard_dir)?;
        config.save_profile(name, profile);
        config.save(&self.finboard_dir)
    }

    /// Returns false when no profile had that name
    pub fn remove_profile(&self, name: &str) -> AnyResult<bool> {
        let mut config = Config::load(&self.finboard_dir)?;
        if config.remove_profile(name).is_none() {
            return Ok(false);
        }
        config.save(&self.finboard_dir)?;
        Ok(true)
    }
}

/// Parser options for a profile, or the configured defaults without one
pub fn parse_options(config: &Config, profile: Option<&ImportProfile>) -> ParseOptions {
    match profile {
        Some(p) => ParseOptions {
            separator: p.separator,
            quote_mode: p.quote_mode,
        },
        None => ParseOptions {
            separator: config.import.separator,
            quote_mode: config.import.quote_mode,
        },
    }
}

/// Separator, quoting and date format of a profile, for display
pub fn describe_profile(profile: &ImportProfile) -> String {
    let quoting = match profile.quote_mode {
        QuoteMode::None => "",
        QuoteMode::Rfc4180 => ", quoted",
    };
    let separator = match profile.separator {
        Separator::Semicolon => "semicolon",
        Separator::Comma => "comma",
        Separator::Pipe => "pipe",
    };
    format!(
        "{} columns, {}{}, {}",
        profile.column_mappings.len(),
        separator,
        quoting,
        profile.date_format
    )
}
