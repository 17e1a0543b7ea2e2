//! Batch submission driver - replays drafts against the API one at a time

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::result::Error;
use crate::domain::{ImportOutcome, TransactionDraft};
use crate::ports::TransactionApi;

/// Shared stop request, checked between items
///
/// Setting it never interrupts the call in flight; it only prevents the next
/// one from being dispatched.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened to one draft, published right after its call completes
#[derive(Debug)]
pub struct SubmissionStep<'a> {
    /// 1-based source row of the draft
    pub row: usize,
    pub error: Option<&'a Error>,
    /// Counters including this item
    pub outcome: ImportOutcome,
}

/// Sequential best-effort submission
///
/// Each create call is awaited before the next draft is sent. Failures are
/// counted and logged, never retried, and earlier successes are kept.
pub struct SubmissionDriver {
    api: Arc<dyn TransactionApi>,
    cancel: CancelFlag,
}

impl SubmissionDriver {
    pub fn new(api: Arc<dyn TransactionApi>) -> Self {
        Self {
            api,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    pub async fn submit(&self, drafts: &[TransactionDraft]) -> ImportOutcome {
        self.submit_with_progress(drafts, |_| {}).await
    }

    /// Submit all drafts, calling `on_step` after every item
    pub async fn submit_with_progress<F>(
        &self,
        drafts: &[TransactionDraft],
        mut on_step: F,
    ) -> ImportOutcome
    where
        F: FnMut(&SubmissionStep<'_>),
    {
        let mut outcome = ImportOutcome::new(drafts.len());

        for draft in drafts {
            if self.cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let result = self.api.create_transaction(draft.category_id, draft).await;
            let error = match &result {
                Ok(_) => {
                    outcome.record_success();
                    None
                }
                Err(e) => {
                    outcome.record_failure();
                    warn!(row = draft.row, error = %e, "failed to create transaction");
                    Some(e)
                }
            };

            on_step(&SubmissionStep {
                row: draft.row,
                error,
                outcome,
            });
        }

        info!(
            processed = outcome.processed,
            total = outcome.total,
            errors = outcome.errors,
            cancelled = outcome.cancelled,
            "submission finished"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::domain::result::Result;
    use crate::domain::{Category, CommonValues, CreatedTransaction, CreditDebit, PaymentType, TransactionType};

    /// Fails the listed rows, optionally raising the cancel flag after a number of calls
    #[derive(Default)]
    struct FakeApi {
        failing_rows: Vec<usize>,
        cancel_after: Option<(usize, CancelFlag)>,
        calls: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl TransactionApi for FakeApi {
        async fn fetch_categories(&self) -> Result<Vec<Category>> {
            Ok(Vec::new())
        }

        async fn fetch_payment_types(&self) -> Result<Vec<PaymentType>> {
            Ok(Vec::new())
        }

        async fn create_transaction(
            &self,
            _category_id: i64,
            draft: &TransactionDraft,
        ) -> Result<Option<CreatedTransaction>> {
            let count = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(draft.row);
                calls.len()
            };
            if let Some((after, flag)) = &self.cancel_after {
                if count == *after {
                    flag.cancel();
                }
            }
            if self.failing_rows.contains(&draft.row) {
                return Err(Error::api(500, "Transaction rejected"));
            }
            Ok(Some(CreatedTransaction {
                id: draft.row as i64,
                fields: serde_json::Map::new(),
            }))
        }
    }

    fn drafts(n: usize) -> Vec<TransactionDraft> {
        let common = CommonValues {
            category_id: 1,
            payment_type_id: 1,
            transaction_type: TransactionType::Single,
            credit_debit: CreditDebit::Debit,
        };
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (1..=n)
            .map(|row| {
                let mut draft = TransactionDraft::from_common(&common, today, row);
                draft.amount = Decimal::from(row as i64);
                draft
            })
            .collect()
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let api = Arc::new(FakeApi::default());
        let driver = SubmissionDriver::new(api.clone());

        let outcome = driver.submit(&drafts(3)).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.processed, 3);
        assert_eq!(*api.calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let api = Arc::new(FakeApi {
            failing_rows: vec![2, 4],
            ..FakeApi::default()
        });
        let driver = SubmissionDriver::new(api.clone());

        let outcome = driver.submit(&drafts(5)).await;

        assert_eq!(outcome.processed, 5);
        assert_eq!(outcome.errors, 2);
        assert_eq!(outcome.succeeded(), 3);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.summary(), "Imported 3 with 2 errors");
        assert_eq!(api.calls.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_progress_is_published_after_every_item() {
        let api = Arc::new(FakeApi {
            failing_rows: vec![1],
            ..FakeApi::default()
        });
        let driver = SubmissionDriver::new(api);

        let mut seen = Vec::new();
        driver
            .submit_with_progress(&drafts(3), |step| {
                seen.push((step.row, step.error.is_some(), step.outcome.processed, step.outcome.errors));
            })
            .await;

        assert_eq!(seen, vec![(1, true, 1, 1), (2, false, 2, 1), (3, false, 3, 1)]);
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_item() {
        let flag = CancelFlag::new();
        let api = Arc::new(FakeApi {
            cancel_after: Some((2, flag.clone())),
            ..FakeApi::default()
        });
        let driver = SubmissionDriver::new(api.clone()).with_cancel(flag);

        let outcome = driver.submit(&drafts(5)).await;

        // The in-flight call completes, nothing after it is sent
        assert_eq!(outcome.processed, 2);
        assert!(outcome.cancelled);
        assert!(!outcome.is_complete());
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let driver = SubmissionDriver::new(Arc::new(FakeApi::default()));
        let outcome = driver.submit(&[]).await;
        assert_eq!(outcome, ImportOutcome::new(0));
        assert!(outcome.is_success());
    }
}
