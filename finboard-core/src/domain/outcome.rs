//! Submission progress and final outcome

use serde::{Deserialize, Serialize};

/// Counters of a submission run
///
/// Published after every item. `processed` only grows and counts completed
/// calls, successful or not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub processed: usize,
    pub total: usize,
    pub errors: usize,
    /// Run stopped early on request
    #[serde(default)]
    pub cancelled: bool,
}

impl ImportOutcome {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.errors += 1;
    }

    pub fn succeeded(&self) -> usize {
        self.processed - self.errors
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.total
    }

    /// Every item was attempted and none failed
    pub fn is_success(&self) -> bool {
        self.is_complete() && self.errors == 0
    }

    /// One-line summary for the user
    pub fn summary(&self) -> String {
        let mut text = if self.errors == 0 {
            format!("Imported {} transactions", self.succeeded())
        } else {
            format!("Imported {} with {} errors", self.succeeded(), self.errors)
        };
        if self.cancelled {
            text.push_str(&format!(
                " (cancelled, {} of {} not attempted)",
                self.total - self.processed,
                self.total
            ));
        }
        text
    }
}
