use serde::Serialize;
use std::fmt;

/// One in-progress multipart upload, as listed in a snapshot or by the store.
///
/// Only `key` and `upload_id` drive reconciliation; the rest is carried along
/// for reporting and snapshot capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadRecord {
    pub key: String,
    pub upload_id: String,
    pub initiated_at: Option<String>,
    pub initiator_id: Option<String>,
    pub owner_id: Option<String>,
    pub storage_class: Option<String>,
}

impl UploadRecord {
    pub fn new(key: impl Into<String>, upload_id: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            upload_id: upload_id.into(),
            initiated_at: None,
            initiator_id: None,
            owner_id: None,
            storage_class: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    pub is_live: bool,
}

/// Execution mode of a reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Show the abort commands that would run; never touch the store.
    Preview,
    /// Run the full pipeline for the first record only.
    Test,
    /// Run the full pipeline for every record.
    Full,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Preview => write!(f, "preview"),
            RunMode::Test => write!(f, "test"),
            RunMode::Full => write!(f, "full"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The store has no open upload for the key.
    Stale,
    /// The key was live at verification but had nothing open at resolution.
    RacedAway,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Stale => write!(f, "stale"),
            SkipReason::RacedAway => write!(f, "raced-away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum OperationOutcome {
    Aborted {
        key: String,
        upload_id: String,
    },
    Skipped {
        key: String,
        reason: SkipReason,
    },
    Failed {
        key: String,
        upload_id: String,
        error: String,
    },
    /// Preview only: the command that would have been issued.
    Previewed {
        key: String,
        upload_id: String,
        command: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedAbort {
    pub key: String,
    pub upload_id: String,
    pub error: String,
}

/// Aggregated result of one run.
///
/// `total_input_entries` counts snapshot records, while
/// [`Summary::actual_active_uploads_aborted`] counts real aborts. A record can
/// produce zero, one or several aborts, so the two routinely differ.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub mode: RunMode,
    pub total_input_entries: usize,
    pub records_processed: usize,
    pub aborted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<FailedAbort>,
    pub outcomes: Vec<OperationOutcome>,
}

impl Summary {
    pub fn new(mode: RunMode, total_input_entries: usize) -> Self {
        Self {
            mode,
            total_input_entries,
            records_processed: 0,
            aborted: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: OperationOutcome) {
        match &outcome {
            // Previews count as hypothetical successes.
            OperationOutcome::Aborted { .. } | OperationOutcome::Previewed { .. } => {
                self.aborted += 1
            }
            OperationOutcome::Skipped { .. } => self.skipped += 1,
            OperationOutcome::Failed {
                key,
                upload_id,
                error,
            } => {
                self.failed += 1;
                self.failures.push(FailedAbort {
                    key: key.clone(),
                    upload_id: upload_id.clone(),
                    error: error.clone(),
                });
            }
        }
        self.outcomes.push(outcome);
    }

    pub fn actual_active_uploads_aborted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, OperationOutcome::Aborted { .. }))
            .count()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, OperationOutcome::Skipped { reason: r, .. } if *r == reason))
            .count()
    }

    /// True when there was nothing in the snapshot to reconcile.
    pub fn is_nothing_to_do(&self) -> bool {
        self.total_input_entries == 0
    }

    /// The run-level failure signal. Preview and test runs never fail.
    pub fn has_failures(&self) -> bool {
        self.mode == RunMode::Full && self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(key: &str) -> OperationOutcome {
        OperationOutcome::Failed {
            key: key.to_string(),
            upload_id: "u1".to_string(),
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_record_counts_outcomes() {
        let mut summary = Summary::new(RunMode::Full, 3);
        summary.record(OperationOutcome::Aborted {
            key: "a".to_string(),
            upload_id: "u1".to_string(),
        });
        summary.record(OperationOutcome::Skipped {
            key: "b".to_string(),
            reason: SkipReason::Stale,
        });
        summary.record(failed("c"));

        assert_eq!(summary.aborted, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].key, "c");
        assert_eq!(summary.actual_active_uploads_aborted(), 1);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_failures_only_signal_in_full_mode() {
        let mut test_run = Summary::new(RunMode::Test, 1);
        test_run.record(failed("a"));
        assert_eq!(test_run.failed, 1);
        assert!(!test_run.has_failures());

        let mut preview = Summary::new(RunMode::Preview, 1);
        preview.record(failed("a"));
        assert!(!preview.has_failures());
    }

    #[test]
    fn test_preview_counts_as_hypothetical_success() {
        let mut summary = Summary::new(RunMode::Preview, 1);
        summary.record(OperationOutcome::Previewed {
            key: "a".to_string(),
            upload_id: "u1".to_string(),
            command: "aws s3api abort-multipart-upload".to_string(),
        });
        assert_eq!(summary.aborted, 1);
        assert_eq!(summary.actual_active_uploads_aborted(), 0);
    }

    #[test]
    fn test_skipped_for_splits_stale_and_raced_away() {
        let mut summary = Summary::new(RunMode::Full, 3);
        for (key, reason) in [
            ("a", SkipReason::Stale),
            ("b", SkipReason::RacedAway),
            ("c", SkipReason::Stale),
        ] {
            summary.record(OperationOutcome::Skipped {
                key: key.to_string(),
                reason,
            });
        }

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.skipped_for(SkipReason::Stale), 2);
        assert_eq!(summary.skipped_for(SkipReason::RacedAway), 1);
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::Stale.to_string(), "stale");
        assert_eq!(SkipReason::RacedAway.to_string(), "raced-away");
        let json = serde_json::to_value(OperationOutcome::Skipped {
            key: "k".to_string(),
            reason: SkipReason::RacedAway,
        })
        .unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "raced-away");
    }
}
