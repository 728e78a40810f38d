use crate::models::OperationOutcome;
use crate::services::store::UploadStore;
use std::time::Duration;
use tokio::time::sleep;

/// First attempt plus one retry.
pub const MAX_ABORT_ATTEMPTS: u32 = 2;

/// Aborts one resolved upload, retrying once after a fixed delay.
#[derive(Debug, Clone)]
pub struct AbortExecutor {
    retry_delay: Duration,
}

impl AbortExecutor {
    pub fn new(retry_delay: Duration) -> Self {
        Self { retry_delay }
    }

    /// Never returns an error: a second failure becomes
    /// [`OperationOutcome::Failed`] with the store's error text. A "no such
    /// upload" answer is a failure like any other.
    pub async fn execute(
        &self,
        store: &dyn UploadStore,
        key: &str,
        upload_id: &str,
    ) -> OperationOutcome {
        let mut attempt = 1;
        loop {
            match store.abort_upload(key, upload_id).await {
                Ok(()) => {
                    tracing::info!("🗑️  Aborted {} ({})", key, upload_id);
                    return OperationOutcome::Aborted {
                        key: key.to_string(),
                        upload_id: upload_id.to_string(),
                    };
                }
                Err(e) if attempt < MAX_ABORT_ATTEMPTS => {
                    tracing::warn!(
                        "Abort of {} ({}) failed on attempt {}, retrying in {:?}: {}",
                        key,
                        upload_id,
                        attempt,
                        self.retry_delay,
                        e
                    );
                    sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("❌ Failed to abort {} ({}): {}", key, upload_id, e);
                    return OperationOutcome::Failed {
                        key: key.to_string(),
                        upload_id: upload_id.to_string(),
                        error: e.to_string(),
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{ScriptedStore, command_failure};

    fn executor() -> AbortExecutor {
        AbortExecutor::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let store = ScriptedStore::default();
        let outcome = executor().execute(&store, "k", "u1").await;
        assert!(matches!(outcome, OperationOutcome::Aborted { .. }));
        assert_eq!(store.abort_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_yields_single_aborted() {
        let store = ScriptedStore::with_aborts(vec![Err(command_failure("SlowDown")), Ok(())]);
        let outcome = executor().execute(&store, "k", "u1").await;
        assert_eq!(
            outcome,
            OperationOutcome::Aborted {
                key: "k".to_string(),
                upload_id: "u1".to_string(),
            }
        );
        assert_eq!(store.abort_count(), 2);
    }

    #[tokio::test]
    async fn test_two_failures_record_failed_without_third_attempt() {
        let store = ScriptedStore::with_aborts(vec![
            Err(command_failure("first")),
            Err(command_failure("NoSuchUpload")),
            Ok(()),
        ]);
        let outcome = executor().execute(&store, "k", "u1").await;
        match outcome {
            OperationOutcome::Failed { error, .. } => {
                assert!(error.contains("NoSuchUpload"));
                assert!(error.contains("255"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(store.abort_count(), 2);
    }
}
