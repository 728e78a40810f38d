use crate::config::{ConnectionParams, ReaperConfig};
use crate::error::ParseError;
use crate::models::{OperationOutcome, RunMode, SkipReason, Summary, UploadRecord};
use crate::services::abort::AbortExecutor;
use crate::services::resolver::resolve;
use crate::services::snapshot::parse_snapshot;
use crate::services::store::UploadStore;
use crate::services::verifier::verify;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Timing knobs for a run.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Program name shown in previewed abort commands
    pub command_program: String,
    pub abort_retry_delay: Duration,
    pub record_pause: Duration,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            command_program: "aws".to_string(),
            abort_retry_delay: Duration::from_millis(2000),
            record_pause: Duration::from_millis(500),
        }
    }
}

impl From<&ReaperConfig> for ReconcileSettings {
    fn from(config: &ReaperConfig) -> Self {
        Self {
            command_program: config.aws_cli.clone(),
            abort_retry_delay: config.abort_retry_delay,
            record_pause: config.record_pause,
        }
    }
}

/// Drives verify → resolve → abort over a snapshot, one record at a time.
///
/// Aborts only ever use ids freshly resolved from the store. Snapshot ids are
/// used for previews and log context, nothing else.
pub struct Reconciler {
    store: Arc<dyn UploadStore>,
    connection: ConnectionParams,
    settings: ReconcileSettings,
    executor: AbortExecutor,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn UploadStore>,
        connection: ConnectionParams,
        settings: ReconcileSettings,
    ) -> Self {
        let executor = AbortExecutor::new(settings.abort_retry_delay);
        Self {
            store,
            connection,
            settings,
            executor,
        }
    }

    /// Parse `content` and reconcile it. Parse failures stop the run before
    /// the store is contacted.
    pub async fn run_snapshot(&self, content: &str, mode: RunMode) -> Result<Summary, ParseError> {
        let records = parse_snapshot(content)?;
        Ok(self.run(&records, mode).await)
    }

    pub async fn run(&self, records: &[UploadRecord], mode: RunMode) -> Summary {
        if mode == RunMode::Preview {
            return preview(records, &self.connection, &self.settings.command_program);
        }

        let mut summary = Summary::new(mode, records.len());

        if records.is_empty() {
            tracing::info!("✨ Snapshot lists no uploads, nothing to do");
            return summary;
        }

        tracing::info!(
            "🚀 Reconciling {} snapshot record(s) in {} mode (bucket {})",
            records.len(),
            mode,
            self.connection.bucket
        );

        match mode {
            // returned above
            RunMode::Preview => {}
            RunMode::Test => {
                // records is non-empty here
                self.process_record(&records[0], &mut summary).await;
            }
            RunMode::Full => {
                for (index, record) in records.iter().enumerate() {
                    if index > 0 && !self.settings.record_pause.is_zero() {
                        sleep(self.settings.record_pause).await;
                    }
                    self.process_record(record, &mut summary).await;
                }
            }
        }

        tracing::info!(
            "✅ Run finished: {} aborted, {} skipped, {} failed ({} input entries)",
            summary.aborted,
            summary.skipped,
            summary.failed,
            summary.total_input_entries
        );
        summary
    }

    async fn process_record(&self, record: &UploadRecord, summary: &mut Summary) {
        let store = self.store.as_ref();
        summary.records_processed += 1;

        if !verify(store, record).await.is_live {
            tracing::info!("⏭️  Skipping {}: no open upload (stale record)", record.key);
            summary.record(OperationOutcome::Skipped {
                key: record.key.clone(),
                reason: SkipReason::Stale,
            });
            return;
        }

        let upload_ids = resolve(store, &record.key).await;
        if upload_ids.is_empty() {
            tracing::info!(
                "⏭️  Skipping {}: uploads disappeared before they could be aborted",
                record.key
            );
            summary.record(OperationOutcome::Skipped {
                key: record.key.clone(),
                reason: SkipReason::RacedAway,
            });
            return;
        }

        if !upload_ids.contains(&record.upload_id) {
            tracing::debug!(
                "Snapshot id {} for {} is not open; aborting {} current upload(s) instead",
                record.upload_id,
                record.key,
                upload_ids.len()
            );
        }

        for upload_id in &upload_ids {
            let outcome = self.executor.execute(store, &record.key, upload_id).await;
            summary.record(outcome);
        }
    }
}

/// Render the abort command for every record without contacting the store.
///
/// Needs no [`UploadStore`], so callers can preview a snapshot before any
/// client or credentials exist.
pub fn preview(
    records: &[UploadRecord],
    connection: &ConnectionParams,
    command_program: &str,
) -> Summary {
    let mut summary = Summary::new(RunMode::Preview, records.len());
    if records.is_empty() {
        tracing::info!("✨ Snapshot lists no uploads, nothing to do");
        return summary;
    }

    for record in records {
        let command = connection.abort_command(command_program, &record.key, &record.upload_id);
        tracing::info!("🔎 Would run: {}", command);
        summary.records_processed += 1;
        summary.record(OperationOutcome::Previewed {
            key: record.key.clone(),
            upload_id: record.upload_id.clone(),
            command,
        });
    }

    tracing::info!(
        "✅ Preview finished: {} abort(s) would run ({} input entries)",
        summary.aborted,
        summary.total_input_entries
    );
    summary
}
