use crate::models::{UploadRecord, VerificationResult};
use crate::services::store::UploadStore;

/// Ask the store whether the record's key still has any open upload.
///
/// The lookup is by key prefix and never by the record's upload id: the id in a
/// snapshot may be long gone while a different upload for the same key is open.
/// Store errors are treated as live so the record still reaches resolution.
pub async fn verify(store: &dyn UploadStore, record: &UploadRecord) -> VerificationResult {
    match store.list_uploads(&record.key).await {
        Ok(uploads) => {
            let is_live = uploads.iter().any(|u| u.key == record.key);
            tracing::debug!(
                "Verified {}: {} (snapshot id {})",
                record.key,
                if is_live { "live" } else { "stale" },
                record.upload_id
            );
            VerificationResult { is_live }
        }
        Err(e) => {
            tracing::warn!(
                "⚠️  Could not verify {}, assuming it is still live: {}",
                record.key,
                e
            );
            VerificationResult { is_live: true }
        }
    }
}
