use crate::services::store::UploadStore;

/// Fetch the upload ids currently open for exactly `key`, in store order.
///
/// A failed lookup yields an empty set: without authoritative ids there is
/// nothing safe to abort.
pub async fn resolve(store: &dyn UploadStore, key: &str) -> Vec<String> {
    match store.list_uploads(key).await {
        Ok(uploads) => {
            let mut ids: Vec<String> = Vec::new();
            for upload in uploads.into_iter().filter(|u| u.key == key) {
                if !ids.contains(&upload.upload_id) {
                    ids.push(upload.upload_id);
                }
            }
            tracing::debug!("Resolved {} open upload(s) for {}", ids.len(), key);
            ids
        }
        Err(e) => {
            tracing::warn!(
                "⚠️  Could not resolve current uploads for {}, skipping it: {}",
                key,
                e
            );
            Vec::new()
        }
    }
}
