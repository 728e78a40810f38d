use crate::error::StoreError;
use crate::models::UploadRecord;
use async_trait::async_trait;
use aws_sdk_s3::Client;

/// The two store operations reconciliation relies on.
///
/// Both are treated as idempotent at the key + upload id level.
#[async_trait]
pub trait UploadStore: Send + Sync {
    /// Every open multipart upload whose key starts with `key_prefix`.
    async fn list_uploads(&self, key_prefix: &str) -> Result<Vec<UploadRecord>, StoreError>;

    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError>;
}

pub struct S3UploadStore {
    client: Client,
    bucket: String,
}

impl S3UploadStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl UploadStore for S3UploadStore {
    async fn list_uploads(&self, key_prefix: &str) -> Result<Vec<UploadRecord>, StoreError> {
        let mut uploads = Vec::new();
        let mut key_marker = None;
        let mut upload_id_marker = None;

        loop {
            let res = self
                .client
                .list_multipart_uploads()
                .bucket(&self.bucket)
                .prefix(key_prefix)
                .set_key_marker(key_marker)
                .set_upload_id_marker(upload_id_marker)
                .send()
                .await
                .map_err(|e| StoreError::Sdk {
                    operation: "ListMultipartUploads",
                    message: format!("{}", aws_sdk_s3::error::DisplayErrorContext(e)),
                })?;

            for upload in res.uploads() {
                let (Some(key), Some(upload_id)) = (upload.key(), upload.upload_id()) else {
                    continue;
                };
                uploads.push(UploadRecord {
                    key: key.to_string(),
                    upload_id: upload_id.to_string(),
                    initiated_at: upload.initiated().and_then(|d| {
                        chrono::DateTime::from_timestamp(d.secs(), d.subsec_nanos())
                            .map(|t| t.to_rfc3339())
                    }),
                    initiator_id: upload
                        .initiator()
                        .and_then(|i| i.id())
                        .map(str::to_string),
                    owner_id: upload.owner().and_then(|o| o.id()).map(str::to_string),
                    storage_class: upload.storage_class().map(|c| c.as_str().to_string()),
                });
            }

            if res.is_truncated().unwrap_or(false) {
                key_marker = res.next_key_marker().map(str::to_string);
                upload_id_marker = res.next_upload_id_marker().map(str::to_string);
                if key_marker.is_none() && upload_id_marker.is_none() {
                    tracing::warn!(
                        "Truncated upload listing for prefix {} carried no markers, stopping",
                        key_prefix
                    );
                    break;
                }
            } else {
                break;
            }
        }

        Ok(uploads)
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError> {
        let res = self
            .client
            .abort_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await;

        if let Err(e) = res {
            tracing::debug!(
                "S3 abort_multipart_upload failed: bucket={}, key={}, upload_id={}, error={:?}",
                self.bucket,
                key,
                upload_id,
                e
            );
            return Err(StoreError::Sdk {
                operation: "AbortMultipartUpload",
                message: format!("{}", aws_sdk_s3::error::DisplayErrorContext(e)),
            });
        }
        Ok(())
    }
}
