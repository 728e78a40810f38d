//! Snapshot documents: the JSON shape produced by `aws s3api list-multipart-uploads`.

use crate::error::ParseError;
use crate::models::UploadRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Principal {
    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(rename = "DisplayName", default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SnapshotUpload {
    key: String,
    upload_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initiated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<Principal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initiator: Option<Principal>,
}

impl From<SnapshotUpload> for UploadRecord {
    fn from(raw: SnapshotUpload) -> Self {
        Self {
            key: raw.key,
            upload_id: raw.upload_id,
            initiated_at: raw.initiated,
            initiator_id: raw.initiator.and_then(|p| p.id),
            owner_id: raw.owner.and_then(|p| p.id),
            storage_class: raw.storage_class,
        }
    }
}

impl From<&UploadRecord> for SnapshotUpload {
    fn from(record: &UploadRecord) -> Self {
        let principal = |id: &Option<String>| {
            id.as_ref().map(|id| Principal {
                id: Some(id.clone()),
                display_name: None,
            })
        };
        Self {
            key: record.key.clone(),
            upload_id: record.upload_id.clone(),
            initiated: record.initiated_at.clone(),
            storage_class: record.storage_class.clone(),
            owner: principal(&record.owner_id),
            initiator: principal(&record.initiator_id),
        }
    }
}

#[derive(Serialize)]
struct SnapshotDocument {
    #[serde(rename = "Uploads")]
    uploads: Vec<SnapshotUpload>,
}

/// Decode snapshot text into upload records.
///
/// The whole document is rejected if any element is malformed; an empty
/// `Uploads` list is valid and yields no records.
pub fn parse_snapshot(content: &str) -> Result<Vec<UploadRecord>, ParseError> {
    let document: Value = serde_json::from_str(content)?;

    let uploads = match document.get("Uploads") {
        None => return Err(ParseError::MissingUploads),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ParseError::UploadsNotList),
    };

    uploads
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw = SnapshotUpload::deserialize(item)
                .map_err(|source| ParseError::InvalidRecord { index, source })?;
            if raw.key.is_empty() {
                return Err(ParseError::EmptyKey { index });
            }
            Ok(raw.into())
        })
        .collect()
}

/// Parse upload listings returned by the store, where a missing `Uploads`
/// field means nothing is open.
pub(crate) fn parse_listing(content: &str) -> Result<Vec<UploadRecord>, serde_json::Error> {
    #[derive(Deserialize)]
    struct Listing {
        #[serde(rename = "Uploads", default)]
        uploads: Option<Vec<SnapshotUpload>>,
    }

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let listing: Listing = serde_json::from_str(content)?;
    Ok(listing
        .uploads
        .unwrap_or_default()
        .into_iter()
        .map(UploadRecord::from)
        .collect())
}

pub async fn load_snapshot(path: &Path) -> Result<Vec<UploadRecord>, ParseError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ParseError::Io {
            path: path.display().to_string(),
            source,
        })?;
    parse_snapshot(&content)
}

/// Render records back into a snapshot document that [`parse_snapshot`] accepts.
pub fn render_snapshot(records: &[UploadRecord]) -> Result<String, serde_json::Error> {
    let document = SnapshotDocument {
        uploads: records.iter().map(SnapshotUpload::from).collect(),
    };
    serde_json::to_string_pretty(&document)
}
