use crate::error::StoreError;
use crate::models::UploadRecord;
use crate::services::store::UploadStore;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Store that replays canned answers and counts calls.
#[derive(Default)]
pub struct ScriptedStore {
    pub listings: Mutex<VecDeque<Result<Vec<UploadRecord>, StoreError>>>,
    pub aborts: Mutex<VecDeque<Result<(), StoreError>>>,
    pub list_calls: Mutex<Vec<String>>,
    pub abort_calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedStore {
    pub fn with_listings(listings: Vec<Result<Vec<UploadRecord>, StoreError>>) -> Self {
        Self {
            listings: Mutex::new(listings.into()),
            ..Default::default()
        }
    }

    pub fn with_aborts(aborts: Vec<Result<(), StoreError>>) -> Self {
        Self {
            aborts: Mutex::new(aborts.into()),
            ..Default::default()
        }
    }

    pub fn abort_count(&self) -> usize {
        self.abort_calls.lock().unwrap().len()
    }
}

pub fn command_failure(output: &str) -> StoreError {
    StoreError::Command {
        status: "exit status: 255".to_string(),
        output: output.to_string(),
    }
}

#[async_trait]
impl UploadStore for ScriptedStore {
    async fn list_uploads(&self, key_prefix: &str) -> Result<Vec<UploadRecord>, StoreError> {
        self.list_calls.lock().unwrap().push(key_prefix.to_string());
        self.listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn abort_upload(&self, key: &str, upload_id: &str) -> Result<(), StoreError> {
        self.abort_calls
            .lock()
            .unwrap()
            .push((key.to_string(), upload_id.to_string()));
        self.aborts.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
