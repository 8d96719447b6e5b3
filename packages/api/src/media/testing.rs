use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use super::classify::UploadPlan;
use super::upload::{MediaHost, StoredMedia, UploadDescriptor, UploadError};

#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub plan: UploadPlan,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Media host double that reads each upload to the end and records it.
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<RecordedUpload>>,
    failure: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::default(),
            failure: Some(message.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedUpload> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaHost for RecordingHost {
    async fn upload(&self, plan: &UploadPlan, file: UploadDescriptor) -> Result<StoredMedia, UploadError> {
        let filename = file.filename.clone();
        let mut bytes = Vec::new();
        file.into_content().read_to_end(&mut bytes).await?;
        self.calls.lock().unwrap().push(RecordedUpload {
            plan: plan.clone(),
            filename: filename.clone(),
            bytes,
        });

        if let Some(message) = &self.failure {
            return Err(UploadError::Failed(message.clone()));
        }
        let public_id = format!("{}/{}", plan.folder, filename);
        Ok(StoredMedia {
            secure_url: format!("https://media.example/{public_id}"),
            public_id,
        })
    }
}
