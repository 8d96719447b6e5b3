//! Upload descriptors, the [`MediaHost`] seam and the [`MediaUploader`] that
//! ties classification to forwarding.

use std::sync::Arc;

use async_trait::async_trait;
use store::MediaKind;
use thiserror::Error;
use tokio::io::AsyncRead;

use super::classify::UploadPlan;

#[derive(Debug, Error)]
pub enum UploadError {
    /// The provider rejected the upload; carries its message.
    #[error("{0}")]
    Failed(String),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("could not read upload: {0}")]
    Read(#[from] std::io::Error),

    #[error("media uploads are not configured")]
    NotConfigured,
}

pub type UploadContent = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// A file received from a client, consumed exactly once by a [`MediaHost`].
pub struct UploadDescriptor {
    pub filename: String,
    pub mime_type: String,
    pub len: Option<u64>,
    content: UploadContent,
}

impl std::fmt::Debug for UploadDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadDescriptor")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

impl UploadDescriptor {
    pub fn new(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        content: impl AsyncRead + Send + Sync + Unpin + 'static,
    ) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            len: None,
            content: Box::new(content),
        }
    }

    pub fn from_bytes(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        let len = bytes.len() as u64;
        Self::new(filename, mime_type, std::io::Cursor::new(bytes)).with_len(len)
    }

    pub fn with_len(mut self, len: u64) -> Self {
        self.len = Some(len);
        self
    }

    pub fn into_content(self) -> UploadContent {
        self.content
    }
}

/// Where the provider put the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub secure_url: String,
    pub public_id: String,
}

/// Remote media storage.
#[async_trait]
pub trait MediaHost: Send + Sync {
    async fn upload(&self, plan: &UploadPlan, file: UploadDescriptor) -> Result<StoredMedia, UploadError>;
}

/// Installed when no provider credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMediaHost;

#[async_trait]
impl MediaHost for DisabledMediaHost {
    async fn upload(&self, _plan: &UploadPlan, file: UploadDescriptor) -> Result<StoredMedia, UploadError> {
        tracing::warn!(filename = %file.filename, "upload rejected, no media host configured");
        Err(UploadError::NotConfigured)
    }
}

/// Classifies an upload and forwards it with the configured tags.
#[derive(Clone)]
pub struct MediaUploader {
    host: Arc<dyn MediaHost>,
    tags: Vec<String>,
}

impl MediaUploader {
    pub fn new(host: Arc<dyn MediaHost>, tags: Vec<String>) -> Self {
        Self { host, tags }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledMediaHost), Vec::new())
    }

    /// Uploads `file`, adding `extra_tags` to the configured ones.
    pub async fn process(
        &self,
        file: UploadDescriptor,
        extra_tags: &[&str],
    ) -> Result<(MediaKind, StoredMedia), UploadError> {
        let mut tags = self.tags.clone();
        tags.extend(extra_tags.iter().map(|t| t.to_string()));
        let plan = UploadPlan::for_mime(&file.mime_type, tags);

        tracing::info!(
            filename = %file.filename,
            mime_type = %file.mime_type,
            folder = %plan.folder,
            "forwarding upload"
        );
        let stored = self.host.upload(&plan, file).await?;
        tracing::info!(public_id = %stored.public_id, "upload stored");
        Ok((plan.kind, stored))
    }
}
