//! Event image storage
//!
//! Batches run one item at a time and stop at the first failure. The error
//! records which items completed so the caller can retry the remainder.

use crate::config::MediaConfig;
use crate::error::{EventError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Image bytes ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a local file, guessing the content type from its extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            EventError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        let content_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            _ => "application/octet-stream",
        };
        Ok(Self::new(content_type, bytes))
    }

    /// File extension for the stored object
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

/// External object storage addressed by generated URL
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `upload` under `key`, returning its download URL
    async fn put_object(&self, key: &str, upload: &ImageUpload) -> Result<String>;

    async fn delete_by_url(&self, url: &str) -> Result<()>;
}

/// Blob store reached over plain HTTP `PUT` / `DELETE`
#[derive(Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    #[instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    async fn put_object(&self, key: &str, upload: &ImageUpload) -> Result<String> {
        let url = self.object_url(key);
        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, upload.content_type.as_str())
            .body(upload.bytes.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Blob upload failed");
            return Err(EventError::StoreUnavailable(format!(
                "upload of {} failed with status {}",
                key, status
            )));
        }

        Ok(url)
    }

    #[instrument(skip(self))]
    async fn delete_by_url(&self, url: &str) -> Result<()> {
        let response = self.client.delete(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Blob delete failed");
            return Err(EventError::StoreUnavailable(format!(
                "delete of {} failed with status {}",
                url, status
            )));
        }

        Ok(())
    }
}

const MEMORY_URL_PREFIX: &str = "https://memory.invalid/event-media/";

/// Process-local blob store for development and tests
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, ImageUpload>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.objects.read().await.contains_key(url)
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put_object(&self, key: &str, upload: &ImageUpload) -> Result<String> {
        let url = format!("{MEMORY_URL_PREFIX}{key}");
        self.objects
            .write()
            .await
            .insert(url.clone(), upload.clone());
        Ok(url)
    }

    async fn delete_by_url(&self, url: &str) -> Result<()> {
        match self.objects.write().await.remove(url) {
            Some(_) => Ok(()),
            None => Err(EventError::NotFound(format!("image {url}"))),
        }
    }
}

/// Uploads and deletes event images against a [`BlobStore`]
#[derive(Clone)]
pub struct MediaManager {
    store: Arc<dyn BlobStore>,
    config: MediaConfig,
}

impl MediaManager {
    pub fn new(store: Arc<dyn BlobStore>, config: MediaConfig) -> Self {
        Self { store, config }
    }

    /// Manager backed by an [`InMemoryBlobStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBlobStore::new()), MediaConfig::default())
    }

    /// HTTP store when `base_url` is configured, in-memory otherwise
    pub fn from_config(config: MediaConfig) -> Self {
        let store: Arc<dyn BlobStore> = match &config.base_url {
            Some(base_url) => Arc::new(HttpBlobStore::new(base_url.clone())),
            None => Arc::new(InMemoryBlobStore::new()),
        };
        Self::new(store, config)
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    /// `{folder}/{eventId}_image_{index}_{epochMillis}.{ext}`
    pub fn image_key(&self, event_id: &str, index: usize, millis: i64, extension: &str) -> String {
        format!(
            "{}/{}_image_{}_{}.{}",
            self.config.folder, event_id, index, millis, extension
        )
    }

    /// Upload images in order, returning URLs in input order
    #[instrument(skip(self, uploads), fields(count = uploads.len()))]
    pub async fn upload_images(&self, event_id: &str, uploads: &[ImageUpload]) -> Result<Vec<String>> {
        if uploads.len() > self.config.max_images {
            return Err(EventError::validation(format!(
                "Maximum {} images allowed per event",
                self.config.max_images
            )));
        }

        let total = uploads.len();
        let mut completed = Vec::with_capacity(total);

        for (index, upload) in uploads.iter().enumerate() {
            let key = self.image_key(
                event_id,
                index,
                Utc::now().timestamp_millis(),
                upload.extension(),
            );

            match self.store.put_object(&key, upload).await {
                Ok(url) => {
                    debug!(index, url = %url, "Image uploaded");
                    completed.push(url);
                }
                Err(err) => {
                    warn!(index, error = %err, "Image upload failed; aborting batch");
                    let rolled_back = self.config.rollback_on_failure && self.rollback(&completed).await;
                    return Err(EventError::PartialBatchFailure {
                        operation: "image upload".to_string(),
                        completed,
                        failed_at: index,
                        total,
                        rolled_back,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(count = completed.len(), "Images uploaded");
        Ok(completed)
    }

    /// Remove uploaded blobs after a failed batch; true when all were removed
    async fn rollback(&self, urls: &[String]) -> bool {
        let mut clean = true;
        for url in urls {
            if let Err(err) = self.store.delete_by_url(url).await {
                warn!(url = %url, error = %err, "Rollback left an orphaned image");
                clean = false;
            }
        }
        clean
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, url: &str) -> Result<()> {
        self.store.delete_by_url(url).await
    }

    /// Delete in order, stopping at the first failure. Earlier deletions stay applied.
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn delete_images(&self, urls: &[String]) -> Result<()> {
        let total = urls.len();

        for (index, url) in urls.iter().enumerate() {
            if let Err(err) = self.store.delete_by_url(url).await {
                warn!(index, url = %url, error = %err, "Image delete failed; aborting batch");
                return Err(EventError::PartialBatchFailure {
                    operation: "image delete".to_string(),
                    completed: urls[..index].to_vec(),
                    failed_at: index,
                    total,
                    rolled_back: false,
                    reason: err.to_string(),
                });
            }
        }

        info!(count = total, "Images deleted");
        Ok(())
    }
}
