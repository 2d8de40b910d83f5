//! Receipt file storage.

use std::collections::HashMap;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::appwrite::AppwriteClient;
use crate::metrics::StoreTimer;
use crate::store::StoreError;

/// A file to store.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait::async_trait]
pub trait FileStorage: Send + Sync {
    /// Store a file under a fresh id and return the id.
    async fn upload(&self, file: FileUpload) -> Result<String, StoreError>;

    /// Public view URL for a stored file.
    fn view_url(&self, file_id: &str) -> String;
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    #[serde(rename = "$id")]
    id: String,
}

/// Appwrite storage bucket.
#[derive(Clone)]
pub struct AppwriteFileStorage {
    client: AppwriteClient,
    bucket_id: String,
}

impl AppwriteFileStorage {
    pub fn new(client: AppwriteClient, bucket_id: impl Into<String>) -> Self {
        Self {
            client,
            bucket_id: bucket_id.into(),
        }
    }
}

#[async_trait::async_trait]
impl FileStorage for AppwriteFileStorage {
    async fn upload(&self, file: FileUpload) -> Result<String, StoreError> {
        let timer = StoreTimer::new("upload_file", self.bucket_id.clone());
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.content_type)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let form = Form::new()
            .text("fileId", shared::crypto::generate_document_id())
            .part("file", part);

        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/buckets/{}/files", self.bucket_id),
            )
            .multipart(form);
        let result = self.client.send_json::<UploadedFile>(request).await;
        timer.finish(result.is_ok());

        Ok(result?.id)
    }

    fn view_url(&self, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}",
            self.client.endpoint(),
            self.bucket_id,
            file_id,
            self.client.project_id()
        )
    }
}

/// File storage kept in memory.
#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    files: Mutex<HashMap<String, FileUpload>>,
    /// Whether uploads should fail.
    pub simulate_failure: bool,
}

impl MemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage whose uploads always fail.
    pub fn failing() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            simulate_failure: true,
        }
    }

    pub async fn get(&self, file_id: &str) -> Option<FileUpload> {
        self.files.lock().await.get(file_id).cloned()
    }
}

#[async_trait::async_trait]
impl FileStorage for MemoryFileStorage {
    async fn upload(&self, file: FileUpload) -> Result<String, StoreError> {
        if self.simulate_failure {
            return Err(StoreError::Http("simulated upload failure".into()));
        }
        let id = shared::crypto::generate_document_id();
        self.files.lock().await.insert(id.clone(), file);
        Ok(id)
    }

    fn view_url(&self, file_id: &str) -> String {
        format!("memory://receipts/{}", file_id)
    }
}
