//! Object storage for venue photos.
//!
//! Production uploads go to a Supabase storage bucket over its REST API.
//! Tests use the in-memory store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Error type for object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    RequestFailed(String),

    #[error("storage rejected upload: {status} - {message}")]
    UploadRejected { status: u16, message: String },

    #[error("object already exists: {0}")]
    AlreadyExists(String),
}

/// Trait for photo object stores.
///
/// Uploads never overwrite: a key collision is an error, not a replace.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under a key. Fails if the key is already taken.
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError>;

    /// Public URL for a stored object, if the store can serve one.
    fn public_url(&self, key: &str) -> Option<String>;
}

/// Connection settings for a Supabase storage bucket.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
}

/// Supabase storage client.
#[derive(Debug)]
pub struct SupabaseStorage {
    config: StorageConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    /// Create a new SupabaseStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url(),
            self.config.bucket,
            key
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.service_key)
            .header("content-type", content_type)
            // Uploads must never clobber an existing object.
            .header("x-upsert", "false")
            .timeout(REQUEST_TIMEOUT)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::UploadRejected { status, message });
        }

        tracing::debug!("uploaded {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        Some(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url(),
            self.config.bucket,
            key
        ))
    }
}

/// In-memory object store for testing.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    fail_uploads: bool,
    without_public_urls: bool,
}

#[allow(dead_code)]
impl MemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every upload is rejected.
    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    /// Create a store that accepts uploads but cannot serve public URLs.
    pub fn without_public_urls() -> Self {
        Self {
            without_public_urls: true,
            ..Self::default()
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All stored keys, unordered.
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    /// Stored bytes and content type for a key.
    pub fn get(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StorageError> {
        if self.fail_uploads {
            return Err(StorageError::UploadRejected {
                status: 500,
                message: "injected failure".to_string(),
            });
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        objects.insert(key.to_string(), (bytes.to_vec(), content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        if self.without_public_urls {
            None
        } else {
            Some(format!("memory://{}", key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_refuses_overwrite() {
        let store = MemoryObjectStore::new();
        store.upload("a/b.jpg", &[1], "image/jpeg").await.unwrap();

        let err = store.upload("a/b.jpg", &[2], "image/jpeg").await.unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        // First write survives.
        assert_eq!(store.get("a/b.jpg").unwrap().0, vec![1]);
    }

    #[tokio::test]
    async fn failing_store_rejects_every_upload() {
        let store = MemoryObjectStore::failing_uploads();
        let err = store.upload("a/b.jpg", &[1], "image/jpeg").await.unwrap_err();
        assert!(matches!(err, StorageError::UploadRejected { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn urlless_store_accepts_but_cannot_serve() {
        let store = MemoryObjectStore::without_public_urls();
        store.upload("a/b.jpg", &[1], "image/jpeg").await.unwrap();
        assert_eq!(store.public_url("a/b.jpg"), None);
    }

    #[test]
    fn supabase_public_url_shape() {
        let storage = SupabaseStorage::new(StorageConfig {
            base_url: "https://example.supabase.co/".to_string(),
            service_key: "key".to_string(),
            bucket: "venue-photos".to_string(),
        });
        assert_eq!(
            storage.public_url("venues/x/1.jpg"),
            Some(
                "https://example.supabase.co/storage/v1/object/public/venue-photos/venues/x/1.jpg"
                    .to_string()
            )
        );
    }
}
