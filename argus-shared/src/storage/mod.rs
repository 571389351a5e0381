/// Blob storage for uploaded files
///
/// The database keeps only file metadata; the bytes live in an
/// S3-compatible bucket (MinIO in development). Handlers talk to the
/// [`ObjectStore`] trait so tests can swap in [`MemoryObjectStore`].
///
/// # Example
///
/// ```
/// use argus_shared::storage::{MemoryObjectStore, ObjectStore};
/// use bytes::Bytes;
///
/// # async fn example() -> Result<(), argus_shared::storage::StorageError> {
/// let store = MemoryObjectStore::new("localhost:9000", "argus");
/// store.put("report.pdf", Bytes::from_static(b"%PDF"), Some("application/pdf")).await?;
/// assert_eq!(store.url("report.pdf"), "http://localhost:9000/argus/report.pdf");
/// # Ok(())
/// # }
/// ```

pub mod s3;

pub use s3::{S3ObjectStore, S3Settings};

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the bucket if it does not exist yet
    async fn ensure_bucket(&self) -> Result<(), StorageError>;

    async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>)
        -> Result<(), StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Public URL of an object, `http://{endpoint}/{bucket}/{key}`
    fn url(&self, key: &str) -> String;
}

pub(crate) fn object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!("http://{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key)
}

/// In-process store used by tests and local tooling
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    endpoint: String,
    bucket: String,
    objects: Mutex<HashMap<String, (Bytes, Option<String>)>>,
    fail_deletes: bool,
}

impl MemoryObjectStore {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Every `delete` returns a backend error
    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .map(|(body, _)| body.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .and_then(|(_, ct)| ct.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), StorageError> {
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), (body, content_type.map(str::to_string)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_deletes {
            return Err(StorageError::Backend("delete disabled".to_string()));
        }
        self.objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn url(&self, key: &str) -> String {
        object_url(&self.endpoint, &self.bucket, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_put_delete() {
        let store = MemoryObjectStore::new("minio:9000", "docs");
        store
            .put("a.txt", Bytes::from_static(b"hello"), Some("text/plain"))
            .await
            .unwrap();

        assert_eq!(store.get("a.txt"), Some(Bytes::from_static(b"hello")));
        assert_eq!(store.content_type("a.txt").as_deref(), Some("text/plain"));
        assert_eq!(store.len(), 1);

        store.delete("a.txt").await.unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.delete("a.txt").await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_failing_deletes() {
        let store = MemoryObjectStore::new("minio:9000", "docs").with_failing_deletes();
        store.put("k", Bytes::new(), None).await.unwrap();
        assert!(matches!(store.delete("k").await, Err(StorageError::Backend(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_object_url() {
        assert_eq!(object_url("localhost:9000/", "argus", "x/y.png"), "http://localhost:9000/argus/x/y.png");
    }
}
