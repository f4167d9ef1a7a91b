//! `BlobStore`: object storage with multi-part upload sessions and signed
//! read URLs (component B).

use crate::error::CoreError;
use async_trait::async_trait;
use shared_types::UploadedChunk;

/// CORS configuration applied to a ceremony's bucket at setup.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_methods: Vec<String>,
    pub exposed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_methods: vec!["GET".to_string(), "PUT".to_string()],
            exposed_headers: vec!["ETag".to_string(), "Content-Length".to_string()],
        }
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Creates the per-ceremony bucket with the given CORS configuration and
    /// public-access block disabled so signed reads work.
    async fn create_bucket(&self, bucket: &str, cors: CorsConfig) -> Result<(), CoreError>;

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), CoreError>;
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CoreError>;
    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, CoreError>;

    /// A pre-signed GET URL valid for `ttl_secs` seconds.
    async fn signed_get_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, CoreError>;

    /// Opens a multi-part upload session, returning its `uploadId`.
    /// Idempotent: re-opening for the same `(bucket, key)` while a
    /// session is outstanding must return the same id.
    async fn open_multipart_upload(&self, bucket: &str, key: &str) -> Result<String, CoreError>;

    /// Signs `number_of_parts` PUT URLs for the given upload session, each
    /// valid for `ttl_secs`. Numbering starts at 1.
    async fn sign_upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        number_of_parts: u32,
        ttl_secs: u64,
    ) -> Result<Vec<String>, CoreError>;

    /// Completes the upload, returning the final object location.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedChunk>,
    ) -> Result<String, CoreError>;

    /// Aborts an in-flight multi-part upload, e.g. on timeout cleanup
    ///.
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), CoreError>;
}
