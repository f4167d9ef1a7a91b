//! In-memory `BlobStore`: object storage plus multi-part
//! upload sessions and signed URLs, standing in for the real object store
//! backend.

use async_trait::async_trait;
use ceremony_ports::{BlobStore, CorsConfig, CoreError};
use dashmap::DashMap;
use shared_types::UploadedChunk;
use std::sync::Mutex;

#[derive(Default)]
struct UploadSession {
    parts: Vec<(u32, Vec<u8>)>,
    committed_chunks: Vec<UploadedChunk>,
}

/// In-memory object store. Objects are keyed by `(bucket, key)`; open
/// multi-part sessions are keyed by `upload_id`.
#[derive(Default)]
pub struct InMemoryBlobStore {
    buckets: DashMap<String, CorsConfig>,
    objects: DashMap<(String, String), Vec<u8>>,
    /// `(bucket, key) -> upload_id`, so `open_multipart_upload` is
    /// idempotent while a session is outstanding.
    open_sessions: DashMap<(String, String), String>,
    sessions: DashMap<String, Mutex<UploadSession>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test/debug accessor: the already-committed `(partNumber, eTag)`
    /// pairs for a session, mirroring what a resuming client would be
    /// handed back.
    pub fn uploaded_chunks(&self, upload_id: &str) -> Vec<UploadedChunk> {
        self.sessions
            .get(upload_id)
            .map(|s| s.lock().unwrap().committed_chunks.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn create_bucket(&self, bucket: &str, cors: CorsConfig) -> Result<(), CoreError> {
        if self.buckets.contains_key(bucket) {
            return Err(CoreError::Conflict(format!("bucket {bucket} already exists")));
        }
        self.buckets.insert(bucket.to_string(), cors);
        Ok(())
    }

    async fn put_object(&self, bucket: &str, key: &str, data: Vec<u8>) -> Result<(), CoreError> {
        self.objects.insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CoreError> {
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|r| r.clone())
            .ok_or_else(|| CoreError::NotFound(format!("object {bucket}/{key}")))
    }

    async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool, CoreError> {
        Ok(self.objects.contains_key(&(bucket.to_string(), key.to_string())))
    }

    async fn signed_get_url(
        &self,
        bucket: &str,
        key: &str,
        ttl_secs: u64,
    ) -> Result<String, CoreError> {
        if !self.objects.contains_key(&(bucket.to_string(), key.to_string())) {
            return Err(CoreError::NotFound(format!("object {bucket}/{key}")));
        }
        Ok(format!("https://signed.local/{bucket}/{key}?ttl={ttl_secs}"))
    }

    async fn open_multipart_upload(&self, bucket: &str, key: &str) -> Result<String, CoreError> {
        let object_key = (bucket.to_string(), key.to_string());
        if let Some(existing) = self.open_sessions.get(&object_key) {
            return Ok(existing.clone());
        }
        let upload_id = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(upload_id.clone(), Mutex::new(UploadSession::default()));
        self.open_sessions.insert(object_key, upload_id.clone());
        Ok(upload_id)
    }

    async fn sign_upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        number_of_parts: u32,
        ttl_secs: u64,
    ) -> Result<Vec<String>, CoreError> {
        if !self.sessions.contains_key(upload_id) {
            return Err(CoreError::NotFound(format!("upload session {upload_id}")));
        }
        Ok((1..=number_of_parts)
            .map(|part| format!("https://signed.local/{bucket}/{key}?upload={upload_id}&part={part}&ttl={ttl_secs}"))
            .collect())
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: Vec<UploadedChunk>,
    ) -> Result<String, CoreError> {
        let session = self
            .sessions
            .get(upload_id)
            .ok_or_else(|| CoreError::NotFound(format!("upload session {upload_id}")))?;
        let assembled = {
            let mut guard = session.lock().unwrap();
            guard.parts.sort_by_key(|(n, _)| *n);
            let expected: Vec<u32> = parts.iter().map(|p| p.part_number).collect();
            let have: Vec<u32> = guard.parts.iter().map(|(n, _)| *n).collect();
            if expected != have {
                return Err(CoreError::PreconditionFailed(
                    "completed parts do not match stored chunks".to_string(),
                ));
            }
            guard.parts.iter().flat_map(|(_, data)| data.clone()).collect::<Vec<u8>>()
        };
        self.objects.insert((bucket.to_string(), key.to_string()), assembled);
        self.sessions.remove(upload_id);
        self.open_sessions.remove(&(bucket.to_string(), key.to_string()));
        Ok(format!("s3://{bucket}/{key}"))
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> Result<(), CoreError> {
        self.sessions.remove(upload_id);
        self.open_sessions.remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}

impl InMemoryBlobStore {
    /// Test helper simulating a client PUT to a signed part URL: stores the
    /// chunk bytes and records the `(partNumber, eTag)` the caller would
    /// report via `storeChunk`.
    pub fn simulate_part_upload(&self, upload_id: &str, part_number: u32, data: Vec<u8>) -> UploadedChunk {
        let e_tag = ceremony_crypto::blake2b512_hex(&data)[..16].to_string();
        if let Some(session) = self.sessions.get(upload_id) {
            session.lock().unwrap().parts.push((part_number, data));
        }
        UploadedChunk { part_number, e_tag }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reopening_same_key_reuses_upload_id() {
        let store = InMemoryBlobStore::new();
        let first = store.open_multipart_upload("bucket", "key").await.unwrap();
        let second = store.open_multipart_upload("bucket", "key").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn complete_upload_assembles_parts_in_order() {
        let store = InMemoryBlobStore::new();
        let upload_id = store.open_multipart_upload("b", "k").await.unwrap();
        let c2 = store.simulate_part_upload(&upload_id, 2, vec![2, 2]);
        let c1 = store.simulate_part_upload(&upload_id, 1, vec![1, 1]);
        store
            .complete_multipart_upload("b", "k", &upload_id, vec![c1, c2])
            .await
            .unwrap();
        let object = store.get_object("b", "k").await.unwrap();
        assert_eq!(object, vec![1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn abort_clears_session() {
        let store = InMemoryBlobStore::new();
        let upload_id = store.open_multipart_upload("b", "k").await.unwrap();
        store.abort_multipart_upload("b", "k", &upload_id).await.unwrap();
        let reopened = store.open_multipart_upload("b", "k").await.unwrap();
        assert_ne!(upload_id, reopened);
    }
}
