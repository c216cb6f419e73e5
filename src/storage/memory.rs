// src/storage/memory.rs

//! In-memory blob store

use super::{validate_key, BlobAttributes, BlobStore, Fetch, StorageError, WriteOptions};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Vec<u8>,
    options: WriteOptions,
}

/// Blob store held in process memory.
///
/// Records the [`WriteOptions`] of every blob and counts writes so tests can
/// check what was uploaded and how.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, StoredBlob>>,
    writes: Mutex<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn blobs(&self) -> MutexGuard<'_, BTreeMap<String, StoredBlob>> {
        self.blobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a blob without counting it as a write
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.blobs().insert(
            key.into(),
            StoredBlob {
                data: data.into(),
                options: WriteOptions::new("application/octet-stream"),
            },
        );
    }

    /// Content of a blob
    pub fn contents(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs().get(key).map(|blob| blob.data.clone())
    }

    /// Options a blob was last written with
    pub fn options(&self, key: &str) -> Option<WriteOptions> {
        self.blobs().get(key).map(|blob| blob.options.clone())
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.blobs().keys().cloned().collect()
    }

    /// Keys passed to `put`, in call order
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, key: &str) -> Result<Fetch, StorageError> {
        validate_key(key)?;
        Ok(match self.blobs().get(key) {
            Some(blob) => Fetch::Found(blob.data.clone()),
            None => Fetch::NotFound,
        })
    }

    fn stat(&self, key: &str) -> Result<Option<BlobAttributes>, StorageError> {
        validate_key(key)?;
        Ok(self.blobs().get(key).map(|blob| BlobAttributes {
            size: blob.data.len() as u64,
            md5: Md5::digest(&blob.data).into(),
        }))
    }

    fn put(&self, key: &str, data: &[u8], options: &WriteOptions) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs().insert(
            key.to_string(),
            StoredBlob {
                data: data.to_vec(),
                options: options.clone(),
            },
        );
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(key.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
