// src/storage/mod.rs
//! Blob storage backends
//!
//! A repository is a flat namespace of named blobs (`dists/stable/Release`,
//! `pool/hello_1.0_amd64.deb`, ...). Backends implement [`BlobStore`]:
//! - [`FileBlobStore`]: a directory on the local filesystem
//! - [`MemoryBlobStore`]: an in-process map, mostly for tests
//!
//! A missing blob is reported as [`Fetch::NotFound`] rather than as an
//! error so that callers can treat it as an empty document.

mod fs;
mod memory;

pub use fs::FileBlobStore;
pub use memory::MemoryBlobStore;

use std::io;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// `Cache-Control` value for content that never changes once written
pub const IMMUTABLE: &str = "immutable";

/// `Cache-Control` value used when none is given
pub const DEFAULT_CACHE_CONTROL: &str = "max-age=300";

/// Storage backend errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{op} {key}: {source}")]
    Io {
        op: &'static str,
        key: String,
        source: io::Error,
    },

    #[error("invalid blob key {0:?}")]
    InvalidKey(String),

    #[error("unsupported bucket URL {0:?}")]
    UnsupportedUrl(String),
}

impl StorageError {
    pub(crate) fn io(op: &'static str, key: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            op,
            key: key.into(),
            source,
        }
    }
}

/// Outcome of reading a blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetch {
    Found(Vec<u8>),
    NotFound,
}

impl Fetch {
    /// The blob content, if it exists
    pub fn into_option(self) -> Option<Vec<u8>> {
        match self {
            Self::Found(data) => Some(data),
            Self::NotFound => None,
        }
    }
}

/// Size and MD5 of a stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobAttributes {
    pub size: u64,
    pub md5: [u8; 16],
}

/// Metadata attached to a blob when it is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub content_type: String,
    /// `None` means [`DEFAULT_CACHE_CONTROL`]
    pub cache_control: Option<String>,
}

impl WriteOptions {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            cache_control: None,
        }
    }

    /// Mark the blob as immutable
    pub fn immutable(mut self) -> Self {
        self.cache_control = Some(IMMUTABLE.to_string());
        self
    }

    pub fn is_immutable(&self) -> bool {
        self.cache_control.as_deref() == Some(IMMUTABLE)
    }

    /// Effective `Cache-Control` value
    pub fn cache_control(&self) -> &str {
        self.cache_control.as_deref().unwrap_or(DEFAULT_CACHE_CONTROL)
    }
}

/// A flat namespace of named byte blobs
pub trait BlobStore: Send + Sync {
    /// Read a whole blob
    fn get(&self, key: &str) -> Result<Fetch, StorageError>;

    /// Size and MD5 of a blob, or `None` if it does not exist
    fn stat(&self, key: &str) -> Result<Option<BlobAttributes>, StorageError>;

    /// Create or replace a blob
    fn put(&self, key: &str, data: &[u8], options: &WriteOptions) -> Result<(), StorageError>;

    /// Human-readable backend name for logging
    fn name(&self) -> &str;
}

/// Check that a key is a relative, normalized, slash-separated path
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.contains(['\\', '\0'])
        && key
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Open the bucket named by `location`.
///
/// Accepts `file:///path`, `mem://` or a bare filesystem path.
pub fn open(location: &str) -> Result<Box<dyn BlobStore>, StorageError> {
    match Url::parse(location) {
        Ok(url) if url.scheme() == "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| StorageError::UnsupportedUrl(location.to_string()))?;
            debug!("Opening file bucket at {}", path.display());
            Ok(Box::new(FileBlobStore::new(path)?))
        }
        Ok(url) if url.scheme() == "mem" => Ok(Box::new(MemoryBlobStore::new())),
        // Single letters are Windows drive prefixes, not schemes
        Ok(url) if url.scheme().len() > 1 => Err(StorageError::UnsupportedUrl(location.to_string())),
        _ => {
            debug!("Opening file bucket at {}", location);
            Ok(Box::new(FileBlobStore::new(location)?))
        }
    }
}
