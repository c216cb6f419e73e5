// src/repository/upload.rs

//! Single-blob uploads

use crate::error::{Error, Result};
use crate::hash::Digests;
use crate::storage::{BlobStore, WriteOptions};
use tracing::{debug, info};

/// Write `data` to `key` and return its digests.
///
/// Immutable blobs are never overwritten: if `key` already holds content of
/// the same size and MD5 the write is skipped, and any other existing
/// content is an [`Error::ImmutableMismatch`].
pub fn upload(
    store: &dyn BlobStore,
    key: &str,
    data: &[u8],
    options: &WriteOptions,
) -> Result<Digests> {
    let digests = Digests::of(data);

    if options.is_immutable()
        && let Some(existing) = store.stat(key)?
    {
        if existing.size != digests.size || existing.md5 != digests.md5 {
            return Err(Error::ImmutableMismatch {
                key: key.to_string(),
            });
        }
        info!("{} already uploaded, skipping", key);
        return Ok(digests);
    }

    store.put(key, data, options)?;
    debug!("Uploaded {} ({} bytes)", key, digests.size);
    Ok(digests)
}
