// src/storage/fs.rs

//! Directory-backed blob store
//!
//! Blob `a/b/c` lives at `<root>/a/b/c`. Content type and cache control
//! cannot be recorded on a plain filesystem and are dropped.

use super::{validate_key, BlobAttributes, BlobStore, Fetch, StorageError, WriteOptions};
use md5::{Digest, Md5};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Blob store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            fs::create_dir_all(&root)
                .map_err(|e| StorageError::io("open", root.display().to_string(), e))?;
            debug!("Created bucket directory: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a blob
    pub fn blob_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl BlobStore for FileBlobStore {
    fn get(&self, key: &str) -> Result<Fetch, StorageError> {
        let path = self.blob_path(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Fetch::Found(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Fetch::NotFound),
            Err(e) => Err(StorageError::io("get", key, e)),
        }
    }

    fn stat(&self, key: &str) -> Result<Option<BlobAttributes>, StorageError> {
        let path = self.blob_path(key)?;
        let mut file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io("stat", key, e)),
        };

        let mut hasher = Md5::new();
        let mut size = 0u64;
        let mut buffer = [0u8; 8192];
        loop {
            let n = file
                .read(&mut buffer)
                .map_err(|e| StorageError::io("stat", key, e))?;
            if n == 0 {
                break;
            }
            size += n as u64;
            hasher.update(&buffer[..n]);
        }
        Ok(Some(BlobAttributes {
            size,
            md5: hasher.finalize().into(),
        }))
    }

    fn put(&self, key: &str, data: &[u8], options: &WriteOptions) -> Result<(), StorageError> {
        let path = self.blob_path(key)?;
        let to_err = |e| StorageError::io("put", key, e);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(to_err)?;
        }

        // Write to a sibling temp file, then rename over the target
        let temp_path = temp_path_for(&path);
        let mut file = fs::File::create(&temp_path).map_err(to_err)?;
        let written = file.write_all(data).and_then(|()| file.sync_all());
        drop(file);
        if let Err(e) = written.and_then(|()| fs::rename(&temp_path, &path)) {
            let _ = fs::remove_file(&temp_path);
            return Err(to_err(e));
        }

        debug!(
            "Stored {} ({} bytes, {}, {})",
            key,
            data.len(),
            options.content_type,
            options.cache_control()
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = std::ffi::OsString::from(".");
    if let Some(file_name) = path.file_name() {
        name.push(file_name);
    }
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileBlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path().join("bucket")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_put_and_get() {
        let (_dir, store) = store();
        let opts = WriteOptions::new("text/plain; charset=utf-8");

        assert_eq!(store.get("dists/stable/Release").unwrap(), Fetch::NotFound);
        store.put("dists/stable/Release", b"Origin: test\n", &opts).unwrap();
        assert_eq!(
            store.get("dists/stable/Release").unwrap(),
            Fetch::Found(b"Origin: test\n".to_vec())
        );

        // Replace
        store.put("dists/stable/Release", b"Origin: other\n", &opts).unwrap();
        assert_eq!(
            store.get("dists/stable/Release").unwrap().into_option().unwrap(),
            b"Origin: other\n"
        );
        assert!(!store.root().join("dists/stable/.Release.tmp").exists());
    }

    #[test]
    fn test_stat() {
        let (_dir, store) = store();
        assert_eq!(store.stat("pool/a.deb").unwrap(), None);

        store
            .put("pool/a.deb", b"Hello, World!", &WriteOptions::new("application/octet-stream"))
            .unwrap();
        let attrs = store.stat("pool/a.deb").unwrap().unwrap();
        assert_eq!(attrs.size, 13);
        assert_eq!(hex::encode(attrs.md5), "65a8e27d8879283831b664bd8b7f0ad4");
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let (_dir, store) = store();
        let opts = WriteOptions::new("text/plain");
        assert!(matches!(
            store.put("../outside", b"x", &opts),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(store.get("/etc/passwd"), Err(StorageError::InvalidKey(_))));
    }
}
