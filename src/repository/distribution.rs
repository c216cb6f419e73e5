// src/repository/distribution.rs

//! Release file download, upload and signing

use super::{upload, Repository, TEXT_CONTENT_TYPE};
use crate::control::{self, Paragraph};
use crate::error::{Error, Result, ResultExt};
use crate::hash::HashAlgorithm;
use crate::storage::{Fetch, WriteOptions};
use std::slice;
use tracing::{debug, info};

impl Repository<'_> {
    /// Read the distribution's Release file. A missing file is an empty
    /// paragraph.
    pub fn download_release(&self) -> Result<Paragraph> {
        let key = self.dist.release_key();
        match self.store.get(&key)? {
            Fetch::Found(data) => control::parse_single(&data, &self.fields.release).in_file(&key),
            Fetch::NotFound => {
                debug!("{} not found, starting empty", key);
                Ok(Paragraph::new())
            }
        }
    }

    /// Upload the Release file, then InRelease and Release.gpg when a signer
    /// is configured
    pub fn upload_release(&self, release: &Paragraph) -> Result<()> {
        if release.is_empty() {
            return Err(Error::EmptyRelease);
        }
        let data = control::to_bytes(slice::from_ref(release));
        let text = WriteOptions::new(TEXT_CONTENT_TYPE);
        upload(self.store, &self.dist.release_key(), &data, &text)?;

        let Some(signer) = self.signer else {
            info!("No signing key configured, skipping InRelease and Release.gpg");
            return Ok(());
        };
        let signed = signer.sign(&data)?;
        upload(self.store, &self.dist.in_release_key(), &signed.clearsigned, &text)?;
        upload(self.store, &self.dist.release_gpg_key(), &signed.detached, &text)?;
        info!("Signed {}", self.dist.release_key());
        Ok(())
    }

    /// Publish a new Release built from `template`.
    ///
    /// Checksum lists already present in the bucket replace the template's,
    /// so re-initializing keeps the existing indices listed.
    pub fn init_distribution(&self, template: Paragraph) -> Result<Paragraph> {
        let old = self.download_release()?;
        let mut release = template;
        for algorithm in HashAlgorithm::ALL {
            let field = algorithm.release_field();
            if let Some(value) = old.get(field).filter(|v| !v.is_empty()) {
                release.set(field, value);
            }
        }
        self.upload_release(&release)?;
        info!("Initialized distribution {}", self.dist);
        Ok(release)
    }
}
