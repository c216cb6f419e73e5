// src/repository/index.rs

//! Packages and Sources index updates
//!
//! One update is a fixed pipeline: download the index (missing means empty),
//! parse, append the new entries, deduplicate, serialize, upload the plain
//! and gzip copies, and only then merge both copies' checksums into the
//! Release paragraph.

use super::{upload, Component, IndexKind, Repository, GZIP_SUFFIX, TEXT_CONTENT_TYPE};
use crate::compression;
use crate::control::{self, Paragraph};
use crate::error::{Error, Result, ResultExt};
use crate::hash::{Digests, HashAlgorithm};
use crate::packages::{content_type_for, dedupe_packages};
use crate::release::{update_signature, IndexSignature};
use crate::storage::{Fetch, WriteOptions};
use tracing::{debug, info};

/// Digests of an index that has just been uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexUpdate {
    /// Plain index path relative to the distribution directory
    pub path: String,
    pub plain: Digests,
    pub gzipped: Digests,
    /// Number of entries in the published index
    pub entries: usize,
}

impl IndexUpdate {
    /// Release entries for the plain and gzip copies under one algorithm
    pub fn signatures(&self, algorithm: HashAlgorithm) -> [IndexSignature; 2] {
        [
            IndexSignature::from_digests(&self.path, &self.plain, algorithm),
            IndexSignature::from_digests(
                format!("{}{}", self.path, GZIP_SUFFIX),
                &self.gzipped,
                algorithm,
            ),
        ]
    }

    /// Copy of `release` with this index's checksums merged into every
    /// checksum field
    pub fn apply_to(&self, release: &Paragraph) -> Result<Paragraph> {
        HashAlgorithm::ALL
            .iter()
            .try_fold(release.clone(), |release, &algorithm| {
                update_signature(&release, algorithm, &self.signatures(algorithm)).map_err(
                    |source| Error::Signature {
                        field: algorithm.release_field(),
                        source,
                    },
                )
            })
    }
}

impl Repository<'_> {
    /// Read and parse an index. A missing index has no entries.
    pub fn download_index(&self, component: &Component, kind: &IndexKind) -> Result<Vec<Paragraph>> {
        let key = component.index_key(kind);
        match self.store.get(&key)? {
            Fetch::Found(data) => {
                let entries =
                    control::parse_paragraphs(&data, kind.field_types(&self.fields)).in_file(&key)?;
                debug!("{}: {} existing entries", key, entries.len());
                Ok(entries)
            }
            Fetch::NotFound => {
                debug!("{} not found, starting empty", key);
                Ok(Vec::new())
            }
        }
    }

    /// Merge `new` entries into an index and upload both copies.
    ///
    /// The Release file is not touched; see [`IndexUpdate::apply_to`].
    pub fn publish_index(
        &self,
        component: &Component,
        kind: &IndexKind,
        new: Vec<Paragraph>,
    ) -> Result<IndexUpdate> {
        let key = component.index_key(kind);
        let mut entries = self.download_index(component, kind)?;
        entries.extend(new);
        let entries = dedupe_packages(entries).in_file(&key)?;

        let data = control::to_bytes(&entries);
        let compressed = compression::gzip(&data).in_file(&key)?;

        let plain = upload(self.store, &key, &data, &WriteOptions::new(TEXT_CONTENT_TYPE))?;
        let gz_key = format!("{}{}", key, GZIP_SUFFIX);
        let gzipped = upload(
            self.store,
            &gz_key,
            &compressed,
            &WriteOptions::new(content_type_for(&gz_key)),
        )?;
        info!("Published {} ({} entries)", key, entries.len());

        Ok(IndexUpdate {
            path: component.dist().relative(&key).to_string(),
            plain,
            gzipped,
            entries: entries.len(),
        })
    }

    /// Publish an index and return `release` with its checksums updated
    pub fn update_index(
        &self,
        release: &Paragraph,
        component: &Component,
        kind: &IndexKind,
        new: Vec<Paragraph>,
    ) -> Result<Paragraph> {
        let update = self.publish_index(component, kind, new)?;
        update
            .apply_to(release)
            .in_file(component.dist().release_key())
    }
}
