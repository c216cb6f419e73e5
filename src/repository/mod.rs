// src/repository/mod.rs

//! APT repository maintenance over a blob store
//!
//! This module provides functionality for:
//! - Uploading package artifacts into the immutable pool
//! - Updating Packages and Sources indices (plain and gzip)
//! - Keeping the Release checksum lists in step with the indices
//! - Signing the Release file
//!
//! Blob layout, relative to the bucket root:
//!
//! ```text
//! dists/<dist>/Release
//! dists/<dist>/InRelease
//! dists/<dist>/Release.gpg
//! dists/<dist>/<component>/binary-<arch>/Packages[.gz]
//! dists/<dist>/<component>/source/Sources[.gz]
//! pool/<filename>
//! ```

mod distribution;
mod index;
mod publish;
mod upload;

pub use index::IndexUpdate;
pub use publish::UploadSummary;
pub use upload::upload;

use crate::control::{FieldProfiles, FieldTypes};
use crate::error::Result;
use crate::signing::Signer;
use crate::storage::{validate_key, BlobStore};
use std::fmt;

/// Component used when none is given
pub const DEFAULT_COMPONENT: &str = "main";

/// Suffix of the gzip copy of an index
pub const GZIP_SUFFIX: &str = ".gz";

/// Content type of every repository metadata file
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Key of a package artifact in the pool
pub fn pool_path(name: &str) -> String {
    format!("pool/{}", name)
}

/// A distribution (suite) such as `stable` or `bookworm`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    name: String,
}

impl Distribution {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_key(&name)?;
        Ok(Self { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `dists/<dist>`
    pub fn dir(&self) -> String {
        format!("dists/{}", self.name)
    }

    pub fn release_key(&self) -> String {
        format!("{}/Release", self.dir())
    }

    pub fn in_release_key(&self) -> String {
        format!("{}/InRelease", self.dir())
    }

    pub fn release_gpg_key(&self) -> String {
        format!("{}/Release.gpg", self.dir())
    }

    /// Path of `key` relative to the distribution directory, as listed in
    /// the Release file
    pub fn relative<'k>(&self, key: &'k str) -> &'k str {
        key.strip_prefix(&self.dir())
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(key)
    }

    pub fn component(&self, name: impl Into<String>) -> Result<Component> {
        let name = name.into();
        validate_key(&name)?;
        Ok(Component {
            dist: self.clone(),
            name,
        })
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// An archive area within a distribution, e.g. `main`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    dist: Distribution,
    name: String,
}

impl Component {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dist(&self) -> &Distribution {
        &self.dist
    }

    /// `dists/<dist>/<component>`
    pub fn dir(&self) -> String {
        format!("{}/{}", self.dist.dir(), self.name)
    }

    /// Key of the plain index of the given kind
    pub fn index_key(&self, kind: &IndexKind) -> String {
        match kind {
            IndexKind::Binary { arch } => format!("{}/binary-{}/Packages", self.dir(), arch),
            IndexKind::Source => format!("{}/source/Sources", self.dir()),
        }
    }
}

/// Which index of a component is being updated
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKind {
    /// `binary-<arch>/Packages`
    Binary { arch: String },
    /// `source/Sources`
    Source,
}

impl IndexKind {
    pub fn binary(arch: impl Into<String>) -> Self {
        Self::Binary { arch: arch.into() }
    }

    /// Field types used to parse index entries of this kind
    pub fn field_types<'p>(&self, profiles: &'p FieldProfiles) -> &'p FieldTypes {
        match self {
            Self::Binary { .. } => &profiles.binary,
            Self::Source => &profiles.source,
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary { arch } => write!(f, "binary-{}", arch),
            Self::Source => f.write_str("source"),
        }
    }
}

/// A distribution in a bucket, with the collaborators used to update it
pub struct Repository<'a> {
    store: &'a dyn BlobStore,
    dist: Distribution,
    fields: FieldProfiles,
    signer: Option<&'a dyn Signer>,
}

impl<'a> Repository<'a> {
    /// Unsigned repository using the built-in field types
    pub fn new(store: &'a dyn BlobStore, dist: Distribution) -> Self {
        Self {
            store,
            dist,
            fields: FieldProfiles::default(),
            signer: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldProfiles) -> Self {
        self.fields = fields;
        self
    }

    /// Sign Release uploads with `signer`; `None` skips InRelease and
    /// Release.gpg
    pub fn with_signer(mut self, signer: Option<&'a dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    pub fn store(&self) -> &'a dyn BlobStore {
        self.store
    }

    pub fn dist(&self) -> &Distribution {
        &self.dist
    }

    pub fn fields(&self) -> &FieldProfiles {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let dist = Distribution::new("stable").unwrap();
        assert_eq!(dist.release_key(), "dists/stable/Release");
        assert_eq!(dist.in_release_key(), "dists/stable/InRelease");
        assert_eq!(dist.release_gpg_key(), "dists/stable/Release.gpg");

        let main = dist.component(DEFAULT_COMPONENT).unwrap();
        let packages = main.index_key(&IndexKind::binary("amd64"));
        assert_eq!(packages, "dists/stable/main/binary-amd64/Packages");
        assert_eq!(dist.relative(&packages), "main/binary-amd64/Packages");
        assert_eq!(
            main.index_key(&IndexKind::Source),
            "dists/stable/main/source/Sources"
        );
        assert_eq!(pool_path("hello_1.0_amd64.deb"), "pool/hello_1.0_amd64.deb");
    }

    #[test]
    fn test_relative_requires_directory_boundary() {
        let dist = Distribution::new("stable").unwrap();
        assert_eq!(dist.relative("dists/stable-updates/Release"), "dists/stable-updates/Release");
    }

    #[test]
    fn test_invalid_names() {
        assert!(Distribution::new("").is_err());
        assert!(Distribution::new("../etc").is_err());
        let dist = Distribution::new("stable").unwrap();
        assert!(dist.component("main/../..").is_err());
    }

    #[test]
    fn test_index_field_types() {
        let profiles = FieldProfiles::default();
        assert_eq!(
            IndexKind::Source.field_types(&profiles).get("Files"),
            crate::control::FieldType::Multiline
        );
        assert_eq!(
            IndexKind::binary("all").field_types(&profiles).get("Files"),
            crate::control::FieldType::Simple
        );
    }
}
