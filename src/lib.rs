// src/lib.rs

//! aptblob
//!
//! Maintains an APT repository stored in blob storage: uploads Debian
//! binary and source packages into an immutable pool, keeps the Packages
//! and Sources indices up to date, and rewrites and signs the Release file.
//!
//! # Architecture
//!
//! - Control files: every metadata document is parsed into [`Paragraph`]s
//!   and serialized back, with per-field line handling from [`FieldTypes`]
//! - Release checksums: index entries are merged in place so unrelated
//!   indices keep their entries and order
//! - Storage: any [`storage::BlobStore`]; missing blobs are empty documents
//! - Signing: an optional [`signing::Signer`] produces InRelease and
//!   Release.gpg
//! - Single writer: one update process per distribution at a time

pub mod compression;
pub mod config;
pub mod control;
mod error;
pub mod hash;
pub mod packages;
pub mod release;
pub mod repository;
pub mod signing;
pub mod storage;

pub use control::{Field, FieldProfiles, FieldType, FieldTypes, Paragraph};
pub use error::{Error, Result, ResultExt};
pub use hash::{Digests, HashAlgorithm, Hasher};
pub use release::{IndexSignature, SignatureError};
pub use repository::{Component, Distribution, IndexKind, IndexUpdate, Repository, UploadSummary};
