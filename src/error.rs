// src/error.rs

//! Error type shared by the aptblob library

use crate::compression::CompressionError;
use crate::control::ControlError;
use crate::packages::DebError;
use crate::release::SignatureError;
use crate::signing::SignError;
use crate::storage::StorageError;
use thiserror::Error;

/// Errors produced by repository operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("parse control file: {0}")]
    Control(#[from] ControlError),

    #[error("{field}: {source}")]
    Signature {
        field: &'static str,
        source: SignatureError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error("extract deb control: {0}")]
    Deb(#[from] DebError),

    #[error(transparent)]
    Compression(#[from] CompressionError),

    #[error("package #{index}: missing {field}")]
    MissingIdentity { index: usize, field: &'static str },

    #[error("missing {0} field")]
    MissingField(&'static str),

    #[error("upload {key}: immutable object differs")]
    ImmutableMismatch { key: String },

    #[error("{name}: size or checksum does not match the source control file")]
    ChecksumMismatch { name: String },

    #[error("refusing to publish an empty Release file")]
    EmptyRelease,

    #[error("{0:?} is not a plain file name")]
    InvalidFileName(String),

    #[error("read clear-signed message: {0}")]
    ClearSigned(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("unsupported package file {0:?} (expected .deb or .dsc)")]
    UnsupportedPackage(String),

    #[error("{context}: {source}")]
    InFile {
        context: String,
        source: Box<Error>,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Attach the blob key or file path an error happened in
pub trait ResultExt<T> {
    fn in_file(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn in_file(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::InFile {
            context: context.into(),
            source: Box::new(e.into()),
        })
    }
}

/// Result type alias for aptblob operations
pub type Result<T> = std::result::Result<T, Error>;
