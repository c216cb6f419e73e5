// src/release.rs

//! Release files and their index checksum lists
//!
//! A Release file is a single paragraph whose `MD5Sum`, `SHA1` and `SHA256`
//! fields each list every index of the distribution as
//! `<hex checksum> <size> <path relative to the distribution>` lines.
//! See <https://wiki.debian.org/DebianRepository/Format#A.22Release.22_files>.

use crate::control::{self, ControlError, FieldTypes, Paragraph};
use crate::hash::{Digests, HashAlgorithm};
use std::fmt;
use std::num::ParseIntError;
use thiserror::Error;
use tracing::debug;

/// Parse a Release file
pub fn parse_release(input: &[u8]) -> Result<Paragraph, ControlError> {
    control::parse_single(input, &FieldTypes::release())
}

/// Checksum, size and name of one file listed in a Release file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSignature {
    pub filename: String,
    pub size: u64,
    pub checksum: Vec<u8>,
}

impl IndexSignature {
    /// Entry for `filename` using one algorithm from precomputed digests
    pub fn from_digests(filename: impl Into<String>, digests: &Digests, algorithm: HashAlgorithm) -> Self {
        Self {
            filename: filename.into(),
            size: digests.size,
            checksum: digests.get(algorithm).to_vec(),
        }
    }
}

impl fmt::Display for IndexSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            hex::encode(&self.checksum),
            self.size,
            self.filename
        )
    }
}

/// A malformed line in a checksum list
#[derive(Error, Debug)]
#[error("signature #{index}: {kind}")]
pub struct SignatureError {
    /// 1-based position among non-blank lines
    pub index: usize,
    #[source]
    pub kind: SignatureErrorKind,
}

#[derive(Error, Debug)]
pub enum SignatureErrorKind {
    #[error("line has {0} fields")]
    FieldCount(usize),

    #[error("checksum: size {got} (expected {expected})")]
    ChecksumLength { got: usize, expected: usize },

    #[error("checksum: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("size: {0}")]
    Size(#[from] ParseIntError),
}

/// Parse a checksum list field value.
///
/// `checksum_len` is the digest size in bytes; blank lines are ignored.
pub fn parse_index_signatures(
    value: &str,
    checksum_len: usize,
) -> Result<Vec<IndexSignature>, SignatureError> {
    value
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(i, line)| {
            parse_index_signature(line, checksum_len)
                .map_err(|kind| SignatureError { index: i + 1, kind })
        })
        .collect()
}

fn parse_index_signature(line: &str, checksum_len: usize) -> Result<IndexSignature, SignatureErrorKind> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [checksum, size, filename] = fields.as_slice() else {
        return Err(SignatureErrorKind::FieldCount(fields.len()));
    };
    let expected = checksum_len * 2;
    if checksum.len() != expected {
        return Err(SignatureErrorKind::ChecksumLength {
            got: checksum.len(),
            expected,
        });
    }
    Ok(IndexSignature {
        checksum: hex::decode(checksum)?,
        size: size.parse()?,
        filename: filename.to_string(),
    })
}

/// Format a checksum list as a Release field value.
///
/// Each entry is on its own continuation line, so the value starts with a
/// newline.
pub fn format_index_signatures(sigs: &[IndexSignature]) -> String {
    sigs.iter().map(|sig| format!("\n {}", sig)).collect()
}

/// Merge a batch of new entries into an existing list.
///
/// Existing entries whose filename appears in `new` take the new checksum
/// and size at their current position; the remaining new entries are
/// appended in the order their filenames first appear. When `new` names a
/// file more than once, its last entry wins. Other entries are untouched.
pub fn merge_signatures(existing: &[IndexSignature], new: &[IndexSignature]) -> Vec<IndexSignature> {
    let latest = |filename: &str| new.iter().rev().find(|n| n.filename == filename);
    let mut merged: Vec<IndexSignature> = existing
        .iter()
        .map(|sig| latest(&sig.filename).unwrap_or(sig).clone())
        .collect();
    for sig in new {
        if merged.iter().any(|m| m.filename == sig.filename) {
            continue;
        }
        if let Some(last) = latest(&sig.filename) {
            merged.push(last.clone());
        }
    }
    merged
}

/// Return a copy of `release` with `new` merged into the checksum list of
/// `algorithm`.
pub fn update_signature(
    release: &Paragraph,
    algorithm: HashAlgorithm,
    new: &[IndexSignature],
) -> Result<Paragraph, SignatureError> {
    if new.is_empty() {
        return Ok(release.clone());
    }
    if let Some(i) = new
        .iter()
        .position(|sig| sig.checksum.len() != algorithm.output_len())
    {
        return Err(SignatureError {
            index: i + 1,
            kind: SignatureErrorKind::ChecksumLength {
                got: new[i].checksum.len() * 2,
                expected: algorithm.hex_len(),
            },
        });
    }

    let field = algorithm.release_field();
    let existing = parse_index_signatures(release.get(field).unwrap_or(""), algorithm.output_len())?;
    let merged = merge_signatures(&existing, new);
    debug!(
        "{}: {} entries ({} before merge)",
        field,
        merged.len(),
        existing.len()
    );

    let mut updated = release.clone();
    updated.set(field, format_index_signatures(&merged));
    Ok(updated)
}
