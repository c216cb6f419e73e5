// src/packages/deb.rs

//! Binary package control extraction
//!
//! A `.deb` is an ar archive containing, in order:
//! - `debian-binary`: version string "2.0\n"
//! - `control.tar[.gz|.xz|.zst]`: package metadata and scripts
//! - `data.tar[.gz|.xz|.zst]`: actual file contents
//!
//! Only the `control` file inside the control archive is needed to index
//! the package.

use crate::compression::{self, CompressionError, CompressionFormat};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use thiserror::Error;
use tracing::debug;

/// Errors reading a binary package
#[derive(Error, Debug)]
pub enum DebError {
    #[error("{0}")]
    Archive(io::Error),

    #[error("unexpected end of archive")]
    UnexpectedEof,

    #[error("unknown format")]
    UnknownFormat,

    #[error("unknown format {0:?}")]
    UnknownVersion(String),

    #[error("unexpected member {0:?}")]
    UnexpectedMember(String),

    #[error("{member}: {source}")]
    Decoder {
        member: String,
        source: CompressionError,
    },

    #[error("{member}: {source}")]
    Tar { member: String, source: io::Error },

    #[error("{0}: does not contain \"control\"")]
    MissingControl(String),
}

/// Read the `control` file out of a binary package
pub fn extract_control<R: Read>(reader: R) -> Result<Vec<u8>, DebError> {
    let mut archive = ar::Archive::new(reader);

    let mut entry = archive
        .next_entry()
        .ok_or(DebError::UnexpectedEof)?
        .map_err(DebError::Archive)?;
    if member_name(entry.header().identifier()) != "debian-binary" {
        return Err(DebError::UnknownFormat);
    }
    let mut version = Vec::new();
    entry.read_to_end(&mut version).map_err(DebError::Archive)?;
    if version != b"2.0\n" {
        return Err(DebError::UnknownVersion(
            String::from_utf8_lossy(&version).into_owned(),
        ));
    }
    drop(entry);

    let entry = archive
        .next_entry()
        .ok_or(DebError::UnexpectedEof)?
        .map_err(DebError::Archive)?;
    let member = member_name(entry.header().identifier());
    let format = match CompressionFormat::from_tar_name(&member) {
        Some(format) if member.starts_with("control.tar") => format,
        _ => return Err(DebError::UnexpectedMember(member)),
    };
    debug!("Reading {} ({})", member, format);

    let decoder = compression::create_decoder(entry, format).map_err(|source| DebError::Decoder {
        member: member.clone(),
        source,
    })?;
    let tar_err = |source| DebError::Tar {
        member: member.clone(),
        source,
    };
    let mut tar = Archive::new(decoder);
    for file in tar.entries().map_err(tar_err)? {
        let mut file = file.map_err(tar_err)?;
        let is_control = clean_path(&file.path().map_err(tar_err)?) == Path::new("control");
        if is_control {
            let mut control = Vec::new();
            file.read_to_end(&mut control).map_err(tar_err)?;
            return Ok(control);
        }
    }
    Err(DebError::MissingControl(member))
}

/// ar member names may carry GNU `/` terminators and space padding
fn member_name(identifier: &[u8]) -> String {
    String::from_utf8_lossy(identifier)
        .trim_end()
        .trim_end_matches('/')
        .to_string()
}

fn clean_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
