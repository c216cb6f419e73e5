// src/packages/mod.rs

//! Debian package handling
//!
//! Turns package files into index paragraphs: binary packages (`.deb`)
//! contribute their `control` file to a Packages index, and source control
//! files (`.dsc`) become entries of a Sources index.

mod deb;
mod dedup;
mod source;

pub use deb::{extract_control, DebError};
pub use dedup::dedupe_packages;
pub use source::{source_index_entry, strip_clearsign};

/// Package file kinds accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Binary,
    Source,
}

impl PackageKind {
    /// Detect the kind from a file name's extension
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".deb") {
            Some(Self::Binary)
        } else if name.ends_with(".dsc") {
            Some(Self::Source)
        } else {
            None
        }
    }
}

/// Content type to store a repository file under
pub fn content_type_for(name: &str) -> &'static str {
    match name.rsplit_once('.').map(|(_, ext)| ext) {
        Some("deb") => "application/vnd.debian.binary-package",
        Some("dsc") | Some("txt") => "text/plain; charset=utf-8",
        Some("gz") => "application/gzip",
        Some("xz") => "application/x-xz",
        Some("bz2") => "application/x-bzip2",
        Some("zst") => "application/zstd",
        _ => "application/octet-stream",
    }
}
