// src/control/fields.rs

//! Field type mappings for each kind of control document

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// How a field's value is assembled from its lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Single-line field; continuation lines are an error
    Simple,
    /// Field that may span lines; newlines and continuation markers are kept
    Multiline,
    /// Field that may span lines; newlines are stripped
    Folded,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "simple",
            Self::Multiline => "multiline",
            Self::Folded => "folded",
        };
        f.write_str(name)
    }
}

/// Mapping from field name to [`FieldType`] for one kind of document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypes {
    types: HashMap<String, FieldType>,
}

impl FieldTypes {
    /// A mapping in which every field is [`FieldType::Simple`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields of a `Release` file
    pub fn release() -> Self {
        Self::new()
            .with("MD5Sum", FieldType::Multiline)
            .with("SHA1", FieldType::Multiline)
            .with("SHA256", FieldType::Multiline)
    }

    /// Fields of a binary package `control` file and of `Packages` indices
    pub fn binary_control() -> Self {
        Self::new().with("Description", FieldType::Multiline)
    }

    /// Fields of a source package `.dsc` file and of `Sources` indices
    pub fn source_control() -> Self {
        Self::new()
            .with("Binary", FieldType::Folded)
            .with("Checksums-Sha1", FieldType::Multiline)
            .with("Checksums-Sha256", FieldType::Multiline)
            .with("Dgit", FieldType::Folded)
            .with("Files", FieldType::Multiline)
            .with("Package-List", FieldType::Multiline)
            .with("Uploaders", FieldType::Folded)
    }

    pub fn with(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.types.insert(name.into(), field_type);
        self
    }

    /// Add or override entries from another mapping
    pub fn extend<I, K>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, FieldType)>,
        K: Into<String>,
    {
        self.types
            .extend(entries.into_iter().map(|(k, t)| (k.into(), t)));
    }

    /// Type of the named field. Unmapped names are simple fields.
    pub fn get(&self, name: &str) -> FieldType {
        match self.types.get(name) {
            Some(field_type) => *field_type,
            None => FieldType::Simple,
        }
    }
}

/// Field type mappings for every document kind in a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProfiles {
    pub release: FieldTypes,
    /// Binary `control` files and Packages indices
    pub binary: FieldTypes,
    /// `.dsc` files and Sources indices
    pub source: FieldTypes,
}

impl Default for FieldProfiles {
    fn default() -> Self {
        Self {
            release: FieldTypes::release(),
            binary: FieldTypes::binary_control(),
            source: FieldTypes::source_control(),
        }
    }
}
