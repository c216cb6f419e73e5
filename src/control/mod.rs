// src/control/mod.rs

//! Debian control file paragraphs
//!
//! Every metadata document in an APT repository (Release, Packages, Sources
//! and the `control` member of a binary package) is a sequence of paragraphs
//! of `Name: Value` fields. The syntax is documented at
//! <https://www.debian.org/doc/debian-policy/ch-controlfields.html#syntax-of-control-files>.
//!
//! How a field's value is assembled from continuation lines depends on its
//! [`FieldType`], which the caller supplies per document kind through
//! [`FieldTypes`].

mod fields;
mod parser;
mod writer;

pub use fields::{FieldProfiles, FieldType, FieldTypes};
pub use parser::{parse_paragraphs, parse_single, Parser};
pub use writer::{to_bytes, write_paragraphs};

use std::fmt;
use thiserror::Error;

/// Errors produced while parsing a control file
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("line {line}: comments not allowed")]
    Comment { line: usize },

    #[error("line {line}: missing colon")]
    MissingColon { line: usize },

    #[error("line {line}: {source}")]
    InvalidName {
        line: usize,
        source: FieldNameError,
    },

    #[error("line {line}: multiple fields for {name:?}")]
    DuplicateField { line: usize, name: String },

    #[error("line {line}: field {name:?} must be a single line")]
    NotSingleLine { line: usize, name: String },

    #[error("line {line}: empty field {name:?}")]
    EmptyField { line: usize, name: String },

    #[error("unexpected end of input")]
    NoParagraph,

    #[error("line {line}: multiple paragraphs encountered")]
    MultipleParagraphs { line: usize },

    #[error("line {line}: {source}")]
    Io {
        line: usize,
        source: std::io::Error,
    },
}

impl ControlError {
    /// Line number the error was reported at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Comment { line }
            | Self::MissingColon { line }
            | Self::InvalidName { line, .. }
            | Self::DuplicateField { line, .. }
            | Self::NotSingleLine { line, .. }
            | Self::EmptyField { line, .. }
            | Self::MultipleParagraphs { line }
            | Self::Io { line, .. } => Some(*line),
            Self::NoParagraph => None,
        }
    }
}

/// Reasons a field name is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldNameError {
    #[error("empty field name")]
    Empty,

    #[error("field name {0:?} begins with hyphen")]
    LeadingHyphen(String),

    #[error("field name {name:?} has forbidden character {ch:?}")]
    ForbiddenChar { name: String, ch: char },
}

/// Check that `name` is a valid field name.
///
/// Names are non-empty, do not start with `-`, and consist only of
/// printable ASCII other than `:`.
pub fn validate_field_name(name: &str) -> Result<(), FieldNameError> {
    if name.is_empty() {
        return Err(FieldNameError::Empty);
    }
    if name.starts_with('-') {
        return Err(FieldNameError::LeadingHyphen(name.to_string()));
    }
    if let Some(ch) = name
        .chars()
        .find(|&c| !(('!'..='9').contains(&c) || (';'..='~').contains(&c)))
    {
        return Err(FieldNameError::ForbiddenChar {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// A single field in a control file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Field {
    /// Formats the field as it appears in a control file
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value.trim_matches(|c| c == ' ' || c == '\t');
        // A value that starts on the next line keeps the colon bare.
        if value.starts_with('\n') {
            write!(f, "{}:{}", self.name, value)
        } else {
            write!(f, "{}: {}", self.name, value)
        }
    }
}

/// An ordered set of uniquely named fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    fields: Vec<Field>,
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Get the value of the named field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.find(name).map(|i| self.fields[i].value.as_str())
    }

    /// Whether the named field is present
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Set the value of the named field, appending it if necessary
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.find(&name) {
            Some(i) => self.fields[i].value = value,
            None => self.fields.push(Field { name, value }),
        }
    }

    /// Builder-style [`Paragraph::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Remove the named field, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.find(name).map(|i| self.fields.remove(i).value)
    }

    /// Rename a field in place, keeping its position.
    ///
    /// Returns false if `from` is absent or `to` is already taken.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from != to && self.contains(to) {
            return false;
        }
        match self.find(from) {
            Some(i) => {
                self.fields[i].name = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Move the named field to the first position, keeping the relative
    /// order of the others.
    pub fn promote(&mut self, name: &str) {
        if let Some(i) = self.find(name) {
            self.fields[..=i].rotate_right(1);
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Append a field the caller knows is not yet present
    pub(crate) fn push_unchecked(&mut self, field: Field) {
        debug_assert!(!self.contains(&field.name));
        self.fields.push(field);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Paragraph {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut para = Paragraph::new();
        for (name, value) in iter {
            para.set(name, value);
        }
        para
    }
}

impl<'a> IntoIterator for &'a Paragraph {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for Paragraph {
    /// Formats the fields as lines of a control file, without a trailing newline
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_field_name() {
        assert!(validate_field_name("Package").is_ok());
        assert!(validate_field_name("Foo#Bar").is_ok());
        assert!(validate_field_name("Checksums-Sha256").is_ok());
        assert_eq!(validate_field_name(""), Err(FieldNameError::Empty));
        assert!(matches!(
            validate_field_name("-Package"),
            Err(FieldNameError::LeadingHyphen(_))
        ));
        assert!(matches!(
            validate_field_name("Pack age"),
            Err(FieldNameError::ForbiddenChar { ch: ' ', .. })
        ));
        assert!(matches!(
            validate_field_name("Paket\u{e4}"),
            Err(FieldNameError::ForbiddenChar { .. })
        ));
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut para: Paragraph = [("Package", "libc6"), ("Version", "6.1")]
            .into_iter()
            .collect();
        para.set("Package", "git");
        para.set("Architecture", "amd64");

        let names: Vec<_> = para.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Package", "Version", "Architecture"]);
        assert_eq!(para.get("Package"), Some("git"));
        assert_eq!(para.get("Missing"), None);
    }

    #[test]
    fn test_promote() {
        let mut para: Paragraph = [("Version", "1.0"), ("Arch", "any"), ("Package", "foo")]
            .into_iter()
            .collect();
        para.promote("Package");
        let names: Vec<_> = para.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Package", "Version", "Arch"]);

        // No-op when absent
        para.promote("Missing");
        assert_eq!(para.len(), 3);
    }

    #[test]
    fn test_rename() {
        let mut para: Paragraph = [("Format", "3.0"), ("Source", "foo")].into_iter().collect();
        assert!(para.rename("Source", "Package"));
        assert_eq!(para.fields()[1].name, "Package");
        assert!(!para.rename("Format", "Package"));
        assert!(!para.rename("Missing", "Other"));
    }

    #[test]
    fn test_display() {
        let para = Paragraph::new()
            .with("Package", "libc6")
            .with("Description", "\n Totally here")
            .with("Version", "  1.0 \t");
        assert_eq!(
            para.to_string(),
            "Package: libc6\nDescription:\n Totally here\nVersion: 1.0"
        );
    }
}
