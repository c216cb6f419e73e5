// src/control/writer.rs

//! Control file serialization

use super::Paragraph;
use std::io::{self, Write};

/// Write paragraphs separated by blank lines, ending with a single newline.
///
/// Paragraphs without fields are skipped; no paragraphs produce no output.
pub fn write_paragraphs<W: Write>(w: &mut W, paragraphs: &[Paragraph]) -> io::Result<()> {
    let mut written = paragraphs.iter().filter(|para| !para.is_empty()).peekable();
    if written.peek().is_none() {
        return Ok(());
    }
    for (i, para) in written.enumerate() {
        if i > 0 {
            w.write_all(b"\n\n")?;
        }
        write!(w, "{}", para)?;
    }
    w.write_all(b"\n")
}

/// Serialize paragraphs into a byte buffer
pub fn to_bytes(paragraphs: &[Paragraph]) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_paragraphs(&mut buf, paragraphs);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn save(paragraphs: &[Paragraph]) -> String {
        String::from_utf8(to_bytes(paragraphs)).unwrap()
    }

    fn para(fields: &[(&str, &str)]) -> Paragraph {
        fields.iter().copied().collect()
    }

    #[test]
    fn test_empty() {
        assert_eq!(save(&[]), "");
    }

    #[test]
    fn test_fields() {
        assert_eq!(save(&[para(&[("Package", "libc6")])]), "Package: libc6\n");
        assert_eq!(
            save(&[para(&[("Version", "  \t libc6 (= 6.1) \t  ")])]),
            "Version: libc6 (= 6.1)\n"
        );
        assert_eq!(
            save(&[para(&[("Package", "libc6"), ("Version", "1:6.2")])]),
            "Package: libc6\nVersion: 1:6.2\n"
        );
    }

    #[test]
    fn test_multiline() {
        assert_eq!(
            save(&[para(&[("Description", "Do nothing\n Totally here just to do nothing")])]),
            "Description: Do nothing\n Totally here just to do nothing\n"
        );
        assert_eq!(
            save(&[para(&[("Description", "\n Totally here just to do nothing")])]),
            "Description:\n Totally here just to do nothing\n"
        );
        assert_eq!(
            save(&[para(&[("Description", "  \t \n Totally here just to do nothing")])]),
            "Description:\n Totally here just to do nothing\n"
        );
    }

    #[test]
    fn test_empty_paragraphs_skipped() {
        assert_eq!(save(&[Paragraph::new()]), "");
        assert_eq!(
            save(&[Paragraph::new(), para(&[("Package", "a")]), Paragraph::new(), para(&[("Package", "b")])]),
            "Package: a\n\nPackage: b\n"
        );
    }

    #[test]
    fn test_paragraph_separator() {
        assert_eq!(
            save(&[para(&[("Package", "a")]), para(&[("Package", "b")])]),
            "Package: a\n\nPackage: b\n"
        );
    }
}
