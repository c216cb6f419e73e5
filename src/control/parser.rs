// src/control/parser.rs

//! Control file parser
//!
//! Paragraphs are separated by lines that are empty or contain only spaces
//! and tabs. A line starting with a space or tab continues the previous
//! field. Comment lines (`#`) are rejected wherever they appear.
//!
//! Input is expected to be UTF-8. Lines that are not are decoded lossily
//! with a warning, as old maintainer fields still carry Latin-1 names.

use super::{validate_field_name, ControlError, Field, FieldType, FieldTypes, Paragraph};
use std::io::BufRead;
use tracing::warn;

/// Reads paragraphs from a control file one at a time
#[derive(Debug)]
pub struct Parser<R> {
    reader: R,
    fields: FieldTypes,
    /// Number of the next physical line to be read
    lineno: usize,
    failed: bool,
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R, fields: FieldTypes) -> Self {
        Self {
            reader,
            fields,
            lineno: 1,
            failed: false,
        }
    }

    /// Read one physical line without its terminator
    fn read_line(&mut self) -> Result<Option<(usize, String)>, ControlError> {
        let mut buf = Vec::new();
        let line = self.lineno;
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ControlError::Io { line, source })?;
        if n == 0 {
            return Ok(None);
        }
        if buf.ends_with(b"\n") {
            buf.pop();
        }
        self.lineno += 1;
        let text = String::from_utf8(buf).unwrap_or_else(|e| {
            warn!(line, "line is not valid UTF-8, replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        });
        Ok(Some((line, text)))
    }

    /// Skip separator lines, returning the first line of the next paragraph
    fn next_nonblank_line(&mut self) -> Result<Option<(usize, String)>, ControlError> {
        while let Some((lineno, line)) = self.read_line()? {
            if !is_blank(&line) {
                return Ok(Some((lineno, line)));
            }
        }
        Ok(None)
    }

    /// Parse the next paragraph, or `None` at end of input
    pub fn next_paragraph(&mut self) -> Result<Option<Paragraph>, ControlError> {
        let Some(first) = self.next_nonblank_line()? else {
            return Ok(None);
        };
        let mut lines = vec![first];
        while let Some((lineno, line)) = self.read_line()? {
            if is_blank(&line) {
                break;
            }
            lines.push((lineno, line));
        }
        self.parse_lines(&lines).map(Some)
    }

    fn parse_lines(&self, lines: &[(usize, String)]) -> Result<Paragraph, ControlError> {
        let mut para = Paragraph::new();
        let mut i = 0;
        while i < lines.len() {
            let (start_line, ref text) = lines[i];
            if text.starts_with('#') {
                return Err(ControlError::Comment { line: start_line });
            }

            let colon = text
                .find(':')
                .ok_or(ControlError::MissingColon { line: start_line })?;
            let name = &text[..colon];
            validate_field_name(name).map_err(|source| ControlError::InvalidName {
                line: start_line,
                source,
            })?;
            if para.contains(name) {
                return Err(ControlError::DuplicateField {
                    line: start_line,
                    name: name.to_string(),
                });
            }

            let mut end = i + 1;
            while let Some((lineno, next)) = lines.get(end) {
                match next.as_bytes().first() {
                    Some(b' ' | b'\t') => end += 1,
                    Some(b'#') => return Err(ControlError::Comment { line: *lineno }),
                    _ => break,
                }
            }
            let continuation = &lines[i + 1..end];

            let first = &text[colon + 1..];
            let raw = match self.fields.get(name) {
                FieldType::Simple => {
                    if !continuation.is_empty() {
                        return Err(ControlError::NotSingleLine {
                            line: start_line,
                            name: name.to_string(),
                        });
                    }
                    first.to_string()
                }
                FieldType::Folded => continuation
                    .iter()
                    .fold(first.to_string(), |mut acc, (_, line)| {
                        acc.push_str(line);
                        acc
                    }),
                FieldType::Multiline => {
                    continuation
                        .iter()
                        .fold(first.to_string(), |mut acc, (_, line)| {
                            acc.push('\n');
                            acc.push_str(line);
                            acc
                        })
                }
            };

            let value = trim_horizontal(&raw);
            if value.is_empty() {
                return Err(ControlError::EmptyField {
                    line: start_line,
                    name: name.to_string(),
                });
            }
            para.push_unchecked(Field::new(name, value));
            i = end;
        }
        Ok(para)
    }

    /// Parse a document that must hold exactly one paragraph
    pub fn single(mut self) -> Result<Paragraph, ControlError> {
        let para = self.next_paragraph()?.ok_or(ControlError::NoParagraph)?;
        if let Some((line, _)) = self.next_nonblank_line()? {
            return Err(ControlError::MultipleParagraphs { line });
        }
        Ok(para)
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Paragraph, ControlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_paragraph() {
            Ok(Some(para)) => Some(Ok(para)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse every paragraph in `input`
pub fn parse_paragraphs(input: &[u8], fields: &FieldTypes) -> Result<Vec<Paragraph>, ControlError> {
    Parser::new(input, fields.clone()).collect()
}

/// Parse a document holding exactly one paragraph
pub fn parse_single(input: &[u8], fields: &FieldTypes) -> Result<Paragraph, ControlError> {
    Parser::new(input, fields.clone()).single()
}

fn is_blank(line: &str) -> bool {
    line.bytes().all(|b| b == b' ' || b == b'\t')
}

fn trim_horizontal(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t')
}
