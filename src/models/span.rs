//! Lexical span data models.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Lexical category of a span produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Identifier-like run (letters, digits, `_`, `$`; not starting with a digit)
    Identifier,
    /// Quoted string literal, quotes and prefix included
    StringLiteral,
    /// Numeric literal
    NumberLiteral,
    /// Line or block comment, delimiters included
    Comment,
    /// Token whose shape suggests a credential or PII (emails, key headers, long mixed runs)
    SecretCandidate,
    /// Punctuation, brackets and whitespace
    Structural,
}

/// A contiguous slice of the scanned text.
///
/// Spans produced by one `scan` call tile the input exactly: concatenating
/// their `text` yields the original source byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: usize,

    /// Byte offset one past the last byte
    pub end: usize,

    /// Raw text of the span
    pub text: String,

    /// Lexical category
    pub kind: SpanKind,
}

impl Span {
    /// Create a span from a slice of `source`.
    pub fn new(source: &str, range: Range<usize>, kind: SpanKind) -> Self {
        Self {
            start: range.start,
            end: range.end,
            text: source[range].to_string(),
            kind,
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether this is a whitespace-only structural span.
    pub fn is_whitespace(&self) -> bool {
        self.kind == SpanKind::Structural && self.text.chars().all(char::is_whitespace)
    }

    /// Whether this span is trivia (whitespace or comment) for lookahead purposes.
    pub fn is_trivia(&self) -> bool {
        self.is_whitespace() || self.kind == SpanKind::Comment
    }

    /// Whether this is the structural span consisting of exactly `punct`.
    pub fn is_punct(&self, punct: &str) -> bool {
        self.kind == SpanKind::Structural && self.text == punct
    }
}

/// Sensitivity label assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sensitivity {
    /// Safe to send verbatim
    Public,
    /// Credential or PII
    Secret,
    /// Business logic: names and literals
    Proprietary,
}

impl Sensitivity {
    /// Whether spans with this label must be replaced before leaving the process.
    pub fn requires_redaction(&self) -> bool {
        !matches!(self, Sensitivity::Public)
    }
}

impl std::fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensitivity::Public => write!(f, "PUBLIC"),
            Sensitivity::Secret => write!(f, "SECRET"),
            Sensitivity::Proprietary => write!(f, "PROPRIETARY"),
        }
    }
}
