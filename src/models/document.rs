//! Abstracted document model exchanged with the remote analysis service.

use super::placeholder::{Placeholder, PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest token body (in chars) still considered a placeholder candidate.
const MAX_PLACEHOLDER_SCAN: usize = 32;

/// Identifier correlating an abstracted document with its mapping store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(uuid::Uuid);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One element of an abstracted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DocToken {
    /// PUBLIC text copied verbatim
    Text(String),
    /// Well-formed placeholder reference
    Placeholder(Placeholder),
    /// Delimited token that does not parse as a placeholder (only after remote edits)
    Malformed(String),
}

impl DocToken {
    /// Text this token renders to on the wire.
    pub fn rendered(&self) -> String {
        match self {
            DocToken::Text(text) | DocToken::Malformed(text) => text.clone(),
            DocToken::Placeholder(p) => p.to_string(),
        }
    }
}

/// Ordered sequence of PUBLIC text and placeholders for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractedDocument {
    /// Session this document belongs to
    pub session_id: SessionId,

    /// File path the document was produced from
    pub path: String,

    /// Token sequence
    pub tokens: Vec<DocToken>,
}

impl AbstractedDocument {
    /// Create an empty document.
    pub fn new(session_id: SessionId, path: impl Into<String>) -> Self {
        Self {
            session_id,
            path: path.into(),
            tokens: Vec::new(),
        }
    }

    /// Append PUBLIC text, merging with a preceding text token.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(DocToken::Text(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(DocToken::Text(text.to_string()));
        }
    }

    /// Append a placeholder reference.
    pub fn push_placeholder(&mut self, placeholder: Placeholder) {
        self.tokens.push(DocToken::Placeholder(placeholder));
    }

    /// Render the wire representation.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                DocToken::Text(text) | DocToken::Malformed(text) => out.push_str(text),
                DocToken::Placeholder(p) => out.push_str(&p.to_string()),
            }
        }
        out
    }

    /// Placeholders referenced by this document, in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.tokens.iter().filter_map(|t| match t {
            DocToken::Placeholder(p) => Some(p),
            _ => None,
        })
    }

    /// Re-tokenize wire text returned by the remote service.
    ///
    /// Placeholders round-trip as opaque strings: anything between the
    /// delimiters that is not `KIND_N` becomes [`DocToken::Malformed`].
    pub fn parse(session_id: SessionId, path: impl Into<String>, text: &str) -> Self {
        let mut doc = Self::new(session_id, path);
        let mut rest = text;

        while let Some(open) = rest.find(PLACEHOLDER_OPEN) {
            doc.push_text(&rest[..open]);
            let after_open = &rest[open + PLACEHOLDER_OPEN.len_utf8()..];

            match find_close(after_open) {
                Some(close) => {
                    let inner = &after_open[..close];
                    let end = open + PLACEHOLDER_OPEN.len_utf8() + close + PLACEHOLDER_CLOSE.len_utf8();
                    match Placeholder::parse_inner(inner) {
                        Some(p) => doc.push_placeholder(p),
                        None => doc.tokens.push(DocToken::Malformed(rest[open..end].to_string())),
                    }
                    rest = &rest[end..];
                }
                None => {
                    let end = open + PLACEHOLDER_OPEN.len_utf8();
                    doc.push_text(&rest[open..end]);
                    rest = &rest[end..];
                }
            }
        }
        doc.push_text(rest);
        doc
    }
}

/// Byte index of the closing delimiter, if it follows within a short window
/// on the same line and no other opening delimiter intervenes.
fn find_close(s: &str) -> Option<usize> {
    for (count, (idx, c)) in s.char_indices().enumerate() {
        if count > MAX_PLACEHOLDER_SCAN {
            return None;
        }
        match c {
            PLACEHOLDER_CLOSE => return Some(idx),
            PLACEHOLDER_OPEN | '\n' => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlaceholderKind;

    #[test]
    fn test_push_text_merges() {
        let mut doc = AbstractedDocument::new(SessionId::new(), "a.rs");
        doc.push_text("let ");
        doc.push_text("= ");
        assert_eq!(doc.tokens.len(), 1);
    }

    #[test]
    fn test_parse_recognizes_placeholders() {
        let id = SessionId::new();
        let doc = AbstractedDocument::parse(id, "a.js", "let ⟪VAR_1⟧ = ⟪FUNC_2⟧(⟪NUM_1⟧);");

        let found: Vec<_> = doc.placeholders().copied().collect();
        assert_eq!(
            found,
            vec![
                Placeholder::new(PlaceholderKind::Var, 1),
                Placeholder::new(PlaceholderKind::Func, 2),
                Placeholder::new(PlaceholderKind::Num, 1),
            ]
        );
        assert_eq!(doc.render(), "let ⟪VAR_1⟧ = ⟪FUNC_2⟧(⟪NUM_1⟧);");
    }

    #[test]
    fn test_parse_malformed_and_unterminated() {
        let doc = AbstractedDocument::parse(SessionId::new(), "x", "a ⟪BOGUS⟧ b ⟪VAR_3 c");
        assert!(doc
            .tokens
            .iter()
            .any(|t| *t == DocToken::Malformed("⟪BOGUS⟧".to_string())));
        assert_eq!(doc.placeholders().count(), 0);
        assert_eq!(doc.render(), "a ⟪BOGUS⟧ b ⟪VAR_3 c");
    }
}
