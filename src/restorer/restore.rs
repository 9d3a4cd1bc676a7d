//! Reconstruction of original text from a (possibly edited) abstracted document.

use crate::error::{AbstractionError, Result};
use crate::models::{
    AbstractedDocument, DocToken, Finding, Location, Placeholder, RemoteFinding, PLACEHOLDER_CLOSE,
    PLACEHOLDER_OPEN,
};
use crate::redactor::MappingStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Why a delimited token could not be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Well-formed placeholder never allocated in this session
    UnknownPlaceholder,
    /// Delimited token that is not `KIND_N`
    Malformed,
}

/// A region of the restored text left as a visible unresolved marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestorationError {
    /// File path
    pub path: String,

    /// Token text as returned by the remote service
    pub token: String,

    /// Byte offset of the marker in the restored text
    pub offset: usize,

    /// Failure reason
    pub reason: UnresolvedReason,
}

impl fmt::Display for RestorationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.reason {
            UnresolvedReason::UnknownPlaceholder => "unknown placeholder",
            UnresolvedReason::Malformed => "malformed placeholder",
        };
        write!(f, "{}:{}: {} {}", self.path, self.offset, reason, self.token)
    }
}

/// Visible marker written in place of a token that could not be restored.
pub fn unresolved_marker(token: &str) -> String {
    let inner = token.strip_prefix(PLACEHOLDER_OPEN).unwrap_or(token);
    let inner = inner.strip_suffix(PLACEHOLDER_CLOSE).unwrap_or(inner);
    format!("{}UNRESOLVED:{}{}", PLACEHOLDER_OPEN, inner, PLACEHOLDER_CLOSE)
}

/// Restored content of one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoredFile {
    /// File path
    pub path: String,

    /// Restored text
    pub content: String,

    /// Findings relocated into `content` coordinates
    pub findings: Vec<Finding>,

    /// Regions that could not be restored
    pub unresolved: Vec<RestorationError>,
}

impl RestoredFile {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Correspondence between one document token and its restored region.
#[derive(Debug, Clone, Copy)]
struct Segment {
    abstract_start: usize,
    abstract_len: usize,
    restored_start: usize,
    unresolved: bool,
    is_text: bool,
}

/// Restores documents against the mapping store of their session.
pub struct Restorer<'a> {
    store: &'a MappingStore,
}

impl<'a> Restorer<'a> {
    pub fn new(store: &'a MappingStore) -> Self {
        Self { store }
    }

    /// Restore `doc` and relocate the findings that refer to its path.
    pub fn restore(&self, doc: &AbstractedDocument, findings: &[RemoteFinding]) -> Result<RestoredFile> {
        if doc.session_id != self.store.session_id() {
            return Err(AbstractionError::SessionMismatch {
                expected: self.store.session_id().to_string(),
                found: doc.session_id.to_string(),
            });
        }

        let mut content = String::new();
        let mut unresolved = Vec::new();
        let mut segments = Vec::with_capacity(doc.tokens.len());
        let mut abstract_pos = 0;

        for token in &doc.tokens {
            let rendered = token.rendered();
            let restored_start = content.len();
            let mut failed = false;

            match token {
                DocToken::Text(text) => content.push_str(text),
                DocToken::Placeholder(p) => match self.store.original(p) {
                    Some(original) => content.push_str(original),
                    None => {
                        failed = true;
                        unresolved.push(RestorationError {
                            path: doc.path.clone(),
                            token: rendered.clone(),
                            offset: restored_start,
                            reason: UnresolvedReason::UnknownPlaceholder,
                        });
                        content.push_str(&unresolved_marker(&rendered));
                    }
                },
                DocToken::Malformed(raw) => {
                    failed = true;
                    unresolved.push(RestorationError {
                        path: doc.path.clone(),
                        token: raw.clone(),
                        offset: restored_start,
                        reason: UnresolvedReason::Malformed,
                    });
                    content.push_str(&unresolved_marker(raw));
                }
            }

            segments.push(Segment {
                abstract_start: abstract_pos,
                abstract_len: rendered.len(),
                restored_start,
                unresolved: failed,
                is_text: matches!(token, DocToken::Text(_)),
            });
            abstract_pos += rendered.len();
        }

        if !unresolved.is_empty() {
            warn!(
                "{} unresolved placeholder(s) in {}",
                unresolved.len(),
                doc.path
            );
        }

        let mut file = RestoredFile {
            path: doc.path.clone(),
            content,
            findings: Vec::new(),
            unresolved,
        };

        file.findings = findings
            .iter()
            .filter(|f| f.path == doc.path)
            .filter_map(|f| self.relocate(f, doc, &segments, abstract_pos, &file.content))
            .collect();

        debug!(
            "Restored {}: {} findings relocated",
            doc.path,
            file.findings.len()
        );
        Ok(file)
    }

    /// Restore placeholders inside free text (messages, summaries).
    ///
    /// Returns the restored text and the number of tokens left unresolved.
    pub fn restore_text(&self, text: &str) -> (String, usize) {
        let parsed = AbstractedDocument::parse(self.store.session_id(), "", text);
        let mut out = String::with_capacity(text.len());
        let mut unresolved = 0;

        for token in &parsed.tokens {
            match token {
                DocToken::Text(t) => out.push_str(t),
                DocToken::Placeholder(p) => match self.store.original(p) {
                    Some(original) => out.push_str(original),
                    None => {
                        unresolved += 1;
                        out.push_str(&unresolved_marker(&p.to_string()));
                    }
                },
                DocToken::Malformed(raw) => {
                    unresolved += 1;
                    out.push_str(&unresolved_marker(raw));
                }
            }
        }
        (out, unresolved)
    }

    fn relocate(
        &self,
        finding: &RemoteFinding,
        doc: &AbstractedDocument,
        segments: &[Segment],
        abstract_len: usize,
        content: &str,
    ) -> Option<Finding> {
        let mut downgrade = false;

        let abstract_offset = match finding.anchor.as_deref() {
            Some(anchor) => {
                let Some(start) = anchor_offset(doc, anchor) else {
                    warn!(
                        "Dropping finding for {}: anchor {} no longer in document",
                        finding.path, anchor
                    );
                    return None;
                };
                let known = parse_anchor(anchor).is_some_and(|p| self.store.contains(&p));
                downgrade |= !known;
                start.checked_add(finding.offset)
            }
            None => Some(finding.offset),
        };

        let abstract_offset = match abstract_offset {
            Some(offset) if offset <= abstract_len => offset,
            _ => {
                warn!(
                    "Dropping finding for {}: offset {} beyond document end {}",
                    finding.path, finding.offset, abstract_len
                );
                return None;
            }
        };

        let (restored_offset, in_unresolved) = map_offset(segments, abstract_offset, content.len());
        downgrade |= in_unresolved;

        let (message, unresolved_in_message) = self.restore_text(&finding.message);
        downgrade |= unresolved_in_message > 0;

        let location = Location::from_offset(content, restored_offset);
        let relocated = Finding::new(&finding.path, message, location, finding.severity)
            .with_rule(finding.rule_id.clone());

        if downgrade {
            debug!(
                "Finding at {}:{} touches unresolved placeholders, downgrading",
                finding.path, location.line
            );
            Some(relocated.downgrade())
        } else {
            Some(relocated)
        }
    }
}

/// Parse an anchor given either as a full token or as its inner text.
fn parse_anchor(anchor: &str) -> Option<Placeholder> {
    anchor
        .parse::<Placeholder>()
        .ok()
        .or_else(|| Placeholder::parse_inner(anchor))
}

/// Abstracted byte offset of the first occurrence of `anchor` in `doc`.
fn anchor_offset(doc: &AbstractedDocument, anchor: &str) -> Option<usize> {
    let wanted = match parse_anchor(anchor) {
        Some(p) => p.to_string(),
        None if anchor.starts_with(PLACEHOLDER_OPEN) => anchor.to_string(),
        None => format!("{}{}{}", PLACEHOLDER_OPEN, anchor, PLACEHOLDER_CLOSE),
    };

    let mut pos = 0;
    for token in &doc.tokens {
        let rendered = token.rendered();
        if !matches!(token, DocToken::Text(_)) && rendered == wanted {
            return Some(pos);
        }
        pos += rendered.len();
    }
    None
}

/// Map an abstracted offset to restored coordinates.
///
/// Offsets inside text tokens shift with the token; offsets inside a
/// placeholder map to the start of its restored region.
fn map_offset(segments: &[Segment], offset: usize, restored_len: usize) -> (usize, bool) {
    let index = segments.partition_point(|s| s.abstract_start + s.abstract_len <= offset);
    match segments.get(index) {
        Some(segment) if segment.is_text => (
            segment.restored_start + (offset - segment.abstract_start),
            false,
        ),
        Some(segment) => (segment.restored_start, segment.unresolved),
        None => (restored_len, false),
    }
}

/// Restore one document in isolation.
pub fn restore(
    doc: &AbstractedDocument,
    store: &MappingStore,
    findings: &[RemoteFinding],
) -> Result<RestoredFile> {
    Restorer::new(store).restore(doc, findings)
}
