//! Placeholder tokens substituted for redacted spans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opening delimiter of a placeholder token (U+27EA).
pub const PLACEHOLDER_OPEN: char = '⟪';

/// Closing delimiter of a placeholder token (U+27E7).
pub const PLACEHOLDER_CLOSE: char = '⟧';

/// Category encoded in a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlaceholderKind {
    Var,
    Func,
    Str,
    Secret,
    Num,
}

impl PlaceholderKind {
    pub const ALL: [PlaceholderKind; 5] = [
        PlaceholderKind::Var,
        PlaceholderKind::Func,
        PlaceholderKind::Str,
        PlaceholderKind::Secret,
        PlaceholderKind::Num,
    ];

    /// Tag used inside the token text.
    pub fn tag(&self) -> &'static str {
        match self {
            PlaceholderKind::Var => "VAR",
            PlaceholderKind::Func => "FUNC",
            PlaceholderKind::Str => "STR",
            PlaceholderKind::Secret => "SECRET",
            PlaceholderKind::Num => "NUM",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A synthetic token `⟪KIND_N⟧`, unique within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub index: u64,
}

impl Placeholder {
    pub fn new(kind: PlaceholderKind, index: u64) -> Self {
        Self { kind, index }
    }

    /// Parse the inner part of a token (`VAR_3`), without delimiters.
    pub fn parse_inner(inner: &str) -> Option<Self> {
        let (tag, number) = inner.rsplit_once('_')?;
        let kind = PlaceholderKind::from_tag(tag)?;
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Leading zeros would break the one-token-per-placeholder invariant.
        if number.len() > 1 && number.starts_with('0') {
            return None;
        }
        let index = number.parse().ok()?;
        Some(Self { kind, index })
    }

    /// Rendered token length in bytes.
    pub fn token_len(&self) -> usize {
        self.to_string().len()
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}_{}{}",
            PLACEHOLDER_OPEN,
            self.kind.tag(),
            self.index,
            PLACEHOLDER_CLOSE
        )
    }
}

/// Error returned when a string is not a well-formed placeholder token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedPlaceholder(pub String);

impl fmt::Display for MalformedPlaceholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed placeholder token: {}", self.0)
    }
}

impl std::error::Error for MalformedPlaceholder {}

impl FromStr for Placeholder {
    type Err = MalformedPlaceholder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(PLACEHOLDER_OPEN)
            .and_then(|rest| rest.strip_suffix(PLACEHOLDER_CLOSE))
            .and_then(Placeholder::parse_inner)
            .ok_or_else(|| MalformedPlaceholder(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let p = Placeholder::new(PlaceholderKind::Var, 12);
        assert_eq!(p.to_string(), "⟪VAR_12⟧");
        assert_eq!(
            Placeholder::new(PlaceholderKind::Secret, 1).to_string(),
            "⟪SECRET_1⟧"
        );
    }

    #[test]
    fn test_parse_token() {
        let p: Placeholder = "⟪FUNC_7⟧".parse().unwrap();
        assert_eq!(p, Placeholder::new(PlaceholderKind::Func, 7));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("⟪VAR⟧".parse::<Placeholder>().is_err());
        assert!("⟪VAR_⟧".parse::<Placeholder>().is_err());
        assert!("⟪FOO_1⟧".parse::<Placeholder>().is_err());
        assert!("⟪VAR_01⟧".parse::<Placeholder>().is_err());
        assert!("VAR_1".parse::<Placeholder>().is_err());
        assert!("⟪var_1⟧".parse::<Placeholder>().is_err());
    }
}
