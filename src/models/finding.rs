//! Review finding data models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Parse a loosely formatted severity string from a remote response.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" | "blocker" => Severity::Critical,
            "error" | "high" => Severity::Error,
            "warning" | "warn" | "medium" => Severity::Warning,
            _ => Severity::Info,
        }
    }

    /// Cap at `Warning`.
    pub fn downgraded(self) -> Self {
        self.min(Severity::Warning)
    }
}

fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Severity, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Severity::parse_lenient).unwrap_or_default())
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Info
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Diagnostic as produced by the remote service, in abstracted coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFinding {
    /// File the finding refers to
    pub path: String,

    /// Placeholder token the offset is relative to (absolute offset if absent)
    #[serde(default)]
    pub anchor: Option<String>,

    /// Byte offset into the abstracted document
    #[serde(default)]
    pub offset: usize,

    /// Message, possibly referencing placeholders
    pub message: String,

    /// Severity
    #[serde(default, deserialize_with = "deserialize_lenient")]
    pub severity: Severity,

    /// Rule or category reported by the service
    #[serde(default)]
    pub rule_id: Option<String>,
}

/// Location of a finding in restored text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset
    pub offset: usize,

    /// Line (1-indexed)
    pub line: usize,

    /// Column in bytes (1-indexed)
    pub column: usize,
}

impl Location {
    /// Compute line and column of `offset` within `content`.
    pub fn from_offset(content: &str, offset: usize) -> Self {
        let offset = floor_char_boundary(content, offset.min(content.len()));
        let before = &content[..offset];
        let line = before.matches('\n').count() + 1;
        let last_newline = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        Self {
            offset,
            line,
            column: offset - last_newline + 1,
        }
    }
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Finding relocated into restored-text coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Unique finding ID
    pub id: String,

    /// File path
    pub path: String,

    /// Severity after any downgrade
    pub severity: Severity,

    /// Message with placeholders restored
    pub message: String,

    /// Location in restored text
    pub location: Location,

    /// Rule or category reported by the service
    pub rule_id: Option<String>,

    /// Whether the finding touched an unresolved placeholder
    pub downgraded: bool,

    /// Timestamp when the finding was relocated
    pub discovered_at: chrono::DateTime<chrono::Utc>,
}

impl Finding {
    /// Create a new finding.
    pub fn new(
        path: impl Into<String>,
        message: impl Into<String>,
        location: Location,
        severity: Severity,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            path: path.into(),
            severity,
            message: message.into(),
            location,
            rule_id: None,
            downgraded: false,
            discovered_at: chrono::Utc::now(),
        }
    }

    /// Set the rule id.
    pub fn with_rule(mut self, rule_id: Option<String>) -> Self {
        self.rule_id = rule_id;
        self
    }

    /// Cap severity at warning and flag the finding.
    pub fn downgrade(mut self) -> Self {
        self.severity = self.severity.downgraded();
        self.downgraded = true;
        self
    }
}
