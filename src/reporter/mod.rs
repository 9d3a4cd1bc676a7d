//! Reporting module for session outcomes.

mod markdown;
mod text;

pub use markdown::*;
pub use text::*;

use crate::config::OutputFormat;
use crate::session::SessionOutcome;

/// Report generator trait.
pub trait Reporter {
    /// Generate a report from a session outcome.
    fn generate(&self, outcome: &SessionOutcome) -> String;
}

/// Create a reporter based on output format.
pub fn create_reporter(format: OutputFormat) -> Box<dyn Reporter> {
    match format {
        OutputFormat::Markdown => Box::new(MarkdownReporter::new()),
        OutputFormat::Json => Box::new(JsonReporter::new()),
        OutputFormat::Text => Box::new(TextReporter::new()),
    }
}

/// JSON reporter for machine consumption.
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for JsonReporter {
    fn generate(&self, outcome: &SessionOutcome) -> String {
        serde_json::to_string_pretty(outcome)
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::{Finding, Location, Severity, SessionId};
    use crate::restorer::RestoredFile;
    use crate::session::{FileReview, SessionOutcome, SessionStatus};

    pub fn outcome() -> SessionOutcome {
        let original = "def compute_tax(amount):\n    return amount * 0.21\n".to_string();
        let content = "def compute_tax(amount):\n    return round(amount * 0.21, 2)\n".to_string();
        let finding = Finding::new(
            "billing/tax.py",
            "compute_tax rounds implicitly",
            Location::from_offset(&content, 29),
            Severity::Warning,
        );

        SessionOutcome {
            session_id: SessionId::new(),
            status: SessionStatus::Success,
            analysis: Some("compute_tax should round to cents.".to_string()),
            files: vec![FileReview {
                original,
                restored: RestoredFile {
                    path: "billing/tax.py".to_string(),
                    content,
                    findings: vec![finding],
                    unresolved: Vec::new(),
                },
            }],
            estimated_tokens: 12,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_report_is_parseable() {
        let report = JsonReporter::new().generate(&fixtures::outcome());
        let value: serde_json::Value = serde_json::from_str(&report).unwrap();
        assert_eq!(value["status"], "Success");
        assert_eq!(value["files"][0]["restored"]["path"], "billing/tax.py");
    }
}
