//! Human-readable text reporter.

use super::Reporter;
use crate::models::Severity;
use crate::session::{SessionOutcome, SessionStatus};

/// Text format reporter for terminal output.
pub struct TextReporter {
    /// Use colors in output
    use_colors: bool,

    /// Maximum findings to show (0 = unlimited)
    max_findings: usize,
}

impl TextReporter {
    /// Create a new text reporter.
    pub fn new() -> Self {
        Self {
            use_colors: true,
            max_findings: 0,
        }
    }

    /// Disable colors.
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Limit number of findings shown.
    pub fn with_max_findings(mut self, max: usize) -> Self {
        self.max_findings = max;
        self
    }

    fn severity_color(&self, severity: Severity) -> &'static str {
        if !self.use_colors {
            return "";
        }
        match severity {
            Severity::Critical => "\x1b[91m",
            Severity::Error => "\x1b[31m",
            Severity::Warning => "\x1b[33m",
            Severity::Info => "\x1b[36m",
        }
    }

    fn reset(&self) -> &'static str {
        if self.use_colors {
            "\x1b[0m"
        } else {
            ""
        }
    }

    fn bold(&self) -> &'static str {
        if self.use_colors {
            "\x1b[1m"
        } else {
            ""
        }
    }

    fn dim(&self) -> &'static str {
        if self.use_colors {
            "\x1b[2m"
        } else {
            ""
        }
    }

    fn green(&self) -> &'static str {
        if self.use_colors {
            "\x1b[32m"
        } else {
            ""
        }
    }

    fn red(&self) -> &'static str {
        if self.use_colors {
            "\x1b[31m"
        } else {
            ""
        }
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for TextReporter {
    fn generate(&self, outcome: &SessionOutcome) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\n{}=== Code Review Report ==={}\n\n",
            self.bold(),
            self.reset()
        ));
        output.push_str(&format!(
            "{}Session:{} {}\n",
            self.bold(),
            self.reset(),
            outcome.session_id
        ));
        output.push_str(&format!(
            "{}Files:{} {} ({} changed)\n",
            self.bold(),
            self.reset(),
            outcome.files.len(),
            outcome.files.iter().filter(|f| f.changed()).count()
        ));
        output.push_str(&format!(
            "{}Estimated tokens sent:{} {}\n\n",
            self.bold(),
            self.reset(),
            outcome.estimated_tokens
        ));

        if let Some(ref analysis) = outcome.analysis {
            output.push_str(&format!("{}--- Analysis ---{}\n", self.bold(), self.reset()));
            output.push_str(analysis);
            output.push_str("\n\n");
        }

        let mut findings: Vec<_> = outcome.findings().collect();
        if findings.is_empty() {
            output.push_str(&format!("{}No findings reported.{}\n", self.dim(), self.reset()));
        } else {
            output.push_str(&format!("{}--- Findings ---{}\n\n", self.bold(), self.reset()));
            findings.sort_by(|a, b| b.severity.cmp(&a.severity));

            let shown = if self.max_findings > 0 {
                self.max_findings.min(findings.len())
            } else {
                findings.len()
            };

            for finding in &findings[..shown] {
                output.push_str(&format!(
                    "{}[{}]{} {}{}:{}:{}{}{}\n",
                    self.severity_color(finding.severity),
                    finding.severity,
                    self.reset(),
                    self.bold(),
                    finding.path,
                    finding.location.line,
                    finding.location.column,
                    self.reset(),
                    if finding.downgraded { " (downgraded)" } else { "" }
                ));
                if let Some(ref rule) = finding.rule_id {
                    output.push_str(&format!("  {}Rule:{} {}\n", self.dim(), self.reset(), rule));
                }
                output.push_str(&format!("  {}\n\n", finding.message));
            }

            if shown < findings.len() {
                output.push_str(&format!(
                    "{}... and {} more findings{}\n",
                    self.dim(),
                    findings.len() - shown,
                    self.reset()
                ));
            }
        }

        let unresolved: Vec<_> = outcome
            .files
            .iter()
            .flat_map(|f| f.restored.unresolved.iter())
            .collect();
        if !unresolved.is_empty() {
            output.push_str(&format!(
                "\n{}--- Unresolved Placeholders ---{}\n",
                self.bold(),
                self.reset()
            ));
            for region in unresolved {
                output.push_str(&format!("  {}\n", region));
            }
        }

        output.push_str(&format!("\n{}--- Status ---{}\n", self.bold(), self.reset()));
        match &outcome.status {
            SessionStatus::Success => output.push_str(&format!(
                "{}Session completed successfully.{}\n",
                self.green(),
                self.reset()
            )),
            SessionStatus::PartialSuccess(count) => output.push_str(&format!(
                "{}Session completed with {} unresolved placeholder(s).{}\n",
                self.severity_color(Severity::Warning),
                count,
                self.reset()
            )),
            SessionStatus::Failed(reason) => output.push_str(&format!(
                "{}Session failed: {}{}\n",
                self.red(),
                reason,
                self.reset()
            )),
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionId;
    use crate::reporter::fixtures;

    #[test]
    fn test_text_report_generation() {
        let report = TextReporter::new().without_colors().generate(&fixtures::outcome());

        assert!(report.contains("Code Review Report"));
        assert!(report.contains("compute_tax should round to cents."));
        assert!(report.contains("[WARNING] billing/tax.py:2:5"));
        assert!(report.contains("1 changed"));
        assert!(report.contains("Session completed successfully."));
    }

    #[test]
    fn test_failed_report() {
        let outcome = SessionOutcome {
            session_id: SessionId::new(),
            status: SessionStatus::Failed("Session cancelled".to_string()),
            analysis: None,
            files: Vec::new(),
            estimated_tokens: 0,
        };
        let report = TextReporter::new().without_colors().generate(&outcome);

        assert!(report.contains("No findings reported."));
        assert!(report.contains("Session failed: Session cancelled"));
    }

    #[test]
    fn test_max_findings() {
        let mut outcome = fixtures::outcome();
        let extra = outcome.files[0].restored.findings[0].clone();
        outcome.files[0].restored.findings.push(extra);

        let report = TextReporter::new()
            .without_colors()
            .with_max_findings(1)
            .generate(&outcome);
        assert!(report.contains("... and 1 more findings"));
    }
}
