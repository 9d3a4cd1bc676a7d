//! Markdown review comment with unified diffs of suggested changes.

use super::Reporter;
use crate::session::{FileReview, SessionOutcome, SessionStatus};
use similar::TextDiff;

/// Markdown reporter producing a pull request comment body.
pub struct MarkdownReporter {
    /// Lines of context around each hunk
    context_radius: usize,
}

impl MarkdownReporter {
    pub fn new() -> Self {
        Self { context_radius: 3 }
    }

    pub fn with_context_radius(mut self, radius: usize) -> Self {
        self.context_radius = radius;
        self
    }

    /// Unified diff from the submitted text to the restored text.
    pub fn file_diff(&self, review: &FileReview) -> String {
        TextDiff::from_lines(&review.original, &review.restored.content)
            .unified_diff()
            .context_radius(self.context_radius)
            .header("original", "updated")
            .to_string()
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for MarkdownReporter {
    fn generate(&self, outcome: &SessionOutcome) -> String {
        if let SessionStatus::Failed(ref reason) = outcome.status {
            return format!(
                "### Code Review Aborted\n\nThe review session failed: `{}`\n",
                reason
            );
        }

        let analysis = outcome
            .analysis
            .as_deref()
            .unwrap_or("No analysis provided.")
            .lines()
            .map(|l| format!("> {}", l))
            .collect::<Vec<_>>()
            .join("\n");
        let mut body = format!(
            "### Security & Code Review\n\n**Analysis:**\n\n{}\n\n---",
            analysis
        );

        let findings: Vec<_> = outcome.findings().collect();
        if !findings.is_empty() {
            body.push_str("\n\n**Findings:**\n\n");
            for finding in findings {
                body.push_str(&format!(
                    "- **{}** `{}:{}:{}` {}\n",
                    finding.severity,
                    finding.path,
                    finding.location.line,
                    finding.location.column,
                    finding.message
                ));
            }
        }

        let changed: Vec<_> = outcome
            .files
            .iter()
            .filter(|f| f.original.trim() != f.restored.content.trim())
            .collect();
        if changed.is_empty() {
            body.push_str("\n\n**No code changes were suggested.**\n");
        } else {
            body.push_str("\n\n**Suggested Changes:**\n");
            for review in changed {
                body.push_str(&format!(
                    "\n<details><summary><code>{}</code></summary>\n\n```diff\n{}\n```\n\n</details>\n",
                    review.path(),
                    self.file_diff(review)
                ));
            }
        }

        if let SessionStatus::PartialSuccess(count) = outcome.status {
            body.push_str(&format!(
                "\n> **Note:** {} placeholder(s) returned by the service could not be restored and are marked `UNRESOLVED`.\n",
                count
            ));
        }

        body
    }
}
