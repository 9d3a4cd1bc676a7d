//! Span labelling: PUBLIC, SECRET or PROPRIETARY.

use super::{KeywordTable, SecretMatcher};
use crate::config::ClassifierConfig;
use crate::error::Result;
use crate::models::{Language, Sensitivity, Span, SpanKind, PLACEHOLDER_CLOSE, PLACEHOLDER_OPEN};
use std::collections::HashSet;
use tracing::debug;

/// Literals relaxed to PUBLIC when `relax_common_literals` is set.
const COMMON_LITERALS: &[&str] = &[
    "0", "1", "2", "0.0", "1.0", "\"\"", "''", "\"true\"", "\"false\"", "' '", "\" \"",
    "\"\\n\"", "'\\n'",
];

/// Context available while classifying one file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyContext {
    /// Language hint of the file being classified
    pub language: Language,
}

impl ClassifyContext {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

/// Labels spans as PUBLIC, SECRET or PROPRIETARY.
#[derive(Debug, Clone)]
pub struct Classifier {
    secrets: SecretMatcher,
    keywords: KeywordTable,
    allow_list: HashSet<String>,
    public_literals: HashSet<String>,
    comment_terms: Vec<String>,
    redact_comments: bool,
    min_identifier_length: usize,
}

impl Classifier {
    /// Build a classifier, compiling any user-supplied secret patterns.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let secrets = SecretMatcher::new(&config.extra_secret_patterns, config.entropy_detection)?;

        let mut public_literals: HashSet<String> =
            config.public_literals.iter().cloned().collect();
        if config.relax_common_literals {
            public_literals.extend(COMMON_LITERALS.iter().map(|s| s.to_string()));
        }

        Ok(Self {
            secrets,
            keywords: KeywordTable::new(),
            allow_list: config
                .allow_list
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            public_literals,
            comment_terms: config
                .comment_terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            redact_comments: config.redact_comments,
            min_identifier_length: config.min_identifier_length,
        })
    }

    /// Secret matcher shared with the boundary guard.
    pub fn secrets(&self) -> &SecretMatcher {
        &self.secrets
    }

    /// Classify a single span.
    pub fn classify(&self, span: &Span, ctx: &ClassifyContext) -> Sensitivity {
        let label = self.classify_by_kind(span, ctx);

        // Placeholder delimiters may only appear inside placeholders in the
        // abstracted text, so a public span carrying one is redacted instead.
        if label == Sensitivity::Public
            && span.text.contains([PLACEHOLDER_OPEN, PLACEHOLDER_CLOSE])
        {
            debug!(
                "Span at {}..{} contains placeholder delimiters, redacting",
                span.start, span.end
            );
            return Sensitivity::Proprietary;
        }
        label
    }

    /// Classify every span of a file.
    pub fn classify_all(&self, spans: &[Span], ctx: &ClassifyContext) -> Vec<Sensitivity> {
        spans.iter().map(|s| self.classify(s, ctx)).collect()
    }

    fn classify_by_kind(&self, span: &Span, ctx: &ClassifyContext) -> Sensitivity {
        if span.kind == SpanKind::Structural {
            return Sensitivity::Public;
        }

        if let Some(pattern) = self.secrets.find(&span.text) {
            debug!(
                "Span at {}..{} matches secret pattern '{}'",
                span.start, span.end, pattern.name
            );
            return Sensitivity::Secret;
        }

        match span.kind {
            SpanKind::SecretCandidate => {
                if self.secrets.is_high_entropy_literal(&span.text) {
                    Sensitivity::Secret
                } else {
                    // Shape suggested a credential but nothing confirmed it.
                    debug!(
                        "Ambiguous secret candidate at {}..{}, defaulting to PROPRIETARY",
                        span.start, span.end
                    );
                    Sensitivity::Proprietary
                }
            }
            SpanKind::Identifier => self.classify_identifier(&span.text, ctx),
            SpanKind::StringLiteral => {
                if self.public_literals.contains(&span.text) {
                    Sensitivity::Public
                } else if self.secrets.is_high_entropy_literal(string_body(&span.text)) {
                    Sensitivity::Secret
                } else {
                    Sensitivity::Proprietary
                }
            }
            SpanKind::NumberLiteral => {
                if self.public_literals.contains(&span.text) {
                    Sensitivity::Public
                } else {
                    Sensitivity::Proprietary
                }
            }
            SpanKind::Comment => self.classify_comment(&span.text),
            SpanKind::Structural => Sensitivity::Public,
        }
    }

    fn classify_identifier(&self, text: &str, ctx: &ClassifyContext) -> Sensitivity {
        if self.allow_list.contains(text) || self.keywords.is_public(text, ctx.language) {
            return Sensitivity::Public;
        }
        if text.chars().count() < self.min_identifier_length {
            return Sensitivity::Public;
        }
        Sensitivity::Proprietary
    }

    fn classify_comment(&self, text: &str) -> Sensitivity {
        if self.redact_comments {
            return Sensitivity::Proprietary;
        }
        if !self.comment_terms.is_empty() {
            let lower = text.to_lowercase();
            if self.comment_terms.iter().any(|t| lower.contains(t.as_str())) {
                return Sensitivity::Proprietary;
            }
        }
        Sensitivity::Public
    }
}

/// Text between the quotes of a string literal, prefix and delimiters removed.
fn string_body(literal: &str) -> &str {
    let Some(i) = literal.find(['"', '\'', '`']) else {
        return literal;
    };
    let quote = literal.as_bytes()[i];
    let run = literal.as_bytes()[i..].iter().take_while(|&&b| b == quote).count();
    // Triple quotes are a single delimiter; `""` is an empty body.
    let start = i + if run >= 3 { 3 } else { 1 };
    literal[start.min(literal.len())..].trim_end_matches(['"', '\'', '`', '#'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::scan_with;

    fn classify_text(classifier: &Classifier, text: &str, language: Language) -> Vec<(String, Sensitivity)> {
        let ctx = ClassifyContext::new(language);
        scan_with(text, language)
            .into_iter()
            .filter(|s| !s.is_whitespace())
            .map(|s| {
                let label = classifier.classify(&s, &ctx);
                (s.text, label)
            })
            .collect()
    }

    fn label_of(labels: &[(String, Sensitivity)], text: &str) -> Sensitivity {
        labels
            .iter()
            .find(|(t, _)| t == text)
            .map(|(_, l)| *l)
            .unwrap_or_else(|| panic!("no span {text:?}"))
    }

    #[test]
    fn test_identifiers_and_keywords() {
        let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
        let labels = classify_text(
            &classifier,
            "def compute_tax(amount):\n    return amount * 0.2\n",
            Language::Python,
        );
        assert_eq!(label_of(&labels, "def"), Sensitivity::Public);
        assert_eq!(label_of(&labels, "return"), Sensitivity::Public);
        assert_eq!(label_of(&labels, "compute_tax"), Sensitivity::Proprietary);
        assert_eq!(label_of(&labels, "amount"), Sensitivity::Proprietary);
        assert_eq!(label_of(&labels, "0.2"), Sensitivity::Proprietary);
        assert_eq!(label_of(&labels, "("), Sensitivity::Public);
    }

    #[test]
    fn test_secret_literal() {
        let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
        let labels = classify_text(
            &classifier,
            "const key = \"sk_live_abcdef123456\";",
            Language::JavaScript,
        );
        assert_eq!(label_of(&labels, "\"sk_live_abcdef123456\""), Sensitivity::Secret);
        assert_eq!(label_of(&labels, "key"), Sensitivity::Proprietary);
    }

    #[test]
    fn test_email_candidate_is_secret() {
        let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
        let labels = classify_text(&classifier, "owner = alice@example.com", Language::Unknown);
        assert_eq!(label_of(&labels, "alice@example.com"), Sensitivity::Secret);
    }

    #[test]
    fn test_allow_list_and_relaxed_literals() {
        let config = ClassifierConfig {
            allow_list: vec!["Invoice".to_string()],
            relax_common_literals: true,
            ..ClassifierConfig::default()
        };
        let classifier = Classifier::new(&config).unwrap();
        let labels = classify_text(
            &classifier,
            "let x = Invoice::new(0, \"\", 42);",
            Language::Rust,
        );
        assert_eq!(label_of(&labels, "Invoice"), Sensitivity::Public);
        assert_eq!(label_of(&labels, "0"), Sensitivity::Public);
        assert_eq!(label_of(&labels, "\"\""), Sensitivity::Public);
        assert_eq!(label_of(&labels, "42"), Sensitivity::Proprietary);
    }

    #[test]
    fn test_comments() {
        let classifier = Classifier::new(&ClassifierConfig {
            comment_terms: vec!["Merger".to_string()],
            ..ClassifierConfig::default()
        })
        .unwrap();
        let labels = classify_text(
            &classifier,
            "// plain note\n// merger plan\n// mail bob@corp.io\n",
            Language::Rust,
        );
        assert_eq!(label_of(&labels, "// plain note"), Sensitivity::Public);
        assert_eq!(label_of(&labels, "// merger plan"), Sensitivity::Proprietary);
        assert_eq!(label_of(&labels, "// mail bob@corp.io"), Sensitivity::Secret);

        let strict = Classifier::new(&ClassifierConfig {
            redact_comments: true,
            ..ClassifierConfig::default()
        })
        .unwrap();
        let labels = classify_text(&strict, "# note", Language::Python);
        assert_eq!(label_of(&labels, "# note"), Sensitivity::Proprietary);
    }

    #[test]
    fn test_min_identifier_length() {
        let classifier = Classifier::new(&ClassifierConfig {
            min_identifier_length: 3,
            ..ClassifierConfig::default()
        })
        .unwrap();
        let labels = classify_text(&classifier, "ab = total", Language::Python);
        assert_eq!(label_of(&labels, "ab"), Sensitivity::Public);
        assert_eq!(label_of(&labels, "total"), Sensitivity::Proprietary);
    }

    #[test]
    fn test_delimiter_in_public_span_is_redacted() {
        let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
        let labels = classify_text(&classifier, "// see ⟪VAR_1⟧\n", Language::Rust);
        assert_eq!(label_of(&labels, "// see ⟪VAR_1⟧"), Sensitivity::Proprietary);
    }

    #[test]
    fn test_string_body() {
        assert_eq!(string_body("\"abc\""), "abc");
        assert_eq!(string_body("b'xyz'"), "xyz");
        assert_eq!(string_body("\"\"\"doc\"\"\""), "doc");
        assert_eq!(string_body("r#\"raw\"#"), "raw");
    }
}
