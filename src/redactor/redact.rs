//! Single forward pass replacing sensitive spans with placeholders.

use super::mapping::{MappingStore, ScopeId};
use super::scope::{BlockStyle, ScopeTracker};
use crate::error::Result;
use crate::models::{
    AbstractedDocument, Language, Placeholder, PlaceholderKind, ScopeStyle, Sensitivity, SessionId,
    Span, SpanKind,
};
use tracing::debug;

/// Redacts the files of one session into a shared [`MappingStore`].
///
/// Each file gets its own root scope; placeholder counters are shared, so a
/// placeholder is unique across every file of the session.
#[derive(Debug)]
pub struct Redactor {
    store: MappingStore,
}

impl Redactor {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            store: MappingStore::new(session_id),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.store.session_id()
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    /// Hand the populated store to the restoration side.
    pub fn finish(self) -> MappingStore {
        self.store
    }

    /// Redact one file.
    ///
    /// `labels[i]` classifies `spans[i]`; a missing label is treated as
    /// PROPRIETARY so nothing unclassified leaves the process.
    pub fn redact_file(
        &mut self,
        path: &str,
        spans: &[Span],
        labels: &[Sensitivity],
        language: Language,
    ) -> Result<AbstractedDocument> {
        let style = match language {
            Language::Unknown => BlockStyle::detect(spans),
            lang => match lang.scope_style() {
                ScopeStyle::Braces => BlockStyle::Braces,
                ScopeStyle::Indentation => BlockStyle::Indentation,
            },
        };

        let root = self.store.scopes_mut().new_root();
        let mut tracker = ScopeTracker::new(spans, style, root);
        let mut doc = AbstractedDocument::new(self.store.session_id(), path);
        let before = self.store.len();
        let mut substitutions = 0usize;

        for (i, span) in spans.iter().enumerate() {
            tracker.advance(i, self.store.scopes_mut());

            let label = labels.get(i).copied().unwrap_or(Sensitivity::Proprietary);
            if !label.requires_redaction() {
                doc.push_text(&span.text);
                continue;
            }

            let placeholder = self.placeholder_for(i, span, label, &tracker)?;
            doc.push_placeholder(placeholder);
            substitutions += 1;
        }

        debug!(
            "Redacted {}: {} substitutions, {} new placeholders",
            path,
            substitutions,
            self.store.len() - before
        );
        Ok(doc)
    }

    fn placeholder_for(
        &mut self,
        i: usize,
        span: &Span,
        label: Sensitivity,
        tracker: &ScopeTracker<'_>,
    ) -> Result<Placeholder> {
        let named = matches!(span.kind, SpanKind::Identifier | SpanKind::SecretCandidate);

        // A binding only reuses a placeholder from its own scope, so it
        // shadows any outer binding of the same name. Other occurrences
        // resolve outward and are otherwise treated as free names of the file.
        let binding = if named { tracker.binding_scope(i) } else { None };
        let (existing, target): (Option<Placeholder>, ScopeId) = match binding {
            Some(scope) => (self.store.lookup_in(&span.text, scope), scope),
            None => (
                self.store.resolve(&span.text, tracker.current()),
                tracker.root(),
            ),
        };
        if let Some(placeholder) = existing {
            return Ok(placeholder);
        }

        let kind = placeholder_kind(span, label, named && tracker.is_function_name(i));
        self.store.allocate(kind, &span.text, target, label)
    }
}

fn placeholder_kind(span: &Span, label: Sensitivity, is_function: bool) -> PlaceholderKind {
    if label == Sensitivity::Secret {
        return PlaceholderKind::Secret;
    }
    match span.kind {
        SpanKind::Identifier | SpanKind::SecretCandidate if is_function => PlaceholderKind::Func,
        SpanKind::Identifier | SpanKind::SecretCandidate => PlaceholderKind::Var,
        SpanKind::NumberLiteral => PlaceholderKind::Num,
        SpanKind::StringLiteral | SpanKind::Comment | SpanKind::Structural => PlaceholderKind::Str,
    }
}

/// Redact a single anonymous file in a fresh session.
pub fn redact(
    spans: &[Span],
    labels: &[Sensitivity],
) -> Result<(AbstractedDocument, MappingStore)> {
    let mut redactor = Redactor::new(SessionId::new());
    let doc = redactor.redact_file("", spans, labels, Language::Unknown)?;
    Ok((doc, redactor.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, ClassifyContext};
    use crate::config::ClassifierConfig;
    use crate::models::DocToken;
    use crate::scanner::scan_with;

    fn redact_text(text: &str, language: Language) -> (AbstractedDocument, MappingStore) {
        let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
        let spans = scan_with(text, language);
        let labels = classifier.classify_all(&spans, &ClassifyContext::new(language));
        let mut redactor = Redactor::new(SessionId::new());
        let doc = redactor
            .redact_file("test", &spans, &labels, language)
            .unwrap();
        (doc, redactor.finish())
    }

    fn placeholders_for(doc: &AbstractedDocument, store: &MappingStore, original: &str) -> Vec<Placeholder> {
        doc.placeholders()
            .filter(|p| store.original(p) == Some(original))
            .copied()
            .collect()
    }

    #[test]
    fn test_python_function() {
        let (doc, store) = redact_text(
            "def compute_tax(amount):\n    return amount * 0.2\n",
            Language::Python,
        );
        assert_eq!(
            doc.render(),
            "def ⟪FUNC_1⟧(⟪VAR_1⟧):\n    return ⟪VAR_1⟧ * ⟪NUM_1⟧\n"
        );
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_sibling_scopes_do_not_share_bindings() {
        let (doc, store) = redact_text(
            "function f(x){ let y=1 } function g(x){ let y=2 }",
            Language::JavaScript,
        );
        let xs = placeholders_for(&doc, &store, "x");
        let ys = placeholders_for(&doc, &store, "y");
        assert_eq!(xs.len(), 2);
        assert_ne!(xs[0], xs[1]);
        assert_eq!(ys.len(), 2);
        assert_ne!(ys[0], ys[1]);
    }

    #[test]
    fn test_python_sibling_functions_do_not_share_locals() {
        let (doc, store) = redact_text(
            "def f(x):\n    y = 1\n\ndef g(x):\n    y = 2\n",
            Language::Python,
        );
        let xs = placeholders_for(&doc, &store, "x");
        let ys = placeholders_for(&doc, &store, "y");
        assert_eq!(xs.len(), 2);
        assert_ne!(xs[0], xs[1]);
        assert_eq!(ys.len(), 2);
        assert_ne!(ys[0], ys[1]);
    }

    #[test]
    fn test_python_local_visible_after_nested_block() {
        let (doc, store) = redact_text(
            "def f(x):\n    if x:\n        y = 1\n    return y\n",
            Language::Python,
        );
        let ys = placeholders_for(&doc, &store, "y");
        assert_eq!(ys.len(), 2);
        assert_eq!(ys[0], ys[1]);
    }

    #[test]
    fn test_repeated_identifier_single_allocation() {
        let (doc, store) = redact_text(
            "total = 1\ntotal = total + total\nprint(total, total)\n",
            Language::Python,
        );
        let totals = placeholders_for(&doc, &store, "total");
        assert_eq!(totals.len(), 5);
        assert!(totals.iter().all(|p| *p == totals[0]));
        assert_eq!(store.count_by_kind(PlaceholderKind::Var), 1);
    }

    #[test]
    fn test_inner_binding_shadows_outer() {
        let (doc, store) = redact_text(
            "let rate = 1;\n{ let rate = 2; use_it(rate); }\nuse_it(rate);",
            Language::JavaScript,
        );
        let rates = placeholders_for(&doc, &store, "rate");
        assert_eq!(rates.len(), 4);
        assert_eq!(rates[1], rates[2]);
        assert_eq!(rates[0], rates[3]);
        assert_ne!(rates[0], rates[1]);
    }

    #[test]
    fn test_enclosing_scope_reuse() {
        let (doc, store) = redact_text(
            "fn run(limit: u32) {\n    if limit > 3 { stop(limit); }\n}",
            Language::Rust,
        );
        let limits = placeholders_for(&doc, &store, "limit");
        assert_eq!(limits.len(), 3);
        assert!(limits.iter().all(|p| *p == limits[0]));
    }

    #[test]
    fn test_secret_never_in_output() {
        let (doc, store) = redact_text(
            "const key = \"sk_live_abcdef123456\";\n",
            Language::JavaScript,
        );
        let rendered = doc.render();
        assert!(!rendered.contains("sk_live"));
        assert!(!rendered.contains("abcdef123456"));
        assert!(rendered.contains("⟪SECRET_1⟧"));

        let secret = Placeholder::new(PlaceholderKind::Secret, 1);
        assert_eq!(store.get(&secret).unwrap().sensitivity, Sensitivity::Secret);
    }

    #[test]
    fn test_placeholders_unique_across_files() {
        let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
        let mut redactor = Redactor::new(SessionId::new());
        let mut docs = Vec::new();
        for (path, text) in [("a.py", "alpha = 1\n"), ("b.py", "alpha = 1\n")] {
            let spans = scan_with(text, Language::Python);
            let labels = classifier.classify_all(&spans, &ClassifyContext::new(Language::Python));
            docs.push(
                redactor
                    .redact_file(path, &spans, &labels, Language::Python)
                    .unwrap(),
            );
        }
        assert_eq!(docs[0].render(), "⟪VAR_1⟧ = ⟪NUM_1⟧\n");
        assert_eq!(docs[1].render(), "⟪VAR_2⟧ = ⟪NUM_2⟧\n");
    }

    #[test]
    fn test_missing_labels_fail_closed() {
        let spans = scan_with("a b", Language::Unknown);
        let (doc, store) = redact(&spans, &[Sensitivity::Public]).unwrap();
        assert_eq!(doc.tokens[0], DocToken::Text("a".to_string()));
        assert_eq!(store.len(), 2);
    }
}
