//! Fail-closed check on responses crossing back into the trusted boundary.
//!
//! A response may only contain secret-shaped text that was already present
//! in the request. Anything else means the remote side produced or obtained
//! credential material it was never given, and the whole response is
//! rejected before restoration begins.

use super::client::{AnalysisRequest, AnalysisResponse};
use crate::classifier::SecretMatcher;
use crate::error::{AbstractionError, Result};
use tracing::error;

/// Originals shorter than this are not searched for verbatim.
const MIN_KNOWN_SECRET_LEN: usize = 8;

/// Validates remote responses against the request that produced them.
pub struct BoundaryGuard<'a> {
    matcher: &'a SecretMatcher,
    known_secrets: Vec<&'a str>,
}

impl<'a> BoundaryGuard<'a> {
    pub fn new(matcher: &'a SecretMatcher) -> Self {
        Self {
            matcher,
            known_secrets: Vec::new(),
        }
    }

    /// Also reject responses echoing any of these original secret texts.
    pub fn with_known_secrets(mut self, secrets: impl IntoIterator<Item = &'a str>) -> Self {
        self.known_secrets.extend(
            secrets
                .into_iter()
                .map(|s| s.trim_matches(|c| matches!(c, '"' | '\'' | '`')))
                .filter(|s| s.len() >= MIN_KNOWN_SECRET_LEN),
        );
        self
    }

    /// Reject `response` if it carries secret-shaped text absent from `request`.
    pub fn check(&self, request: &AnalysisRequest, response: &AnalysisResponse) -> Result<()> {
        for text in response.texts() {
            for (pattern, found) in self.matcher.matches(text) {
                if !request.texts().any(|sent| sent.contains(found)) {
                    error!(
                        "Response for session {} contains unsent {} material",
                        request.session_id, pattern.name
                    );
                    return Err(AbstractionError::BoundaryViolation(pattern.name.clone()));
                }
            }

            if self.known_secrets.iter().any(|s| text.contains(s)) {
                error!(
                    "Response for session {} echoes a redacted secret",
                    request.session_id
                );
                return Err(AbstractionError::BoundaryViolation(
                    "a redacted secret".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::models::{AbstractedDocument, RemoteFinding, Severity, SessionId};

    fn request(text: &str) -> AnalysisRequest {
        let session = SessionId::new();
        let mut doc = AbstractedDocument::new(session, "a.js");
        doc.push_text(text);
        AnalysisRequest::new(session, &ProviderConfig::default(), &[doc], None)
    }

    fn response(text: &str) -> AnalysisResponse {
        AnalysisResponse {
            analysis: Some("Looks fine.".to_string()),
            files: [("a.js".to_string(), text.to_string())].into_iter().collect(),
            findings: Vec::new(),
        }
    }

    #[test]
    fn test_clean_response_passes() {
        let matcher = SecretMatcher::new(&[], true).unwrap();
        let guard = BoundaryGuard::new(&matcher);
        let req = request("const ⟪VAR_1⟧ = ⟪SECRET_1⟧;");
        let resp = response("const ⟪VAR_1⟧ = ⟪SECRET_1⟧; // checked");
        assert!(guard.check(&req, &resp).is_ok());
    }

    #[test]
    fn test_invented_secret_rejected() {
        let matcher = SecretMatcher::new(&[], true).unwrap();
        let guard = BoundaryGuard::new(&matcher);
        let req = request("const ⟪VAR_1⟧ = ⟪SECRET_1⟧;");
        let resp = response("const ⟪VAR_1⟧ = \"sk_live_zzzzyyyy1234\";");
        let err = guard.check(&req, &resp).unwrap_err();
        assert!(matches!(err, AbstractionError::BoundaryViolation(_)));
    }

    #[test]
    fn test_secret_in_finding_message_rejected() {
        let matcher = SecretMatcher::new(&[], true).unwrap();
        let guard = BoundaryGuard::new(&matcher);
        let req = request("x");
        let mut resp = response("x");
        resp.findings.push(RemoteFinding {
            path: "a.js".to_string(),
            anchor: None,
            offset: 0,
            message: "email ops@internal.example.org about this".to_string(),
            severity: Severity::Info,
            rule_id: None,
        });
        assert!(guard.check(&req, &resp).is_err());
    }

    #[test]
    fn test_public_text_already_sent_passes() {
        let matcher = SecretMatcher::new(&[], true).unwrap();
        let guard = BoundaryGuard::new(&matcher);
        let req = request("// docs: help@example.com");
        let resp = response("// docs: help@example.com\n");
        assert!(guard.check(&req, &resp).is_ok());
    }

    #[test]
    fn test_known_secret_echo_rejected() {
        let matcher = SecretMatcher::new(&[], true).unwrap();
        let guard = BoundaryGuard::new(&matcher).with_known_secrets(["\"hunter2hunter2\""]);
        let req = request("⟪SECRET_1⟧");
        let resp = response("password is hunter2hunter2");
        assert!(guard.check(&req, &resp).is_err());
    }
}
